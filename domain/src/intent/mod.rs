//! Intent recognition rules
//!
//! Pure functions behind the application-level `IntentRecognizer`:
//! keyword routing and parsing of the classifier reply. Both always
//! return ids in catalog-declaration order, so routing is stable when
//! several roles match.

use serde_json::Value;

use crate::role::entities::{RoleCatalog, RoleId};

/// Roles whose trigger keywords occur in the utterance.
///
/// Matching is a case-insensitive substring test. Results follow
/// catalog-declaration order; the number of matching keywords is not
/// used for ranking.
pub fn match_keywords(utterance: &str, catalog: &RoleCatalog) -> Vec<RoleId> {
    let normalized = utterance.trim().to_lowercase();
    if normalized.is_empty() {
        return Vec::new();
    }
    catalog
        .iter()
        .filter(|role| role.matches(&normalized))
        .map(|role| role.id.clone())
        .collect()
}

/// Parse the classifier reply into known role ids.
///
/// Accepts a JSON array of ids or an object with a `roles` array, possibly
/// wrapped in prose or a code fence. Unknown ids are dropped. Returns an
/// empty list when nothing usable is found; the caller falls back to the
/// default role.
pub fn parse_role_selection(response: &str, catalog: &RoleCatalog) -> Vec<RoleId> {
    let Some(value) = extract_json(response) else {
        return Vec::new();
    };

    let ids = match &value {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("roles") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    let selected: Vec<RoleId> = ids
        .iter()
        .filter_map(|v| v.as_str())
        .map(|s| RoleId::from(s.trim()))
        .collect();
    catalog.in_declaration_order(&selected)
}

/// Extract the first JSON object or array embedded in a model reply.
///
/// Tries the outermost `{…}` first, then the outermost `[…]`.
pub fn extract_json(response: &str) -> Option<Value> {
    for (open, close) in [('{', '}'), ('[', ']')] {
        if let Some(start) = response.find(open)
            && let Some(end) = response.rfind(close)
            && end > start
            && let Ok(parsed) = serde_json::from_str::<Value>(&response[start..=end])
        {
            return Some(parsed);
        }
    }
    None
}
