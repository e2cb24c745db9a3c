//! Parsing and assembly rules for execution plans.

use std::collections::HashSet;

use serde_json::Value;

use super::entities::{ExecutionMode, ExecutionPlan};
use crate::intent::extract_json;
use crate::role::entities::{RoleCatalog, RoleId};

/// Ordering proposed by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedOrder {
    pub roles: Vec<RoleId>,
    pub reason: Option<String>,
}

/// Parse the planner reply.
///
/// Accepts `{"order": [...], "reason": "..."}` or a bare array. Only ids
/// present in `candidates` are kept (first occurrence wins). Candidates
/// the model left out are appended in the order given. Returns `None`
/// when the reply names none of the candidates.
pub fn parse_ordering(response: &str, candidates: &[RoleId]) -> Option<ProposedOrder> {
    let value = extract_json(response)?;
    let (items, reason) = match &value {
        Value::Array(items) => (items.as_slice(), None),
        Value::Object(map) => {
            let items = map.get("order").and_then(Value::as_array)?;
            let reason = map
                .get("reason")
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
            (items.as_slice(), reason)
        }
        _ => return None,
    };

    let mut seen = HashSet::new();
    let mut roles: Vec<RoleId> = items
        .iter()
        .filter_map(Value::as_str)
        .map(|s| RoleId::from(s.trim()))
        .filter(|id| candidates.contains(id) && seen.insert(id.clone()))
        .collect();

    if roles.is_empty() {
        return None;
    }
    for candidate in candidates {
        if seen.insert(candidate.clone()) {
            roles.push(candidate.clone());
        }
    }

    Some(ProposedOrder { roles, reason })
}

/// Turn an ordered list of recognized roles into a plan.
///
/// With two or more roles the catalog's synthesis role is placed last:
/// moved there if it was recognized, appended otherwise, never
/// duplicated. The mode always comes from the caller.
pub fn assemble_plan(
    ordered: Vec<RoleId>,
    catalog: &RoleCatalog,
    mode: ExecutionMode,
    reason: impl Into<String>,
) -> ExecutionPlan {
    if ordered.len() <= 1 {
        let role = ordered
            .into_iter()
            .next()
            .unwrap_or_else(|| catalog.default_role().clone());
        return ExecutionPlan::single(role, mode);
    }

    let synthesis = catalog.synthesis_role().clone();
    let mut roles: Vec<RoleId> = ordered.into_iter().filter(|r| r != &synthesis).collect();
    roles.push(synthesis);

    ExecutionPlan {
        roles,
        mode,
        reason: reason.into(),
        synthesized: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::catalog::{FINANCIAL_ADVISOR, MARKET_ANALYST, POLICY_EXPERT, PURCHASE_CONSULTANT};

    fn ids(raw: &[&str]) -> Vec<RoleId> {
        raw.iter().map(|s| RoleId::from(*s)).collect()
    }

    // ==================== parse_ordering Tests ====================

    #[test]
    fn test_parse_ordering_object() {
        let candidates = ids(&[FINANCIAL_ADVISOR, POLICY_EXPERT]);
        let reply = r#"{"order": ["policy_expert", "financial_advisor"], "reason": "rules first"}"#;
        let order = parse_ordering(reply, &candidates).unwrap();
        assert_eq!(order.roles, ids(&[POLICY_EXPERT, FINANCIAL_ADVISOR]));
        assert_eq!(order.reason.as_deref(), Some("rules first"));
    }

    #[test]
    fn test_parse_ordering_fills_missing_and_drops_invented() {
        let candidates = ids(&[FINANCIAL_ADVISOR, POLICY_EXPERT, MARKET_ANALYST]);
        let reply = r#"["market_analyst", "lawyer", "market_analyst"]"#;
        let order = parse_ordering(reply, &candidates).unwrap();
        assert_eq!(
            order.roles,
            ids(&[MARKET_ANALYST, FINANCIAL_ADVISOR, POLICY_EXPERT])
        );
        assert!(order.reason.is_none());
    }

    #[test]
    fn test_parse_ordering_unusable() {
        let candidates = ids(&[FINANCIAL_ADVISOR, POLICY_EXPERT]);
        assert!(parse_ordering("financial first", &candidates).is_none());
        assert!(parse_ordering(r#"{"order": ["lawyer"]}"#, &candidates).is_none());
        assert!(parse_ordering(r#"{"sequence": []}"#, &candidates).is_none());
    }

    // ==================== assemble_plan Tests ====================

    #[test]
    fn test_assemble_single_role() {
        let catalog = RoleCatalog::home_purchase().unwrap();
        let plan = assemble_plan(ids(&[FINANCIAL_ADVISOR]), &catalog, ExecutionMode::Sequential, "x");
        assert_eq!(plan.roles, ids(&[FINANCIAL_ADVISOR]));
        assert_eq!(plan.reason, "single domain");
        assert!(!plan.synthesized);
    }

    #[test]
    fn test_assemble_appends_synthesis_once() {
        let catalog = RoleCatalog::home_purchase().unwrap();
        let plan = assemble_plan(
            ids(&[FINANCIAL_ADVISOR, POLICY_EXPERT]),
            &catalog,
            ExecutionMode::Sequential,
            "ordered",
        );
        assert_eq!(plan.roles, ids(&[FINANCIAL_ADVISOR, POLICY_EXPERT, PURCHASE_CONSULTANT]));
        assert!(plan.synthesized);

        let plan = assemble_plan(
            ids(&[PURCHASE_CONSULTANT, MARKET_ANALYST]),
            &catalog,
            ExecutionMode::Discussion,
            "ordered",
        );
        assert_eq!(plan.roles, ids(&[MARKET_ANALYST, PURCHASE_CONSULTANT]));
        assert_eq!(plan.mode, ExecutionMode::Discussion);
    }
}
