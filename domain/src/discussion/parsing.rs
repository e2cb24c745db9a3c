//! Parsing of the consensus check reply.

use crate::intent::extract_json;

/// Interpret the synthesis role's answer to "is there enough information
/// to conclude?".
///
/// Accepts `{"conclude": true|false}` (optionally inside prose or a code
/// fence) or a reply whose first word is YES/NO. Anything else is a "no",
/// so an unclear answer keeps the discussion going until another
/// termination rule fires.
pub fn parse_consensus_answer(response: &str) -> bool {
    if let Some(value) = extract_json(response)
        && let Some(conclude) = value.get("conclude").and_then(|v| v.as_bool())
    {
        return conclude;
    }

    let first_word = response
        .split_whitespace()
        .next()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .unwrap_or_default();

    matches!(first_word.as_str(), "yes" | "y" | "true")
}
