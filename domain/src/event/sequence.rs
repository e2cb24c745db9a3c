//! Ordering rules of a turn's event stream.
//!
//! [`validate_sequence`] checks a complete stream:
//!
//! - exactly one `done`, and it is the last event
//! - an `error` is immediately followed by `done`
//! - at most one `conversation_created`
//! - `content_delta` for a role only between that role's `role_start`
//!   and `role_result`, and role blocks do not nest
//! - each `tool_call` is answered by a `tool_result` for the same tool
//!   before the same role issues another `tool_call`
//!
//! A role block or tool call may be left open only when the turn ended
//! with an `error`.

use std::collections::HashMap;
use thiserror::Error;

use super::entities::{EventKind, TurnEvent};

/// First rule broken by an event stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("event #{index} ({kind}): {reason}")]
pub struct SequenceViolation {
    pub index: usize,
    pub kind: &'static str,
    pub reason: String,
}

fn violation(index: usize, event: &TurnEvent, reason: impl Into<String>) -> SequenceViolation {
    SequenceViolation {
        index,
        kind: event.name(),
        reason: reason.into(),
    }
}

/// Validate a complete event stream for one turn.
pub fn validate_sequence(events: &[TurnEvent]) -> Result<(), SequenceViolation> {
    let Some(last) = events.last() else {
        return Err(SequenceViolation {
            index: 0,
            kind: "none",
            reason: "empty stream".to_string(),
        });
    };

    let mut open_role: Option<&str> = None;
    let mut pending_tools: HashMap<&str, &str> = HashMap::new();
    let mut created = false;
    let mut errored = false;

    for (index, event) in events.iter().enumerate() {
        match &event.kind {
            EventKind::Done => {
                if index != events.len() - 1 {
                    return Err(violation(index, event, "done is not the last event"));
                }
            }
            EventKind::Error { .. } => {
                errored = true;
                let next_is_done = events.get(index + 1).is_some_and(|e| e.kind.is_done());
                if !next_is_done {
                    return Err(violation(index, event, "error not followed by done"));
                }
            }
            EventKind::ConversationCreated { .. } => {
                if created {
                    return Err(violation(index, event, "conversation created twice"));
                }
                created = true;
            }
            EventKind::RoleStart { role, .. } => {
                if let Some(open) = open_role {
                    return Err(violation(
                        index,
                        event,
                        format!("role '{}' started while '{}' is open", role, open),
                    ));
                }
                open_role = Some(role.as_str());
            }
            EventKind::ContentDelta { role, .. } => {
                if open_role != Some(role.as_str()) {
                    return Err(violation(
                        index,
                        event,
                        format!("delta for '{}' outside its role block", role),
                    ));
                }
            }
            EventKind::RoleResult { role, .. } => {
                if open_role != Some(role.as_str()) {
                    return Err(violation(
                        index,
                        event,
                        format!("result for '{}' without matching role_start", role),
                    ));
                }
                open_role = None;
            }
            EventKind::ToolCall {
                role, tool_name, ..
            } => {
                if let Some(previous) = pending_tools.insert(role.as_str(), tool_name.as_str()) {
                    return Err(violation(
                        index,
                        event,
                        format!("'{}' called '{}' before '{}' returned", role, tool_name, previous),
                    ));
                }
            }
            EventKind::ToolResult {
                role, tool_name, ..
            } => match pending_tools.remove(role.as_str()) {
                Some(pending) if pending == tool_name => {}
                Some(pending) => {
                    return Err(violation(
                        index,
                        event,
                        format!("result for '{}' while '{}' is pending", tool_name, pending),
                    ));
                }
                None => {
                    return Err(violation(
                        index,
                        event,
                        format!("result for '{}' without a call", tool_name),
                    ));
                }
            },
            EventKind::ThinkingStart
            | EventKind::ThinkingStep { .. }
            | EventKind::Discussion { .. } => {}
        }
    }

    if !last.kind.is_done() {
        return Err(violation(events.len() - 1, last, "stream does not end with done"));
    }
    if !errored {
        if let Some(role) = open_role {
            return Err(violation(
                events.len() - 1,
                last,
                format!("role '{}' never produced a result", role),
            ));
        }
        if let Some((role, tool)) = pending_tools.iter().next() {
            return Err(violation(
                events.len() - 1,
                last,
                format!("'{}' never received the result of '{}'", role, tool),
            ));
        }
    }

    Ok(())
}

/// Wire names of the events, in order. Handy for assertions.
pub fn kinds(events: &[TurnEvent]) -> Vec<&'static str> {
    events.iter().map(TurnEvent::name).collect()
}

/// Number of events with the given wire name.
pub fn count(events: &[TurnEvent], kind: &str) -> usize {
    events.iter().filter(|e| e.name() == kind).count()
}
