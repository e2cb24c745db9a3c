//! Port for structured turn logging.
//!
//! Defines the [`ConversationLogger`] trait for recording what happened in
//! a turn (plan, role completions, discussion outcome) to a structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures a
//! machine-readable record of each turn (JSONL).

use serde_json::Value;

/// A structured log entry for one step of a turn.
///
/// Each entry has a type string and a JSON payload with entry-specific
/// fields. The timestamp is added by the implementation.
pub struct TurnLogEntry {
    /// Entry type (`turn_started`, `plan_created`, `role_completed`,
    /// `discussion_terminated`, `turn_finished`).
    pub entry_type: &'static str,
    /// JSON payload with entry-specific data.
    pub payload: Value,
}

impl TurnLogEntry {
    pub fn new(entry_type: &'static str, payload: Value) -> Self {
        Self {
            entry_type,
            payload,
        }
    }
}

/// Port for logging turn steps to a structured log.
///
/// The `log` method is synchronous and non-fallible so logging can never
/// disturb a running turn; implementations swallow their own failures.
pub trait ConversationLogger: Send + Sync {
    /// Record a log entry.
    fn log(&self, entry: TurnLogEntry);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _entry: TurnLogEntry) {}
}
