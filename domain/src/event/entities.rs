//! Turn event records.
//!
//! Every event serializes to a flat JSON object with a `type`
//! discriminator, a `timestamp` and the kind-specific fields:
//!
//! ```json
//! {"type":"role_start","timestamp":"2025-01-01T00:00:00Z","role":"financial_advisor","name":"Financial Advisor","icon":"💰","is_summary":false}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::ErrorCode;

/// Narration category of a `thinking_step` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Planning,
    RoleDispatch,
    RoleComplete,
    Thinking,
    DiscussionRound,
    Synthesizing,
}

/// Kind-specific payload of a turn event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    ConversationCreated {
        conversation_id: String,
        title: String,
    },
    ThinkingStart,
    ThinkingStep {
        step_type: StepKind,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role: Option<String>,
    },
    ToolCall {
        role: String,
        tool_name: String,
        tool_args: Value,
    },
    ToolResult {
        role: String,
        tool_name: String,
        success: bool,
        content: String,
    },
    RoleStart {
        role: String,
        name: String,
        icon: String,
        is_summary: bool,
    },
    ContentDelta {
        role: String,
        delta: String,
    },
    RoleResult {
        role: String,
        name: String,
        content: String,
        is_summary: bool,
    },
    Discussion {
        from: String,
        name: String,
        round: u32,
        content: String,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
    Done,
}

impl EventKind {
    /// Wire name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::ConversationCreated { .. } => "conversation_created",
            EventKind::ThinkingStart => "thinking_start",
            EventKind::ThinkingStep { .. } => "thinking_step",
            EventKind::ToolCall { .. } => "tool_call",
            EventKind::ToolResult { .. } => "tool_result",
            EventKind::RoleStart { .. } => "role_start",
            EventKind::ContentDelta { .. } => "content_delta",
            EventKind::RoleResult { .. } => "role_result",
            EventKind::Discussion { .. } => "discussion",
            EventKind::Error { .. } => "error",
            EventKind::Done => "done",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, EventKind::Done)
    }
}

/// A timestamped event produced during one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl TurnEvent {
    pub fn now(kind: EventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_serializes_flat_with_type() {
        let event = TurnEvent::now(EventKind::RoleStart {
            role: "financial_advisor".to_string(),
            name: "Financial Advisor".to_string(),
            icon: "💰".to_string(),
            is_summary: false,
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "role_start");
        assert_eq!(value["role"], "financial_advisor");
        assert_eq!(value["is_summary"], false);
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_error_event_carries_numeric_code() {
        let event = TurnEvent::now(EventKind::Error {
            code: ErrorCode::TransportTimeout,
            message: ErrorCode::TransportTimeout.user_message().to_string(),
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["code"], 1001);
        assert_eq!(event.name(), "error");
    }

    #[test]
    fn test_event_deserializes() {
        let raw = json!({
            "type": "thinking_step",
            "timestamp": "2025-03-01T08:00:00Z",
            "step_type": "role_dispatch",
            "content": "Consulting Policy Expert",
            "role": "policy_expert"
        });
        let event: TurnEvent = serde_json::from_value(raw).unwrap();
        assert!(matches!(
            event.kind,
            EventKind::ThinkingStep { step_type: StepKind::RoleDispatch, .. }
        ));

        let done: TurnEvent =
            serde_json::from_value(json!({"type": "done", "timestamp": "2025-03-01T08:00:01Z"}))
                .unwrap();
        assert!(done.kind.is_done());
    }
}
