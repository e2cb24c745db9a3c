//! Machine-readable formatters: JSON lines and server-sent events

use super::formatter::EventFormatter;
use roundtable_domain::TurnEvent;

/// Serialize an event, degrading to a bare `{"type": ...}` object if
/// serialization ever fails.
fn to_json(event: &TurnEvent) -> String {
    serde_json::to_string(event)
        .unwrap_or_else(|_| format!(r#"{{"type":"{}"}}"#, event.name()))
}

/// One JSON object per line.
#[derive(Debug, Default)]
pub struct JsonlFormatter;

impl EventFormatter for JsonlFormatter {
    fn format(&mut self, event: &TurnEvent) -> String {
        let mut line = to_json(event);
        line.push('\n');
        line
    }
}

/// `event: <type>` / `data: <json>` frames separated by a blank line.
#[derive(Debug, Default)]
pub struct SseFormatter;

impl EventFormatter for SseFormatter {
    fn format(&mut self, event: &TurnEvent) -> String {
        format!("event: {}\ndata: {}\n\n", event.name(), to_json(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundtable_domain::{ErrorCode, EventKind};
    use serde_json::Value;

    #[test]
    fn test_jsonl_line_is_parseable() {
        let event = TurnEvent::now(EventKind::ContentDelta {
            role: "financial_advisor".to_string(),
            delta: "line one\nline two".to_string(),
        });
        let line = JsonlFormatter.format(&event);

        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
        let value: Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["type"], "content_delta");
        assert_eq!(value["delta"], "line one\nline two");
    }

    #[test]
    fn test_sse_frame() {
        let event = TurnEvent::now(EventKind::Error {
            code: ErrorCode::ConversationBusy,
            message: "busy".to_string(),
        });
        let frame = SseFormatter.format(&event);

        assert!(frame.starts_with("event: error\ndata: {"));
        assert!(frame.ends_with("}\n\n"));
        let data = frame
            .lines()
            .find_map(|l| l.strip_prefix("data: "))
            .unwrap();
        let value: Value = serde_json::from_str(data).unwrap();
        assert_eq!(value["message"], "busy");
    }

    #[test]
    fn test_done_frame() {
        let frame = SseFormatter.format(&TurnEvent::now(EventKind::Done));
        assert!(frame.starts_with("event: done\n"));
    }
}
