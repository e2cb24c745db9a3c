//! Turn event output
//!
//! Formatters turn each [`TurnEvent`] into text; [`deliver`] drains a
//! turn's event channel through one of them into a writer, flushing
//! after every event so deltas appear as they are produced.

pub mod console;
pub mod formatter;
pub mod wire;

use crate::cli::commands::OutputFormat;
use console::ConsoleFormatter;
use formatter::EventFormatter;
use roundtable_domain::{ErrorCode, EventKind, TurnEvent};
use std::io::{self, Write};
use tokio::sync::mpsc;
use wire::{JsonlFormatter, SseFormatter};

pub fn formatter_for(format: OutputFormat) -> Box<dyn EventFormatter> {
    match format {
        OutputFormat::Console => Box::new(ConsoleFormatter::new()),
        OutputFormat::Jsonl => Box::new(JsonlFormatter),
        OutputFormat::Sse => Box::new(SseFormatter),
    }
}

/// What a drained turn looked like from the outside.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnSummary {
    /// Id announced by `conversation_created`, if any
    pub conversation_id: Option<String>,
    /// Code of the first `error` event
    pub error: Option<ErrorCode>,
    /// False when the stream ended without `done` (cancelled)
    pub completed: bool,
    pub events: usize,
}

/// Write every event from `events` until the channel closes.
pub async fn deliver<W: Write>(
    events: &mut mpsc::Receiver<TurnEvent>,
    formatter: &mut dyn EventFormatter,
    out: &mut W,
) -> io::Result<TurnSummary> {
    let mut summary = TurnSummary::default();

    while let Some(event) = events.recv().await {
        summary.events += 1;
        match &event.kind {
            EventKind::ConversationCreated {
                conversation_id, ..
            } => summary.conversation_id = Some(conversation_id.clone()),
            EventKind::Error { code, .. } if summary.error.is_none() => {
                summary.error = Some(*code)
            }
            EventKind::Done => summary.completed = true,
            _ => {}
        }

        let text = formatter.format(&event);
        if !text.is_empty() {
            out.write_all(text.as_bytes())?;
            out.flush()?;
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send_all(events: Vec<EventKind>) -> mpsc::Receiver<TurnEvent> {
        let (tx, rx) = mpsc::channel(events.len().max(1));
        for kind in events {
            tx.try_send(TurnEvent::now(kind)).unwrap();
        }
        rx
    }

    #[tokio::test]
    async fn test_deliver_jsonl_summarizes_turn() {
        let mut rx = send_all(vec![
            EventKind::ConversationCreated {
                conversation_id: "c-1".to_string(),
                title: "hello".to_string(),
            },
            EventKind::ThinkingStart,
            EventKind::Done,
        ]);
        let mut out = Vec::new();
        let summary = deliver(&mut rx, &mut JsonlFormatter, &mut out).await.unwrap();

        assert_eq!(summary.conversation_id.as_deref(), Some("c-1"));
        assert!(summary.completed);
        assert_eq!(summary.events, 3);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().last().unwrap().contains(r#""type":"done""#));
    }

    #[tokio::test]
    async fn test_deliver_without_done_is_incomplete() {
        let mut rx = send_all(vec![
            EventKind::ThinkingStart,
            EventKind::Error {
                code: ErrorCode::Internal,
                message: "boom".to_string(),
            },
        ]);
        let mut out = Vec::new();
        let mut formatter = formatter_for(OutputFormat::Sse);
        let summary = deliver(&mut rx, formatter.as_mut(), &mut out).await.unwrap();

        assert!(!summary.completed);
        assert_eq!(summary.error, Some(ErrorCode::Internal));
        assert_eq!(String::from_utf8(out).unwrap().matches("event: ").count(), 2);
    }
}
