//! Streaming events for model responses.
//!
//! [`StreamEvent`] bridges transport-level streaming (SSE chunks) to the
//! role executor, which turns text deltas into `content_delta` events.

use super::response::LlmResponse;

/// An event in a streaming model response.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A text chunk from the model.
    Delta(String),
    /// The full structured response (signals stream end).
    Completed(LlmResponse),
    /// An error that occurred during streaming.
    Error(String),
}

impl StreamEvent {
    /// Returns the text chunk if this is a Delta event.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamEvent::Delta(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true if this event signals the end of the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Completed(_) | StreamEvent::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_event_accessors() {
        let delta = StreamEvent::Delta("chunk".to_string());
        assert_eq!(delta.text(), Some("chunk"));
        assert!(!delta.is_terminal());

        let done = StreamEvent::Completed(LlmResponse::from_text("full"));
        assert_eq!(done.text(), None);
        assert!(done.is_terminal());
        assert!(StreamEvent::Error("boom".to_string()).is_terminal());
    }
}
