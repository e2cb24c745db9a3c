//! Type definitions for the RunTurn use case.

use crate::ports::llm_gateway::GatewayError;
use roundtable_domain::{ConversationId, DomainError, ErrorCode, TurnEvent, TurnMode};
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Errors that can end a turn
#[derive(Error, Debug)]
pub enum RunTurnError {
    #[error("Conversation {0} is busy")]
    ConversationBusy(ConversationId),

    #[error("Gateway error: {0}")]
    GatewayError(#[from] GatewayError),

    #[error("Domain error: {0}")]
    Domain(DomainError),

    #[error("Operation cancelled")]
    Cancelled,
}

impl From<DomainError> for RunTurnError {
    fn from(err: DomainError) -> Self {
        if err.is_cancelled() {
            RunTurnError::Cancelled
        } else {
            RunTurnError::Domain(err)
        }
    }
}

impl RunTurnError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunTurnError::Cancelled)
    }

    /// Stable code reported on the event stream.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            RunTurnError::ConversationBusy(_) => ErrorCode::ConversationBusy,
            RunTurnError::GatewayError(e) => e.error_code(),
            RunTurnError::Domain(_) | RunTurnError::Cancelled => ErrorCode::Internal,
        }
    }
}

/// Input for the RunTurn use case
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub session_id: String,
    /// The user's message
    pub message: String,
    pub mode: TurnMode,
    /// Existing conversation; a new one is created when absent
    pub conversation_id: Option<ConversationId>,
    pub user_id: Option<String>,
    /// User attributes (budget, income, ...) to accumulate on the context
    pub attributes: BTreeMap<String, String>,
}

impl TurnRequest {
    pub fn new(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            message: message.into(),
            mode: TurnMode::Standard,
            conversation_id: None,
            user_id: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_mode(mut self, mode: TurnMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_conversation(mut self, id: impl Into<ConversationId>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Handle to a running turn.
///
/// Events arrive on `events` in issuance order; the stream ends after
/// `done`, or without `done` when the turn was cancelled. Dropping the
/// handle (or just `events`) cancels the turn.
pub struct TurnHandle {
    pub events: mpsc::Receiver<TurnEvent>,
    cancel: CancellationToken,
}

impl TurnHandle {
    pub(crate) fn new(events: mpsc::Receiver<TurnEvent>, cancel: CancellationToken) -> Self {
        Self { events, cancel }
    }

    /// Receive the next event, or `None` once the stream has ended.
    pub async fn next_event(&mut self) -> Option<TurnEvent> {
        self.events.recv().await
    }

    /// Stop the turn. No further events are delivered.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A token that cancels this turn (e.g. for a Ctrl-C handler).
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drain the stream into a vector.
    pub async fn collect(mut self) -> Vec<TurnEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            events.push(event);
        }
        events
    }
}
