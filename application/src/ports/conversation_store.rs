//! Conversation persistence port.
//!
//! The orchestrator writes through this port fire-and-forget: appends are
//! queued to a background writer and failures are only logged.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roundtable_domain::{ConversationId, HistoryTurn, Speaker};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors reported by a conversation store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Conversation not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A persisted message of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub conversation_id: ConversationId,
    pub speaker: Speaker,
    pub content: String,
    /// Role id, summary flag, termination reason, ...
    #[serde(default)]
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

impl StoredMessage {
    /// True for the message that answered a user turn.
    ///
    /// Intermediate role outputs are stored too, but only final answers
    /// belong in the history a later turn reads.
    pub fn is_final_answer(&self) -> bool {
        self.metadata
            .get("final")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Rebuild turn history from stored messages.
///
/// Keeps user messages that got a final answer, and those answers, in
/// stored order. A user message whose turn was cancelled or failed is
/// dropped once the next user message (or the end of the log) shows it
/// never got one.
pub fn history_from_messages(messages: &[StoredMessage]) -> Vec<HistoryTurn> {
    let mut history = Vec::new();
    let mut pending: Option<&str> = None;

    for m in messages {
        match m.speaker {
            Speaker::User => pending = Some(m.content.as_str()),
            Speaker::Assistant if m.is_final_answer() => {
                if let Some(question) = pending.take() {
                    history.push(HistoryTurn::user(question));
                }
                history.push(HistoryTurn::assistant(m.content.clone()));
            }
            Speaker::Assistant => {}
        }
    }
    history
}

/// Port for conversation persistence
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Allocate a new conversation and return its id.
    async fn create_conversation(
        &self,
        user_id: Option<&str>,
        title: &str,
    ) -> Result<ConversationId, StoreError>;

    /// Append one message to a conversation.
    async fn append_message(
        &self,
        conversation_id: &ConversationId,
        speaker: Speaker,
        content: &str,
        metadata: Value,
    ) -> Result<(), StoreError>;

    /// Load all messages of a conversation in append order.
    async fn load_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<StoredMessage>, StoreError>;

    /// Load the turn history (user messages and final answers).
    async fn load_history(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<HistoryTurn>, StoreError> {
        let messages = self.load_messages(conversation_id).await?;
        Ok(history_from_messages(&messages))
    }
}
