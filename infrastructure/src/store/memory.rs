//! Process-local conversation store.

use async_trait::async_trait;
use chrono::Utc;
use roundtable_application::{ConversationStore, StoreError, StoredMessage};
use roundtable_domain::{ConversationId, Speaker};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Conversations kept in memory for the lifetime of the process.
///
/// Only messages are kept; owner and title are not. Appending to an id
/// that was never created starts that conversation, so client-chosen ids
/// work without a prior `create_conversation`.
#[derive(Default)]
pub struct InMemoryConversationStore {
    conversations: RwLock<HashMap<ConversationId, Vec<StoredMessage>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create_conversation(
        &self,
        _user_id: Option<&str>,
        _title: &str,
    ) -> Result<ConversationId, StoreError> {
        let id = ConversationId::generate();
        self.conversations
            .write()
            .await
            .insert(id.clone(), Vec::new());
        Ok(id)
    }

    async fn append_message(
        &self,
        conversation_id: &ConversationId,
        speaker: Speaker,
        content: &str,
        metadata: Value,
    ) -> Result<(), StoreError> {
        let message = StoredMessage {
            conversation_id: conversation_id.clone(),
            speaker,
            content: content.to_string(),
            metadata,
            created_at: Utc::now(),
        };
        self.conversations
            .write()
            .await
            .entry(conversation_id.clone())
            .or_default()
            .push(message);
        Ok(())
    }

    async fn load_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        self.conversations
            .read()
            .await
            .get(conversation_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(conversation_id.to_string()))
    }
}
