//! Conversation store adapters
//!
//! Both implement the application's `ConversationStore` port:
//! - [`InMemoryConversationStore`]: process-local, the default
//! - [`JsonlConversationStore`]: one JSONL file per conversation

mod jsonl;
mod memory;

pub use jsonl::JsonlConversationStore;
pub use memory::InMemoryConversationStore;

use crate::config::{FileStoreConfig, StoreKind};
use roundtable_application::{ConversationStore, StoreError};
use std::sync::Arc;

/// Build the store selected by `[store]`.
pub async fn open_store(config: &FileStoreConfig) -> Result<Arc<dyn ConversationStore>, StoreError> {
    match config.kind {
        StoreKind::Memory => Ok(Arc::new(InMemoryConversationStore::new())),
        StoreKind::Jsonl => Ok(Arc::new(
            JsonlConversationStore::open(config.resolved_path()).await?,
        )),
    }
}
