//! Fire-and-forget persistence.
//!
//! Appends are queued to a single background task so they reach the store
//! in the order they were issued, without the turn ever waiting on the
//! store. Failures are logged and dropped.

use crate::ports::conversation_store::ConversationStore;
use roundtable_domain::{ConversationId, Speaker};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

enum WriterCommand {
    Append {
        conversation_id: ConversationId,
        speaker: Speaker,
        content: String,
        metadata: Value,
    },
    Flush(oneshot::Sender<()>),
}

#[derive(Clone)]
pub(crate) struct PersistenceWriter {
    tx: mpsc::UnboundedSender<WriterCommand>,
}

impl PersistenceWriter {
    /// Spawn the writer task. Must be called inside a Tokio runtime.
    pub(crate) fn spawn(store: Arc<dyn ConversationStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    WriterCommand::Append {
                        conversation_id,
                        speaker,
                        content,
                        metadata,
                    } => {
                        if let Err(e) = store
                            .append_message(&conversation_id, speaker, &content, metadata)
                            .await
                        {
                            warn!(
                                conversation = %conversation_id,
                                error = %e,
                                "Failed to persist message"
                            );
                        }
                    }
                    WriterCommand::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
        });
        Self { tx }
    }

    pub(crate) fn append(
        &self,
        conversation_id: &ConversationId,
        speaker: Speaker,
        content: impl Into<String>,
        metadata: Value,
    ) {
        let command = WriterCommand::Append {
            conversation_id: conversation_id.clone(),
            speaker,
            content: content.into(),
            metadata,
        };
        if self.tx.send(command).is_err() {
            warn!(conversation = %conversation_id, "Persistence writer stopped, message dropped");
        }
    }

    /// Wait until everything queued so far has been written.
    pub(crate) async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(WriterCommand::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }
}
