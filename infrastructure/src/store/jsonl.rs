//! File-backed conversation store.
//!
//! One JSONL file per conversation under a base directory. The first line
//! is a header record; every following line is a [`StoredMessage`]:
//!
//! ```text
//! {"kind":"conversation","id":"…","user_id":null,"title":"…","created_at":"…"}
//! {"kind":"message","conversation_id":"…","speaker":"user","content":"…",…}
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roundtable_application::{ConversationStore, StoreError, StoredMessage};
use roundtable_domain::{ConversationId, Speaker};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Record {
    Conversation {
        id: ConversationId,
        user_id: Option<String>,
        title: String,
        created_at: DateTime<Utc>,
    },
    Message(StoredMessage),
}

pub struct JsonlConversationStore {
    dir: PathBuf,
    /// Serializes appends so lines never interleave.
    write_lock: Mutex<()>,
}

impl JsonlConversationStore {
    /// Store rooted at `dir`, created if missing.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        debug!(dir = %dir.display(), "Opened conversation store");
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File for `id`. Ids become file names, so only `[A-Za-z0-9_-]` is accepted.
    fn file_for(&self, id: &ConversationId) -> Result<PathBuf, StoreError> {
        let raw = id.as_str();
        let valid = !raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid conversation id '{}'", raw),
            )));
        }
        Ok(self.dir.join(format!("{}.jsonl", raw)))
    }

    async fn append_record(&self, path: &Path, record: &Record) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for JsonlConversationStore {
    async fn create_conversation(
        &self,
        user_id: Option<&str>,
        title: &str,
    ) -> Result<ConversationId, StoreError> {
        let id = ConversationId::generate();
        let path = self.file_for(&id)?;
        self.append_record(
            &path,
            &Record::Conversation {
                id: id.clone(),
                user_id: user_id.map(str::to_string),
                title: title.to_string(),
                created_at: Utc::now(),
            },
        )
        .await?;
        Ok(id)
    }

    async fn append_message(
        &self,
        conversation_id: &ConversationId,
        speaker: Speaker,
        content: &str,
        metadata: Value,
    ) -> Result<(), StoreError> {
        let path = self.file_for(conversation_id)?;
        let message = StoredMessage {
            conversation_id: conversation_id.clone(),
            speaker,
            content: content.to_string(),
            metadata,
            created_at: Utc::now(),
        };
        self.append_record(&path, &Record::Message(message)).await
    }

    /// Unreadable lines are skipped with a warning; a partially written
    /// last line should not hide the rest of the conversation.
    async fn load_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        let path = self.file_for(conversation_id)?;
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(conversation_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut messages = Vec::new();
        for (n, line) in raw.lines().enumerate().filter(|(_, l)| !l.trim().is_empty()) {
            match serde_json::from_str::<Record>(line) {
                Ok(Record::Message(message)) => messages.push(message),
                Ok(Record::Conversation { .. }) => {}
                Err(e) => warn!(
                    file = %path.display(),
                    line = n + 1,
                    error = %e,
                    "Skipping unreadable conversation record"
                ),
            }
        }
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundtable_domain::HistoryTurn;
    use serde_json::json;

    #[tokio::test]
    async fn test_round_trip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlConversationStore::open(dir.path().join("conversations"))
            .await
            .unwrap();

        let id = store.create_conversation(None, "Tax on a resale").await.unwrap();
        store
            .append_message(&id, Speaker::User, "What tax do I pay?", Value::Null)
            .await
            .unwrap();
        store
            .append_message(&id, Speaker::Assistant, "Deed tax 1%.", json!({"role": "policy_expert"}))
            .await
            .unwrap();
        store
            .append_message(&id, Speaker::Assistant, "About 51,700.", json!({"final": true}))
            .await
            .unwrap();

        // A second store over the same directory sees the same data
        let reopened = JsonlConversationStore::open(store.dir()).await.unwrap();
        let messages = reopened.load_messages(&id).await.unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].metadata["role"], "policy_expert");

        let history = reopened.load_history(&id).await.unwrap();
        assert_eq!(
            history,
            vec![
                HistoryTurn::user("What tax do I pay?"),
                HistoryTurn::assistant("About 51,700.")
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_conversation_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlConversationStore::open(dir.path()).await.unwrap();
        let err = store
            .load_messages(&ConversationId::new("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_path_like_ids_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlConversationStore::open(dir.path()).await.unwrap();
        let result = store
            .append_message(&ConversationId::new("../escape"), Speaker::User, "x", Value::Null)
            .await;
        assert!(matches!(result, Err(StoreError::Io(_))));
    }

    #[tokio::test]
    async fn test_corrupt_line_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlConversationStore::open(dir.path()).await.unwrap();
        let id = ConversationId::new("c-1");
        store
            .append_message(&id, Speaker::User, "first", Value::Null)
            .await
            .unwrap();
        std::fs::OpenOptions::new()
            .append(true)
            .open(dir.path().join("c-1.jsonl"))
            .and_then(|mut f| std::io::Write::write_all(&mut f, b"{\"kind\":\"mess\n"))
            .unwrap();

        let messages = store.load_messages(&id).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "first");
    }
}
