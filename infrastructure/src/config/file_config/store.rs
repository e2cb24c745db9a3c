//! Persistence and turn-log configuration (`[store]` and `[logging]` sections)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which conversation store backs the orchestrator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Process-local; history is lost on exit.
    #[default]
    Memory,
    /// One JSON-lines file per conversation.
    Jsonl,
}

/// # Example
///
/// ```toml
/// [store]
/// kind = "jsonl"
/// path = "~/.local/share/roundtable/conversations"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStoreConfig {
    pub kind: StoreKind,
    /// Directory for the JSONL store. Defaults to the user data directory.
    pub path: Option<PathBuf>,
}

impl FileStoreConfig {
    /// Directory used by the JSONL store.
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("roundtable")
                .join("conversations")
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL file receiving structured turn log entries.
    pub conversation_log: Option<PathBuf>,
}
