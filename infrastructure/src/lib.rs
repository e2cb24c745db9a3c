//! Infrastructure layer for roundtable
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.
//!
//! | port | adapter |
//! |------|---------|
//! | `LlmGateway` | [`OpenAiGateway`] |
//! | `ToolExecutorPort` | [`ToolRegistry`] |
//! | `ToolSchemaPort` | [`JsonSchemaToolConverter`] |
//! | `ConversationStore` | [`InMemoryConversationStore`], [`JsonlConversationStore`] |
//! | `ConversationLogger` | [`JsonlConversationLogger`] |

pub mod config;
pub mod logging;
pub mod openai;
pub mod store;
pub mod tools;

// Re-export commonly used types
pub use config::{ConfigError, ConfigLoader, FileConfig, FileLlmConfig, StoreKind};
pub use logging::JsonlConversationLogger;
pub use openai::OpenAiGateway;
pub use store::{InMemoryConversationStore, JsonlConversationStore, open_store};
pub use tools::{
    JsonSchemaToolConverter, RegistryStats, ToolRegistry, advisory_registry, configured_registry,
};
