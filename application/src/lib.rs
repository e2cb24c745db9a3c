//! Application layer for roundtable
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::OrchestrationParams;
pub use ports::{
    conversation_logger::{ConversationLogger, NoConversationLogger, TurnLogEntry},
    conversation_store::{ConversationStore, StoreError, StoredMessage},
    llm_gateway::{ChatRequest, GatewayError, LlmGateway, StreamHandle},
    tool_executor::ToolExecutorPort,
    tool_schema::ToolSchemaPort,
};
pub use use_cases::execute_role::{DEGRADED_ANSWER, RoleExecutor};
pub use use_cases::run_turn::{RunTurnError, RunTurnUseCase, TurnHandle, TurnRequest};
