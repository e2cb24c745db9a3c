//! Domain layer for roundtable
//!
//! This crate contains the core business rules, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Roles and tools
//!
//! - **Role**: a persona with a prompt, trigger keywords and a restricted
//!   tool list, collected in an immutable [`RoleCatalog`]
//! - **Tool**: a schema-described capability; model-supplied arguments
//!   pass through [`ToolValidator`] into [`ValidatedArgs`] before any
//!   [`ToolHandler`] sees them
//!
//! ## Turns
//!
//! - **Execution plan**: ordered roles plus a mode (sequential or discussion)
//! - **Discussion**: rounds of statements ending with exactly one
//!   [`TerminationReason`]
//! - **Event stream**: ordered [`TurnEvent`]s ending with a single `done`

pub mod config;
pub mod conversation;
pub mod core;
pub mod discussion;
pub mod event;
pub mod intent;
pub mod plan;
pub mod prompt;
pub mod role;
pub mod session;
pub mod tool;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigIssueCode, Severity};
pub use conversation::{ConversationContext, ConversationId, HistoryTurn, Speaker};
pub use core::{
    error::{DomainError, ErrorCode},
    string::{conversation_title, truncate},
};
pub use discussion::{
    DiscussionState, Statement, TerminationReason, jaccard_similarity, parse_consensus_answer,
};
pub use event::{EventKind, SequenceViolation, StepKind, TurnEvent, validate_sequence};
pub use intent::{match_keywords, parse_role_selection};
pub use plan::{
    ExecutionMode, ExecutionPlan, ProposedOrder, TurnMode, assemble_plan, parse_ordering,
};
pub use prompt::PromptTemplate;
pub use role::{Role, RoleCatalog, RoleId, RoleOutput};
pub use session::{
    entities::{Message, MessageRole},
    response::{ContentBlock, LlmResponse, StopReason},
    stream::StreamEvent,
};
pub use tool::{
    ArgValue, DefaultToolValidator, ParamType, ToolCall, ToolDefinition, ToolError, ToolHandler,
    ToolParameter, ToolResult, ToolSpec, ToolValidator, ValidatedArgs, ValidationError,
};
