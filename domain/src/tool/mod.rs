//! Tool domain module
//!
//! Defines how roles interact with external capabilities (calculators,
//! market lookups, document retrieval) in a validated manner.
//!
//! # Overview
//!
//! Every tool is described by a [`ToolDefinition`] (name, description,
//! typed parameters), requested by the model as a [`ToolCall`], checked by
//! a [`ToolValidator`] into [`ValidatedArgs`], executed by a
//! [`ToolHandler`], and reported as a [`ToolResult`].
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌───────────────┐    ┌──────────────┐
//! │ ToolSpec     │───▶│ ToolCall     │───▶│ ValidatedArgs │───▶│ ToolResult   │
//! │ (schemas)    │    │ (raw JSON)   │    │ (typed)       │    │ (output)     │
//! └──────────────┘    └──────────────┘    └───────────────┘    └──────────────┘
//! ```
//!
//! # Architecture
//!
//! - **Domain** (this module): definitions, validation, the handler trait
//! - **Application** (`ToolExecutorPort`): port used by the role executor
//! - **Infrastructure** (`ToolRegistry`): name → handler map and built-in tools

pub mod args;
pub mod entities;
pub mod provider;
pub mod traits;
pub mod value_objects;

pub use args::{ArgValue, ValidatedArgs};
pub use entities::{ParamType, ToolCall, ToolDefinition, ToolParameter, ToolSpec};
pub use provider::ToolHandler;
pub use traits::{DefaultToolValidator, ToolValidator, ValidationError};
pub use value_objects::{ToolError, ToolResult};
