//! Tool implementations for the role executor
//!
//! - [`registry`]: name → handler map implementing `ToolExecutorPort`
//! - [`schema`]: function-format JSON Schema for the model API
//! - [`builtin`]: financial calculators, document and news retrieval, the
//!   market snapshot and the purchase report

pub mod builtin;

mod registry;
mod schema;

pub use builtin::{advisory_registry, configured_registry};
pub use registry::{RegistryStats, ToolRegistry};
pub use schema::JsonSchemaToolConverter;
