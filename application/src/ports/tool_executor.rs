//! Tool Executor port
//!
//! Defines the interface for running tools. Arguments reach this port only
//! after validation, as [`ValidatedArgs`].

use async_trait::async_trait;
use roundtable_domain::{ToolDefinition, ToolError, ToolSpec, ValidatedArgs};
use serde_json::Value;

/// Port for tool execution
///
/// This port defines how the application layer executes tools.
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait ToolExecutorPort: Send + Sync {
    /// Get the specification of all available tools
    fn tool_spec(&self) -> &ToolSpec;

    /// Check if a tool is available
    fn has_tool(&self, name: &str) -> bool {
        self.tool_spec().contains(name)
    }

    /// Get the definition of a specific tool
    fn get_tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.tool_spec().get(name)
    }

    /// Get names of all available tools
    fn available_tools(&self) -> Vec<&str> {
        self.tool_spec().names().collect()
    }

    /// Execute a tool with arguments already checked against its definition.
    async fn execute(&self, name: &str, args: ValidatedArgs) -> Result<Value, ToolError>;
}
