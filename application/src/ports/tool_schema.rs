//! Tool schema conversion port.
//!
//! Separates "which tools a role may use" (domain) from "how to serialize
//! them for the model API" (infrastructure).

use roundtable_domain::{ToolDefinition, ToolSpec};

/// Port for converting tool definitions to the model API format (JSON Schema).
pub trait ToolSchemaPort: Send + Sync {
    /// Convert a single tool definition to a function schema.
    fn tool_to_schema(&self, tool: &ToolDefinition) -> serde_json::Value;

    /// Convert all tools to a JSON Schema array (sorted by name).
    fn all_tools_schema(&self, spec: &ToolSpec) -> Vec<serde_json::Value> {
        spec.all().map(|t| self.tool_to_schema(t)).collect()
    }

    /// Convert the named tools, in the given order, skipping unknown names.
    fn tools_schema(&self, spec: &ToolSpec, names: &[String]) -> Vec<serde_json::Value> {
        spec.subset(names).map(|t| self.tool_to_schema(t)).collect()
    }
}
