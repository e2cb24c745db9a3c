//! Tool domain value objects: immutable result and error types
//!
//! These types form the **output side** of a tool call. Every call that
//! reaches the role executor produces a [`ToolResult`], which is both fed
//! back to the model and reported on the event stream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::traits::ValidationError;

/// Error that occurred during tool execution.
///
/// | Code | Description |
/// |------|-------------|
/// | `INVALID_ARGUMENT` | Arguments failed validation (tool body never ran) |
/// | `NOT_FOUND` | Unknown tool or resource |
/// | `EXECUTION_FAILED` | The tool ran and failed |
/// | `TIMEOUT` | The tool did not answer in time |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolError {
    /// Error code (e.g., "NOT_FOUND", "EXECUTION_FAILED")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ToolError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Common error constructors

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            "NOT_FOUND",
            format!("Resource not found: {}", resource.into()),
        )
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new("INVALID_ARGUMENT", message)
    }

    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::new("EXECUTION_FAILED", message)
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::new(
            "TIMEOUT",
            format!("Operation timed out: {}", operation.into()),
        )
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for ToolError {}

impl From<ValidationError> for ToolError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::UnknownTool(name) => ToolError::not_found(format!("tool {}", name)),
            other => ToolError::invalid_argument(other.to_string()),
        }
    }
}

/// Result of a single tool call as seen by the role executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Name of the tool that was called
    pub tool_name: String,
    /// Whether the execution was successful
    pub success: bool,
    /// Output value (for successful execution)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Error information (for failed or rejected calls)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
    /// Duration of execution in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(tool_name: impl Into<String>, output: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: true,
            output: Some(output),
            error: None,
            duration_ms: None,
        }
    }

    /// Create a failed result
    pub fn failure(tool_name: impl Into<String>, error: ToolError) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: false,
            output: None,
            error: Some(error),
            duration_ms: None,
        }
    }

    /// Add duration metadata
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn error(&self) -> Option<&ToolError> {
        self.error.as_ref()
    }

    /// JSON body sent back to the model as the tool message.
    ///
    /// Failures are wrapped as `{"error": {"code", "message"}}` so the model
    /// can tell a rejected call from an empty result.
    pub fn to_message_content(&self) -> String {
        match (&self.output, &self.error) {
            (Some(output), _) if self.success => output.to_string(),
            (_, Some(error)) => serde_json::json!({
                "error": { "code": error.code, "message": error.message }
            })
            .to_string(),
            _ => "null".to_string(),
        }
    }
}
