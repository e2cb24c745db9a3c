//! Tool Registry
//!
//! The [`ToolRegistry`] maps tool names to [`ToolHandler`]s and implements
//! [`ToolExecutorPort`]. It is filled once at startup and is read-only
//! afterwards, so it can be shared across concurrent turns behind an `Arc`.
//!
//! # Usage
//!
//! ```ignore
//! use roundtable_infrastructure::tools::{ToolRegistry, builtin::CalcLoan};
//!
//! let registry = ToolRegistry::new()
//!     .register(CalcLoan::new())
//!     .register(SearchFaq::new(knowledge, 3));
//!
//! assert!(registry.has_tool("calc_loan"));
//! ```
//!
//! # Re-registration
//!
//! Registering a second handler under an existing name replaces the first
//! one. The replacement is logged at `warn` level since it usually means
//! two providers claim the same tool.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use roundtable_application::ToolExecutorPort;
use roundtable_domain::{ToolError, ToolHandler, ToolSpec, ValidatedArgs};
use serde_json::Value;
use tracing::{debug, warn};

pub struct ToolRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
    spec: ToolSpec,
    replaced: usize,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            spec: ToolSpec::new(),
            replaced: 0,
        }
    }

    /// Register a tool handler
    pub fn register<H: ToolHandler + 'static>(self, handler: H) -> Self {
        self.register_arc(Arc::new(handler))
    }

    /// Register a tool handler (Arc version)
    pub fn register_arc(mut self, handler: Arc<dyn ToolHandler>) -> Self {
        let name = handler.name().to_string();
        if self.spec.register(handler.definition().clone()).is_some() {
            warn!(tool = %name, "Tool registered twice, replacing earlier handler");
            self.replaced += 1;
        } else {
            debug!(tool = %name, "Registered tool");
        }
        self.handlers.insert(name, handler);
        self
    }

    /// Get statistics about registered tools
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            total_tools: self.handlers.len(),
            replaced: self.replaced,
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryStats {
    pub total_tools: usize,
    /// Registrations that overwrote an existing name
    pub replaced: usize,
}

#[async_trait]
impl ToolExecutorPort for ToolRegistry {
    fn tool_spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, name: &str, args: ValidatedArgs) -> Result<Value, ToolError> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| ToolError::not_found(format!("tool {}", name)))?;
        handler.execute(args).await
    }
}
