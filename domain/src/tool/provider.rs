//! Executable tool abstraction
//!
//! A [`ToolHandler`] pairs a [`ToolDefinition`] with its body. Handlers are
//! collected into a registry at startup (see the infrastructure
//! `ToolRegistry`) and never change afterwards.
//!
//! ```text
//!   model output ──▶ ToolCall ──▶ ToolValidator ──▶ ValidatedArgs ──▶ ToolHandler::execute
//!                    (raw JSON)     (boundary)        (typed)           (body)
//! ```
//!
//! Bodies only ever see [`ValidatedArgs`]; raw JSON maps stop at the
//! validator.

use async_trait::async_trait;
use serde_json::Value;

use super::args::ValidatedArgs;
use super::entities::ToolDefinition;
use super::value_objects::ToolError;

/// A callable tool: schema plus body.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Schema of this tool.
    fn definition(&self) -> &ToolDefinition;

    /// Run the tool body.
    async fn execute(&self, args: ValidatedArgs) -> Result<Value, ToolError>;

    /// Tool name (shortcut for `definition().name`).
    fn name(&self) -> &str {
        &self.definition().name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::entities::{ParamType, ToolCall, ToolParameter};
    use crate::tool::traits::{DefaultToolValidator, ToolValidator};

    struct Doubler {
        definition: ToolDefinition,
    }

    #[async_trait]
    impl ToolHandler for Doubler {
        fn definition(&self) -> &ToolDefinition {
            &self.definition
        }

        async fn execute(&self, args: ValidatedArgs) -> Result<Value, ToolError> {
            let n = args
                .number("n")
                .ok_or_else(|| ToolError::invalid_argument("n"))?;
            Ok(serde_json::json!(n * 2.0))
        }
    }

    #[tokio::test]
    async fn test_handler_receives_validated_args() {
        let tool = Doubler {
            definition: ToolDefinition::new("double", "Doubles n").with_parameter(
                ToolParameter::new("n", "value", true).with_type(ParamType::Number),
            ),
        };
        let call = ToolCall::new("double").with_arg("n", 21);
        let args = DefaultToolValidator
            .validate(&call, tool.definition())
            .unwrap();

        assert_eq!(tool.name(), "double");
        assert_eq!(tool.execute(args).await.unwrap(), serde_json::json!(42.0));
    }
}
