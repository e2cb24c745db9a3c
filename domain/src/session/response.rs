//! Structured model responses.
//!
//! A chat completion may mix text with tool use requests. The role
//! executor looks at [`LlmResponse::tool_calls`] first: any tool call
//! means another loop iteration, plain text means a final answer.

use serde::{Deserialize, Serialize};

use crate::tool::entities::ToolCall;

/// A single block of content within a model response.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    /// A text content block from the model.
    Text(String),

    /// A tool use request from the model.
    ToolUse {
        /// Provider-assigned id for correlating the tool result
        id: String,
        /// Requested tool name (not yet checked against anything)
        name: String,
        /// Raw arguments
        input: serde_json::Map<String, serde_json::Value>,
    },
}

impl ContentBlock {
    /// Returns the text content if this is a `Text` block.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of response
    EndTurn,
    /// The model wants to call tools
    ToolUse,
    /// Hit the token limit; response may be truncated
    MaxTokens,
    /// Provider-specific stop reason
    Other(String),
}

impl StopReason {
    /// Map an OpenAI-style `finish_reason`.
    pub fn from_finish_reason(reason: &str) -> Self {
        match reason {
            "stop" => StopReason::EndTurn,
            "tool_calls" | "function_call" => StopReason::ToolUse,
            "length" => StopReason::MaxTokens,
            other => StopReason::Other(other.to_string()),
        }
    }
}

/// A structured response from the model: text and/or tool calls.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse {
    /// Content blocks in the response (text and/or tool use).
    pub content: Vec<ContentBlock>,
    /// Why the model stopped generating.
    pub stop_reason: Option<StopReason>,
    /// Model identifier (if returned by the API).
    pub model: Option<String>,
}

impl LlmResponse {
    /// Create a text-only response.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text(text.into())],
            stop_reason: Some(StopReason::EndTurn),
            model: None,
        }
    }

    /// Concatenate all `Text` content blocks into a single string.
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(|b| b.as_text())
            .collect::<Vec<_>>()
            .join("")
    }

    /// Extract all `ToolUse` content blocks as `Vec<ToolCall>`.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolUse { id, name, input } => Some(ToolCall {
                    tool_name: name.clone(),
                    arguments: input.clone(),
                    call_id: Some(id.clone()),
                }),
                _ => None,
            })
            .collect()
    }

    /// Returns `true` if the response contains any tool use requests.
    pub fn has_tool_calls(&self) -> bool {
        self.content
            .iter()
            .any(|b| matches!(b, ContentBlock::ToolUse { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_text_creates_text_only_response() {
        let response = LlmResponse::from_text("Hello, world!");
        assert_eq!(response.text_content(), "Hello, world!");
        assert!(!response.has_tool_calls());
        assert!(response.tool_calls().is_empty());
        assert_eq!(response.stop_reason, Some(StopReason::EndTurn));
    }

    #[test]
    fn tool_calls_extraction() {
        let mut input = serde_json::Map::new();
        input.insert("price".to_string(), json!(1_000_000));
        let response = LlmResponse {
            content: vec![
                ContentBlock::Text("Let me run the numbers.".to_string()),
                ContentBlock::ToolUse {
                    id: "call_abc".to_string(),
                    name: "calc_loan".to_string(),
                    input,
                },
            ],
            stop_reason: Some(StopReason::ToolUse),
            model: Some("deepseek-chat".to_string()),
        };

        assert!(response.has_tool_calls());
        assert_eq!(response.text_content(), "Let me run the numbers.");

        let calls = response.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].tool_name, "calc_loan");
        assert_eq!(calls[0].call_id.as_deref(), Some("call_abc"));
        assert_eq!(calls[0].arguments["price"], json!(1_000_000));
    }

    #[test]
    fn finish_reason_mapping() {
        assert_eq!(StopReason::from_finish_reason("stop"), StopReason::EndTurn);
        assert_eq!(StopReason::from_finish_reason("tool_calls"), StopReason::ToolUse);
        assert_eq!(StopReason::from_finish_reason("length"), StopReason::MaxTokens);
        assert_eq!(
            StopReason::from_finish_reason("content_filter"),
            StopReason::Other("content_filter".to_string())
        );
    }
}
