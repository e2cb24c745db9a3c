//! Wire types for OpenAI-compatible chat completions.
//!
//! Request bodies are built from domain [`Message`]s; responses (whole or
//! streamed as SSE chunks) are folded back into an [`LlmResponse`].

use roundtable_domain::{ContentBlock, LlmResponse, Message, MessageRole, StopReason, ToolCall};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

// ==================== Request ====================

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "<[Value]>::is_empty")]
    pub tools: &'a [Value],
    pub temperature: f32,
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireMessage {
    role: &'static str,
    content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction,
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    /// JSON-encoded argument object
    arguments: String,
}

fn role_name(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
        MessageRole::Tool => "tool",
    }
}

/// Calls without a provider id get a positional one so tool results
/// can still be matched up.
fn call_id(call: &ToolCall, index: usize) -> String {
    call.call_id
        .clone()
        .unwrap_or_else(|| format!("call_{}", index))
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        let tool_calls = message
            .tool_calls
            .iter()
            .enumerate()
            .map(|(i, call)| WireToolCall {
                id: call_id(call, i),
                kind: "function",
                function: WireFunction {
                    name: call.tool_name.clone(),
                    arguments: Value::Object(call.arguments.clone()).to_string(),
                },
            })
            .collect();
        Self {
            role: role_name(message.role),
            content: message.content.clone(),
            tool_calls,
            tool_call_id: message.tool_call_id.clone(),
        }
    }
}

// ==================== Response ====================

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletion {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<CompletionToolCall>>,
}

#[derive(Debug, Deserialize)]
struct CompletionToolCall {
    #[serde(default)]
    id: Option<String>,
    function: CompletionFunction,
}

#[derive(Debug, Deserialize)]
struct CompletionFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

/// Parse the model's JSON-encoded argument string.
///
/// Malformed or non-object arguments become an empty map; validation then
/// reports the missing parameters back to the model.
fn parse_arguments(tool: &str, raw: &str) -> Map<String, Value> {
    if raw.trim().is_empty() {
        return Map::new();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            warn!(tool = %tool, "Tool arguments are not a JSON object, ignoring them");
            Map::new()
        }
    }
}

fn tool_use(id: Option<String>, index: usize, name: String, arguments: &str) -> ContentBlock {
    ContentBlock::ToolUse {
        id: id
            .filter(|i| !i.is_empty())
            .unwrap_or_else(|| format!("call_{}", index)),
        input: parse_arguments(&name, arguments),
        name,
    }
}

impl ChatCompletion {
    /// First choice as a domain response. No choices at all is an error.
    pub(crate) fn into_response(self) -> Option<LlmResponse> {
        let choice = self.choices.into_iter().next()?;
        let mut content = Vec::new();
        if let Some(text) = choice.message.content.filter(|t| !t.is_empty()) {
            content.push(ContentBlock::Text(text));
        }
        for (i, call) in choice.message.tool_calls.unwrap_or_default().into_iter().enumerate() {
            content.push(tool_use(call.id, i, call.function.name, &call.function.arguments));
        }
        Some(LlmResponse {
            content,
            stop_reason: choice
                .finish_reason
                .as_deref()
                .map(StopReason::from_finish_reason),
            model: self.model,
        })
    }
}

// ==================== Streaming ====================

#[derive(Debug, Deserialize)]
pub(crate) struct StreamChunk {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ChunkToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ChunkToolCall {
    #[serde(default)]
    index: usize,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<ChunkFunction>,
}

#[derive(Debug, Deserialize)]
struct ChunkFunction {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

impl StreamChunk {
    /// Provider error embedded in the stream, if any.
    pub(crate) fn error_message(&self) -> Option<String> {
        let error = self.error.as_ref()?;
        Some(
            error
                .get("message")
                .and_then(Value::as_str)
                .or_else(|| error.as_str())
                .unwrap_or("error during streaming")
                .to_string(),
        )
    }
}

#[derive(Debug, Default)]
struct PartialToolCall {
    id: Option<String>,
    name: String,
    arguments: String,
}

/// Folds streamed chunks into one response.
///
/// Tool calls arrive in fragments keyed by `index`: the first fragment
/// carries id and name, later ones append to the argument string.
#[derive(Debug, Default)]
pub(crate) struct StreamAccumulator {
    text: String,
    tool_calls: BTreeMap<usize, PartialToolCall>,
    finish_reason: Option<String>,
    model: Option<String>,
}

impl StreamAccumulator {
    /// Absorb one chunk, returning its text delta (if any).
    pub(crate) fn push(&mut self, chunk: StreamChunk) -> Option<String> {
        if self.model.is_none() {
            self.model = chunk.model;
        }
        let choice = chunk.choices.into_iter().next()?;
        if let Some(reason) = choice.finish_reason {
            self.finish_reason = Some(reason);
        }
        for fragment in choice.delta.tool_calls.unwrap_or_default() {
            let partial = self.tool_calls.entry(fragment.index).or_default();
            if let Some(id) = fragment.id.filter(|i| !i.is_empty()) {
                partial.id = Some(id);
            }
            if let Some(function) = fragment.function {
                if let Some(name) = function.name {
                    partial.name.push_str(&name);
                }
                if let Some(arguments) = function.arguments {
                    partial.arguments.push_str(&arguments);
                }
            }
        }
        let delta = choice.delta.content.filter(|c| !c.is_empty())?;
        self.text.push_str(&delta);
        Some(delta)
    }

    pub(crate) fn finish(self) -> LlmResponse {
        let mut content = Vec::new();
        if !self.text.is_empty() {
            content.push(ContentBlock::Text(self.text));
        }
        for (index, call) in self.tool_calls {
            if call.name.is_empty() {
                warn!(index, "Dropping streamed tool call without a name");
                continue;
            }
            content.push(tool_use(call.id, index, call.name, &call.arguments));
        }
        let stop_reason = match self.finish_reason.as_deref() {
            Some(reason) => Some(StopReason::from_finish_reason(reason)),
            None if content.iter().any(|b| matches!(b, ContentBlock::ToolUse { .. })) => {
                Some(StopReason::ToolUse)
            }
            None => Some(StopReason::EndTurn),
        };
        LlmResponse {
            content,
            stop_reason,
            model: self.model,
        }
    }
}
