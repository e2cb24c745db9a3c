//! Test doubles shared by the use case tests.
//!
//! - [`ScriptedGateway`] pops canned replies in order and records requests
//! - [`MockToolExecutor`] counts calls and returns canned outputs
//! - [`RecordingStore`] keeps appended messages in memory

use crate::ports::conversation_store::{ConversationStore, StoreError, StoredMessage};
use crate::ports::llm_gateway::{ChatRequest, GatewayError, LlmGateway, StreamHandle};
use crate::ports::tool_executor::ToolExecutorPort;
use crate::ports::tool_schema::ToolSchemaPort;
use async_trait::async_trait;
use chrono::Utc;
use roundtable_domain::{
    ContentBlock, ConversationId, LlmResponse, ParamType, Speaker, StopReason, StreamEvent,
    ToolDefinition, ToolError, ToolParameter, ToolSpec, ValidatedArgs,
};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::mpsc;

// ==================== Scripted gateway ====================

/// A scripted reply for the mock gateway
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    /// Plain text; streamed as word deltas by `chat_stream`
    Text(String),
    /// Structured response (tool calls, optionally with text streamed first)
    Response(LlmResponse),
    /// Return an error
    Error(GatewayError),
    /// Never answer
    Hang,
}

impl Reply {
    pub(crate) fn text(text: &str) -> Self {
        Reply::Text(text.to_string())
    }

    pub(crate) fn error(error: GatewayError) -> Self {
        Reply::Error(error)
    }

    /// A single tool call with the given JSON object as arguments.
    pub(crate) fn tool_call(name: &str, args: Value) -> Self {
        Self::tool_call_with_text("", name, args)
    }

    pub(crate) fn tool_call_with_text(text: &str, name: &str, args: Value) -> Self {
        let input = match args {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        let mut content = Vec::new();
        if !text.is_empty() {
            content.push(ContentBlock::Text(text.to_string()));
        }
        content.push(ContentBlock::ToolUse {
            id: format!("call_{}", name),
            name: name.to_string(),
            input,
        });
        Reply::Response(LlmResponse {
            content,
            stop_reason: Some(StopReason::ToolUse),
            model: None,
        })
    }
}

/// Mock gateway that returns scripted replies in order
pub(crate) struct ScriptedGateway {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedGateway {
    pub(crate) fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }

    fn next_reply(&self, request: ChatRequest) -> Reply {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Text("(no more responses)".to_string()))
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn chat(&self, request: ChatRequest) -> Result<LlmResponse, GatewayError> {
        match self.next_reply(request) {
            Reply::Text(t) => Ok(LlmResponse::from_text(t)),
            Reply::Response(r) => Ok(r),
            Reply::Error(e) => Err(e),
            Reply::Hang => std::future::pending().await,
        }
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<StreamHandle, GatewayError> {
        let reply = self.next_reply(request);
        let (tx, rx) = mpsc::channel(64);
        match reply {
            Reply::Text(t) => {
                for word in t.split_inclusive(' ') {
                    let _ = tx.send(StreamEvent::Delta(word.to_string())).await;
                }
                let _ = tx.send(StreamEvent::Completed(LlmResponse::from_text(t))).await;
            }
            Reply::Response(r) => {
                let text = r.text_content();
                for word in text.split_inclusive(' ') {
                    let _ = tx.send(StreamEvent::Delta(word.to_string())).await;
                }
                let _ = tx.send(StreamEvent::Completed(r)).await;
            }
            Reply::Error(e) => return Err(e),
            Reply::Hang => std::future::pending::<()>().await,
        }
        Ok(StreamHandle::new(rx))
    }
}

// ==================== Tools ====================

/// Minimal definitions of the built-in advisory tools.
pub(crate) fn advisory_tool_spec() -> ToolSpec {
    let number = |name: &str, required: bool| {
        ToolParameter::new(name, name, required).with_type(ParamType::Number)
    };
    let string = |name: &str, required: bool| ToolParameter::new(name, name, required);

    ToolSpec::new()
        .with_tool(
            ToolDefinition::new("calc_loan", "Loan repayment")
                .with_parameter(number("principal", true))
                .with_parameter(
                    ToolParameter::new("years", "years", true).with_type(ParamType::Integer),
                )
                .with_parameter(number("rate", false)),
        )
        .with_tool(ToolDefinition::new("calc_tax", "Purchase taxes").with_parameter(number("price", true)))
        .with_tool(
            ToolDefinition::new("calc_total_cost", "Total cost")
                .with_parameter(number("price", true)),
        )
        .with_tool(
            ToolDefinition::new("assess_pressure", "Affordability")
                .with_parameter(number("monthly_income", true))
                .with_parameter(number("monthly_payment", true)),
        )
        .with_tool(
            ToolDefinition::new("generate_repayment_plan", "Repayment schedule")
                .with_parameter(number("loan_amount", true)),
        )
        .with_tool(ToolDefinition::new("search_policy", "Policy search").with_parameter(string("query", true)))
        .with_tool(ToolDefinition::new("search_faq", "FAQ search").with_parameter(string("query", true)))
        .with_tool(ToolDefinition::new("search_guide", "Buying guide").with_parameter(string("query", true)))
        .with_tool(ToolDefinition::new("search_news", "News search").with_parameter(string("query", true)))
        .with_tool(
            ToolDefinition::new("query_price_trend", "Price history")
                .with_parameter(string("city", true))
                .with_parameter(string("district", true)),
        )
        .with_tool(
            ToolDefinition::new("compare_districts", "District comparison")
                .with_parameter(string("city", true))
                .with_parameter(string("districts", true)),
        )
        .with_tool(
            ToolDefinition::new("generate_report", "Purchase report")
                .with_parameter(string("city", true))
                .with_parameter(number("budget", true)),
        )
        .with_tool(
            ToolDefinition::new("query_market", "Market snapshot").with_parameter(
                ToolParameter::new("city", "city", true).with_enum(["nanning", "liuzhou"]),
            ),
        )
        .with_tool(
            ToolDefinition::new("judge_timing", "Timing")
                .with_parameter(string("city", true))
                .with_parameter(
                    ToolParameter::new("purpose", "purpose", false)
                        .with_enum(["self-use", "investment"]),
                ),
        )
}

/// Mock tool executor that records calls and returns canned outputs
pub(crate) struct MockToolExecutor {
    spec: ToolSpec,
    outputs: HashMap<String, Result<Value, ToolError>>,
    calls: Mutex<Vec<(String, ValidatedArgs)>>,
}

impl MockToolExecutor {
    pub(crate) fn new() -> Self {
        Self {
            spec: advisory_tool_spec(),
            outputs: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_output(mut self, tool: &str, output: Result<Value, ToolError>) -> Self {
        self.outputs.insert(tool.to_string(), output);
        self
    }

    pub(crate) fn calls(&self) -> Vec<(String, ValidatedArgs)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolExecutorPort for MockToolExecutor {
    fn tool_spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, name: &str, args: ValidatedArgs) -> Result<Value, ToolError> {
        self.calls.lock().unwrap().push((name.to_string(), args));
        self.outputs
            .get(name)
            .cloned()
            .unwrap_or_else(|| Ok(json!({ "tool": name, "ok": true })))
    }
}

/// Schema converter that only keeps the name
pub(crate) struct NameOnlySchema;

impl ToolSchemaPort for NameOnlySchema {
    fn tool_to_schema(&self, tool: &ToolDefinition) -> Value {
        json!({ "name": tool.name })
    }
}

// ==================== Store ====================

/// In-memory store that records everything written to it
#[derive(Default)]
pub(crate) struct RecordingStore {
    messages: Mutex<Vec<StoredMessage>>,
    created: Mutex<Vec<(Option<String>, String)>>,
    fail_create: bool,
}

impl RecordingStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing_create() -> Self {
        Self {
            fail_create: true,
            ..Self::default()
        }
    }

    pub(crate) fn messages(&self) -> Vec<StoredMessage> {
        self.messages.lock().unwrap().clone()
    }

    pub(crate) fn created(&self) -> Vec<(Option<String>, String)> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConversationStore for RecordingStore {
    async fn create_conversation(
        &self,
        user_id: Option<&str>,
        title: &str,
    ) -> Result<ConversationId, StoreError> {
        if self.fail_create {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        let mut created = self.created.lock().unwrap();
        created.push((user_id.map(str::to_string), title.to_string()));
        Ok(ConversationId::new(format!("conv-{}", created.len())))
    }

    async fn append_message(
        &self,
        conversation_id: &ConversationId,
        speaker: Speaker,
        content: &str,
        metadata: Value,
    ) -> Result<(), StoreError> {
        self.messages.lock().unwrap().push(StoredMessage {
            conversation_id: conversation_id.clone(),
            speaker,
            content: content.to_string(),
            metadata,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn load_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        let messages: Vec<_> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| &m.conversation_id == conversation_id)
            .cloned()
            .collect();
        if messages.is_empty() {
            return Err(StoreError::NotFound(conversation_id.to_string()));
        }
        Ok(messages)
    }
}
