//! LLM Gateway port
//!
//! Defines the interface for communicating with the chat model.

use async_trait::async_trait;
use roundtable_domain::{ErrorCode, LlmResponse, Message, StreamEvent};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("Request timed out")]
    Timeout,

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Transport error: {0}")]
    Unknown(String),
}

impl GatewayError {
    /// Timeouts and rate limits are worth one more attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Timeout | GatewayError::RateLimited)
    }

    /// Stable code reported to clients when this error ends a turn.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            GatewayError::Timeout => ErrorCode::TransportTimeout,
            GatewayError::Auth(_) => ErrorCode::TransportAuth,
            GatewayError::RateLimited => ErrorCode::TransportRateLimited,
            GatewayError::Unknown(_) => ErrorCode::TransportUnknown,
        }
    }
}

/// One chat completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    /// Tool schemas in the provider's function format; empty for no tools
    pub tools: Vec<Value>,
    pub temperature: f32,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            tools: Vec::new(),
            temperature: 0.7,
        }
    }

    pub fn with_tools(mut self, tools: Vec<Value>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Text of the last user message, if any.
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == roundtable_domain::MessageRole::User)
            .map(|m| m.content.as_str())
    }
}

/// Gateway for LLM communication
///
/// This port defines how the application layer talks to the model.
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Send a request and wait for the complete response.
    async fn chat(&self, request: ChatRequest) -> Result<LlmResponse, GatewayError>;

    /// Send a request and receive text deltas as they are generated.
    ///
    /// Default implementation calls `chat()` and wraps the result in a single
    /// `Completed` event, so adapters without streaming work unchanged.
    async fn chat_stream(&self, request: ChatRequest) -> Result<StreamHandle, GatewayError> {
        let response = self.chat(request).await?;
        let (tx, rx) = mpsc::channel(1);
        // If the receiver is already gone nobody wants the result
        let _ = tx.send(StreamEvent::Completed(response)).await;
        Ok(StreamHandle::new(rx))
    }
}

/// Handle for receiving streaming events from the gateway.
///
/// Wraps an `mpsc::Receiver<StreamEvent>` and provides convenience methods
/// for consuming the stream.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    /// Consume the stream and return the final response.
    ///
    /// If the channel closes without a `Completed` event, the deltas seen so
    /// far are returned as a text-only response.
    pub async fn collect(mut self) -> Result<LlmResponse, GatewayError> {
        let mut full_text = String::new();
        while let Some(event) = self.receiver.recv().await {
            match event {
                StreamEvent::Delta(chunk) => full_text.push_str(&chunk),
                StreamEvent::Completed(response) => return Ok(response),
                StreamEvent::Error(e) => return Err(GatewayError::Unknown(e)),
            }
        }
        if full_text.is_empty() {
            return Err(GatewayError::Unknown(
                "stream closed without a response".to_string(),
            ));
        }
        Ok(LlmResponse::from_text(full_text))
    }
}
