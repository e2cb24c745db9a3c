//! OpenAI-compatible LLM gateway
//!
//! Talks to any `/chat/completions` endpoint speaking the OpenAI wire
//! format (DeepSeek, vLLM, Ollama, ...). Streaming uses server-sent
//! events; deltas are forwarded as soon as they are parsed.

use super::protocol::{ChatCompletion, ChatCompletionRequest, StreamAccumulator, StreamChunk, WireMessage};
use crate::config::FileLlmConfig;
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::{Client, Response, StatusCode};
use roundtable_application::{ChatRequest, GatewayError, LlmGateway, StreamHandle};
use roundtable_domain::{LlmResponse, StreamEvent};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

/// Capacity of the delta channel handed to the role executor.
const STREAM_BUFFER: usize = 64;

/// Sentinel data line ending an OpenAI stream.
const DONE_MARKER: &str = "[DONE]";

pub struct OpenAiGateway {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiGateway {
    pub fn new(config: &FileLlmConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| GatewayError::Unknown(format!("failed to build HTTP client: {}", e)))?;

        let api_key = config.resolve_api_key();
        if api_key.is_none() {
            warn!(
                env = %config.api_key_env,
                "No API key configured; requests will be sent unauthenticated"
            );
        }

        let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        info!(endpoint = %endpoint, model = %config.model, "OpenAI-compatible gateway initialized");

        Ok(Self {
            client,
            endpoint,
            model: config.model.clone(),
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn post(&self, request: &ChatRequest, stream: bool) -> Result<Response, GatewayError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: request.messages.iter().map(WireMessage::from).collect(),
            tools: &request.tools,
            temperature: request.temperature,
            stream,
        };
        debug!(
            messages = body.messages.len(),
            tools = body.tools.len(),
            stream,
            "Sending chat completion request"
        );

        let mut builder = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        Err(status_error(status, &text))
    }
}

/// Map an HTTP status to the gateway error taxonomy.
fn status_error(status: StatusCode, body: &str) -> GatewayError {
    let detail = format!("HTTP {}: {}", status.as_u16(), body.chars().take(200).collect::<String>());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::Auth(detail),
        StatusCode::TOO_MANY_REQUESTS => GatewayError::RateLimited,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => GatewayError::Timeout,
        _ => GatewayError::Unknown(detail),
    }
}

fn transport_error(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Unknown(error.to_string())
    }
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    async fn chat(&self, request: ChatRequest) -> Result<LlmResponse, GatewayError> {
        let response = self.post(&request, false).await?;
        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| GatewayError::Unknown(format!("invalid completion body: {}", e)))?;
        completion
            .into_response()
            .ok_or_else(|| GatewayError::Unknown("completion without choices".to_string()))
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<StreamHandle, GatewayError> {
        let response = self.post(&request, true).await?;
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        tokio::spawn(pump_stream(response, tx));
        Ok(StreamHandle::new(rx))
    }
}

/// Read SSE events until `[DONE]`, forwarding text deltas and finishing
/// with a single `Completed` (or `Error`) event.
///
/// Stops early when the receiver is dropped.
async fn pump_stream(response: Response, tx: mpsc::Sender<StreamEvent>) {
    let mut events = response.bytes_stream().eventsource();
    let mut accumulator = StreamAccumulator::default();

    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                let _ = tx.send(StreamEvent::Error(format!("SSE stream error: {}", e))).await;
                return;
            }
        };
        trace!(data = %event.data, "SSE event");
        if event.data.trim() == DONE_MARKER {
            break;
        }

        let chunk: StreamChunk = match serde_json::from_str(&event.data) {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(error = %e, "Skipping unparsable SSE chunk");
                continue;
            }
        };
        if let Some(message) = chunk.error_message() {
            let _ = tx.send(StreamEvent::Error(message)).await;
            return;
        }
        if let Some(delta) = accumulator.push(chunk)
            && tx.send(StreamEvent::Delta(delta)).await.is_err()
        {
            debug!("Stream receiver dropped, abandoning response");
            return;
        }
    }

    let _ = tx.send(StreamEvent::Completed(accumulator.finish())).await;
}
