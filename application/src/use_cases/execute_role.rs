//! Role executor: one role pass with its tool-calling loop.
//!
//! ```text
//! prompt ──▶ model ──┬─ tool calls ──▶ validate ──┬─ ok ──▶ run tool ─┐
//!                    │                            └─ bad ─▶ feedback ─┤
//!                    │            ◀──── results appended ─────────────┘
//!                    └─ text only ──▶ final answer
//! ```
//!
//! The loop is bounded by `max_tool_iterations` model calls. Running out
//! of iterations degrades the role's answer to a fixed message; it never
//! fails the turn. Transport errors do.

use crate::config::OrchestrationParams;
use crate::ports::llm_gateway::{ChatRequest, GatewayError, LlmGateway};
use crate::ports::tool_executor::ToolExecutorPort;
use crate::ports::tool_schema::ToolSchemaPort;
use crate::use_cases::publisher::EventPublisher;
use crate::use_cases::run_turn::RunTurnError;
use crate::use_cases::shared::{cancellable, open_stream_with_retry};
use roundtable_domain::{
    ConversationContext, DefaultToolValidator, EventKind, LlmResponse, Message, PromptTemplate,
    Role, RoleOutput, Speaker, StepKind, StreamEvent, ToolCall, ToolError, ToolResult,
    ToolValidator, ValidatedArgs, ValidationError, truncate,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Answer of a role that ran out of tool iterations.
pub const DEGRADED_ANSWER: &str = "Unable to complete analysis.";

/// Longest tool result echoed on the event stream.
const MAX_EVENT_CONTENT: usize = 2000;

/// How a role pass shows up on the event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// `role_start`, `content_delta*`, `role_result`
    Visible { is_summary: bool },
    /// Discussion statement: tool events only, the coordinator reports the text
    Statement,
    /// No role framing at all
    Silent,
}

impl Visibility {
    fn is_visible(&self) -> bool {
        matches!(self, Visibility::Visible { .. })
    }
}

/// Input of one role pass.
pub struct RolePass<'a> {
    pub role: &'a Role,
    pub utterance: &'a str,
    pub context: &'a ConversationContext,
    /// Final answers of roles that already ran in this turn
    pub prior: &'a [RoleOutput],
    /// Replaces the utterance as the user message (synthesis, discussion)
    pub instruction: Option<String>,
    pub visibility: Visibility,
}

impl<'a> RolePass<'a> {
    pub fn new(role: &'a Role, utterance: &'a str, context: &'a ConversationContext) -> Self {
        Self {
            role,
            utterance,
            context,
            prior: &[],
            instruction: None,
            visibility: Visibility::Visible { is_summary: false },
        }
    }

    pub fn with_prior(mut self, prior: &'a [RoleOutput]) -> Self {
        self.prior = prior;
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

pub struct RoleExecutor {
    gateway: Arc<dyn LlmGateway>,
    tools: Arc<dyn ToolExecutorPort>,
    schema: Arc<dyn ToolSchemaPort>,
    params: OrchestrationParams,
}

impl RoleExecutor {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        tools: Arc<dyn ToolExecutorPort>,
        schema: Arc<dyn ToolSchemaPort>,
        params: OrchestrationParams,
    ) -> Self {
        Self {
            gateway,
            tools,
            schema,
            params,
        }
    }

    /// Run one role pass to its final text.
    pub async fn execute(
        &self,
        pass: RolePass<'_>,
        publisher: &EventPublisher,
    ) -> Result<RoleOutput, RunTurnError> {
        let role = pass.role;

        if let Visibility::Visible { is_summary } = pass.visibility {
            publisher
                .emit(EventKind::RoleStart {
                    role: role.id.to_string(),
                    name: role.name.clone(),
                    icon: role.icon.clone(),
                    is_summary,
                })
                .await?;
        }

        let mut messages = self.build_messages(&pass);
        let tool_schemas = self.schema.tools_schema(self.tools.tool_spec(), &role.tools);

        for iteration in 1..=self.params.max_tool_iterations {
            let request = ChatRequest::new(messages.clone())
                .with_tools(tool_schemas.clone())
                .with_temperature(self.params.temperature);

            let (response, chunks) = self.call_model(request, publisher).await?;
            let calls = response.tool_calls();
            let text = response.text_content();

            if calls.is_empty() {
                debug!(role = %role.id, iteration, "Role produced final answer");
                let content = if chunks.is_empty() {
                    self.show(&pass, [text.clone()], publisher).await?;
                    text
                } else {
                    let streamed = chunks.concat();
                    self.show(&pass, chunks, publisher).await?;
                    streamed
                };
                return self.complete(&pass, content, false, publisher).await;
            }

            // Text of a tool-calling turn is narration, never part of the answer
            if !text.trim().is_empty() {
                publisher
                    .step(StepKind::Thinking, text.trim(), Some(&role.id))
                    .await?;
            }

            messages.push(Message::assistant_tool_calls(text, calls.clone()));
            for call in calls {
                let result = self.handle_tool_call(role, &call, publisher).await?;
                messages.push(Message::tool(call.call_id.clone(), result.to_message_content()));
            }
        }

        warn!(
            role = %role.id,
            max = self.params.max_tool_iterations,
            "Tool loop exhausted without a final answer"
        );
        self.show(&pass, [DEGRADED_ANSWER.to_string()], publisher)
            .await?;
        self.complete(&pass, DEGRADED_ANSWER.to_string(), true, publisher)
            .await
    }

    async fn complete(
        &self,
        pass: &RolePass<'_>,
        content: String,
        degraded: bool,
        publisher: &EventPublisher,
    ) -> Result<RoleOutput, RunTurnError> {
        let role = pass.role;
        if let Visibility::Visible { is_summary } = pass.visibility {
            publisher
                .emit(EventKind::RoleResult {
                    role: role.id.to_string(),
                    name: role.name.clone(),
                    content: content.clone(),
                    is_summary,
                })
                .await?;
        }
        info!(role = %role.id, degraded, chars = content.len(), "Role pass finished");
        Ok(RoleOutput {
            role: role.id.clone(),
            name: role.name.clone(),
            content,
            degraded,
        })
    }

    // ==================== Prompt ====================

    fn build_messages(&self, pass: &RolePass<'_>) -> Vec<Message> {
        let mut messages = vec![Message::system(PromptTemplate::role_system(
            pass.role,
            pass.context.attributes(),
        ))];

        for turn in pass.context.recent(self.params.history_turns) {
            messages.push(match turn.speaker {
                Speaker::User => Message::user(turn.text.clone()),
                Speaker::Assistant => Message::assistant(turn.text.clone()),
            });
        }

        let question = pass
            .instruction
            .clone()
            .unwrap_or_else(|| pass.utterance.to_string());
        let content = match PromptTemplate::prior_findings(pass.prior) {
            Some(findings) => format!("{}\n\n{}", findings, question),
            None => question,
        };
        messages.push(Message::user(content));
        messages
    }

    // ==================== Model ====================

    /// Emit answer text as `content_delta`s of a visible pass.
    async fn show(
        &self,
        pass: &RolePass<'_>,
        chunks: impl IntoIterator<Item = String>,
        publisher: &EventPublisher,
    ) -> Result<(), RunTurnError> {
        if !pass.visibility.is_visible() {
            return Ok(());
        }
        for delta in chunks.into_iter().filter(|c| !c.is_empty()) {
            publisher
                .emit(EventKind::ContentDelta {
                    role: pass.role.id.to_string(),
                    delta,
                })
                .await?;
        }
        Ok(())
    }

    /// Read one streamed model response, returning it with the text
    /// chunks it arrived in.
    ///
    /// Chunks are held back rather than emitted: only once the stream has
    /// ended is it known whether the text is the final answer or the
    /// narration of a tool call.
    async fn call_model(
        &self,
        request: ChatRequest,
        publisher: &EventPublisher,
    ) -> Result<(LlmResponse, Vec<String>), RunTurnError> {
        let token = publisher.token();
        let mut handle = open_stream_with_retry(
            self.gateway.as_ref(),
            request,
            self.params.retry_backoff,
            token,
        )
        .await?;

        let mut chunks: Vec<String> = Vec::new();
        loop {
            match cancellable(token, handle.receiver.recv()).await? {
                Some(StreamEvent::Delta(chunk)) => {
                    if !chunk.is_empty() {
                        chunks.push(chunk);
                    }
                }
                Some(StreamEvent::Completed(response)) => return Ok((response, chunks)),
                Some(StreamEvent::Error(e)) => return Err(GatewayError::Unknown(e).into()),
                None if chunks.is_empty() => {
                    return Err(GatewayError::Unknown(
                        "stream closed without a response".to_string(),
                    )
                    .into());
                }
                None => {
                    let response = LlmResponse::from_text(chunks.concat());
                    return Ok((response, chunks));
                }
            }
        }
    }

    // ==================== Tools ====================

    /// Validate and run one requested call, emitting `tool_call` and
    /// `tool_result`. Rejected calls never reach the tool body.
    async fn handle_tool_call(
        &self,
        role: &Role,
        call: &ToolCall,
        publisher: &EventPublisher,
    ) -> Result<ToolResult, RunTurnError> {
        let role_id = role.id.to_string();
        publisher
            .emit(EventKind::ToolCall {
                role: role_id.clone(),
                tool_name: call.tool_name.clone(),
                tool_args: call.arguments_json(),
            })
            .await?;

        let result = match self.validate(role, call) {
            Err(e) => {
                warn!(role = %role.id, tool = %call.tool_name, error = %e, "Rejected tool call");
                ToolResult::failure(&call.tool_name, ToolError::from(e))
            }
            Ok(args) => {
                let started = Instant::now();
                let outcome =
                    cancellable(publisher.token(), self.tools.execute(&call.tool_name, args))
                        .await?;
                let elapsed = started.elapsed().as_millis() as u64;
                match outcome {
                    Ok(output) => {
                        debug!(role = %role.id, tool = %call.tool_name, elapsed, "Tool succeeded");
                        ToolResult::success(&call.tool_name, output).with_duration(elapsed)
                    }
                    Err(e) => {
                        warn!(role = %role.id, tool = %call.tool_name, error = %e, "Tool failed");
                        ToolResult::failure(&call.tool_name, e).with_duration(elapsed)
                    }
                }
            }
        };

        publisher
            .emit(EventKind::ToolResult {
                role: role_id,
                tool_name: call.tool_name.clone(),
                success: result.is_success(),
                content: truncate(&result.to_message_content(), MAX_EVENT_CONTENT),
            })
            .await?;
        Ok(result)
    }

    fn validate(&self, role: &Role, call: &ToolCall) -> Result<ValidatedArgs, ValidationError> {
        let definition = self
            .tools
            .get_tool(&call.tool_name)
            .ok_or_else(|| ValidationError::UnknownTool(call.tool_name.clone()))?;
        if !role.allows_tool(&call.tool_name) {
            return Err(ValidationError::NotPermitted {
                tool: call.tool_name.clone(),
                role: role.id.to_string(),
            });
        }
        DefaultToolValidator.validate(call, definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{MockToolExecutor, NameOnlySchema, Reply, ScriptedGateway};
    use roundtable_domain::event::kinds;
    use roundtable_domain::{RoleCatalog, TurnEvent, validate_sequence};
    use serde_json::json;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    struct Harness {
        gateway: Arc<ScriptedGateway>,
        tools: Arc<MockToolExecutor>,
        executor: RoleExecutor,
        catalog: RoleCatalog,
    }

    fn harness(replies: Vec<Reply>, tools: MockToolExecutor) -> Harness {
        let gateway = Arc::new(ScriptedGateway::new(replies));
        let tools = Arc::new(tools);
        let executor = RoleExecutor::new(
            gateway.clone(),
            tools.clone(),
            Arc::new(NameOnlySchema),
            OrchestrationParams::default().with_retry_backoff(std::time::Duration::ZERO),
        );
        Harness {
            gateway,
            tools,
            executor,
            catalog: RoleCatalog::home_purchase().unwrap(),
        }
    }

    async fn run(h: &Harness, role: &str, visibility: Visibility) -> (RoleOutput, Vec<TurnEvent>) {
        let (tx, mut rx) = mpsc::channel(256);
        let publisher = EventPublisher::new(tx, CancellationToken::new());
        let context = ConversationContext::new(None);
        let role = h.catalog.find(role).unwrap();
        let output = h
            .executor
            .execute(
                RolePass::new(role, "Loan of 1,000,000 over 30 years?", &context)
                    .with_visibility(visibility),
                &publisher,
            )
            .await
            .unwrap();
        publisher.finish(None).await;
        let mut events = Vec::new();
        while let Some(e) = rx.recv().await {
            events.push(e);
        }
        (output, events)
    }

    #[tokio::test]
    async fn test_plain_answer_streams_deltas_inside_role_block() {
        let h = harness(vec![Reply::text("Monthly payment is about 5300.")], MockToolExecutor::new());
        let (output, events) = run(&h, "financial_advisor", Visibility::Visible { is_summary: false }).await;

        assert_eq!(output.content, "Monthly payment is about 5300.");
        assert!(!output.degraded);
        let names = kinds(&events);
        assert_eq!(names.first(), Some(&"role_start"));
        assert_eq!(names[names.len() - 2], "role_result");
        assert!(names.iter().filter(|n| **n == "content_delta").count() >= 1);
        assert!(validate_sequence(&events).is_ok());
    }

    #[tokio::test]
    async fn test_tool_call_then_answer() {
        let h = harness(
            vec![
                Reply::tool_call_with_text(
                    "Let me compute that.",
                    "calc_loan",
                    json!({"principal": 1000000, "years": 30}),
                ),
                Reply::text("About 5300 per month."),
            ],
            MockToolExecutor::new().with_output("calc_loan", Ok(json!({"monthly_payment": 5307.27}))),
        );
        let (output, events) = run(&h, "financial_advisor", Visibility::Visible { is_summary: false }).await;

        assert_eq!(output.content, "About 5300 per month.");
        let calls = h.tools.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1.number("principal"), Some(1_000_000.0));
        assert_eq!(calls[0].1.integer("years"), Some(30));

        let names = kinds(&events);
        let call_at = names.iter().position(|n| *n == "tool_call").unwrap();
        assert_eq!(names[call_at + 1], "tool_result");
        assert!(names.contains(&"thinking_step"));
        assert!(validate_sequence(&events).is_ok());

        // Second model call sees the tool result
        let second = &h.gateway.requests()[1];
        let tool_message = second.messages.last().unwrap();
        assert_eq!(tool_message.tool_call_id.as_deref(), Some("call_calc_loan"));
        assert!(tool_message.content.contains("5307.27"));
    }

    #[tokio::test]
    async fn test_narration_before_tool_call_stays_out_of_answer_deltas() {
        let h = harness(
            vec![
                Reply::tool_call_with_text(
                    "Let me compute that.",
                    "calc_loan",
                    json!({"principal": 1000000, "years": 30}),
                ),
                Reply::text("About 5300 per month."),
            ],
            MockToolExecutor::new().with_output("calc_loan", Ok(json!({"monthly_payment": 5307.27}))),
        );
        let (output, events) = run(&h, "financial_advisor", Visibility::Visible { is_summary: false }).await;

        let deltas: String = events
            .iter()
            .filter_map(|e| match &e.kind {
                EventKind::ContentDelta { delta, .. } => Some(delta.as_str()),
                _ => None,
            })
            .collect();
        let result = events
            .iter()
            .find_map(|e| match &e.kind {
                EventKind::RoleResult { content, .. } => Some(content.clone()),
                _ => None,
            })
            .unwrap();
        let steps: Vec<&str> = events
            .iter()
            .filter_map(|e| match &e.kind {
                EventKind::ThinkingStep { content, .. } => Some(content.as_str()),
                _ => None,
            })
            .collect();

        assert_eq!(deltas, "About 5300 per month.");
        assert_eq!(deltas, output.content);
        assert_eq!(result, output.content);
        assert_eq!(steps, vec!["Let me compute that."]);

        // No answer text before the tool round trip
        let names = kinds(&events);
        let first_delta = names.iter().position(|n| *n == "content_delta").unwrap();
        let tool_result = names.iter().position(|n| *n == "tool_result").unwrap();
        assert!(tool_result < first_delta);
    }

    #[tokio::test]
    async fn test_missing_required_argument_never_reaches_tool() {
        let h = harness(
            vec![
                Reply::tool_call("calc_loan", json!({"principal": 1000000})),
                Reply::text("I need the loan term."),
            ],
            MockToolExecutor::new(),
        );
        let (output, events) = run(&h, "financial_advisor", Visibility::Visible { is_summary: false }).await;

        assert_eq!(output.content, "I need the loan term.");
        assert!(h.tools.calls().is_empty());
        let result = events
            .iter()
            .find_map(|e| match &e.kind {
                EventKind::ToolResult { success, content, .. } => Some((*success, content.clone())),
                _ => None,
            })
            .unwrap();
        assert!(!result.0);
        assert!(result.1.contains("INVALID_ARGUMENT"));
        let feedback = h.gateway.requests()[1].messages.last().unwrap().content.clone();
        assert!(feedback.contains("Missing required parameter 'years'"));
    }

    #[tokio::test]
    async fn test_tool_outside_role_list_is_rejected() {
        let h = harness(
            vec![
                Reply::tool_call("query_market", json!({"city": "nanning"})),
                Reply::text("Fine."),
            ],
            MockToolExecutor::new(),
        );
        let (_, events) = run(&h, "financial_advisor", Visibility::Visible { is_summary: false }).await;
        assert!(h.tools.calls().is_empty());
        assert!(validate_sequence(&events).is_ok());
        let feedback = h.gateway.requests()[1].messages.last().unwrap().content.clone();
        assert!(feedback.contains("not available to role"));
    }

    #[tokio::test]
    async fn test_unknown_tool_reports_not_found() {
        let h = harness(
            vec![Reply::tool_call("web_search", json!({"q": "x"})), Reply::text("ok")],
            MockToolExecutor::new(),
        );
        let _ = run(&h, "purchase_consultant", Visibility::Visible { is_summary: false }).await;
        let feedback = h.gateway.requests()[1].messages.last().unwrap().content.clone();
        assert!(feedback.contains("NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_tool_failure_is_fed_back() {
        let h = harness(
            vec![
                Reply::tool_call("search_policy", json!({"query": "provident fund"})),
                Reply::text("The documents are unavailable right now."),
            ],
            MockToolExecutor::new().with_output(
                "search_policy",
                Err(ToolError::execution_failed("index not loaded")),
            ),
        );
        let (output, events) = run(&h, "policy_expert", Visibility::Visible { is_summary: false }).await;
        assert!(!output.degraded);
        assert!(events.iter().any(|e| matches!(
            &e.kind,
            EventKind::ToolResult { success: false, .. }
        )));
        let feedback = h.gateway.requests()[1].messages.last().unwrap().content.clone();
        assert!(feedback.contains("EXECUTION_FAILED"));
    }

    #[tokio::test]
    async fn test_exhausted_loop_degrades() {
        let replies = (0..5)
            .map(|_| Reply::tool_call("calc_tax", json!({"price": 1000000})))
            .collect();
        let h = harness(replies, MockToolExecutor::new());
        let (output, events) = run(&h, "financial_advisor", Visibility::Visible { is_summary: false }).await;

        assert!(output.degraded);
        assert_eq!(output.content, DEGRADED_ANSWER);
        assert_eq!(h.gateway.call_count(), 5);
        assert_eq!(h.tools.calls().len(), 5);
        assert!(validate_sequence(&events).is_ok());
    }

    #[tokio::test]
    async fn test_statement_visibility_emits_only_tool_events() {
        let h = harness(
            vec![
                Reply::tool_call("query_market", json!({"city": "nanning"})),
                Reply::text("Prices are flat."),
            ],
            MockToolExecutor::new(),
        );
        let (output, events) = run(&h, "market_analyst", Visibility::Statement).await;
        assert_eq!(output.content, "Prices are flat.");
        assert_eq!(kinds(&events), vec!["tool_call", "tool_result", "done"]);
    }

    #[tokio::test]
    async fn test_prompt_contains_history_attributes_and_prior_findings() {
        let h = harness(vec![Reply::text("Merged.")], MockToolExecutor::new());
        let mut context = ConversationContext::new(None);
        context.append_exchange("Earlier question", "Earlier answer");
        context.note_attribute("budget", "2000000");
        let prior = vec![RoleOutput {
            role: "financial_advisor".into(),
            name: "Financial Advisor".into(),
            content: "Payment 5300.".into(),
            degraded: false,
        }];
        let (tx, _rx) = mpsc::channel(64);
        let publisher = EventPublisher::new(tx, CancellationToken::new());
        let role = h.catalog.find("purchase_consultant").unwrap();
        h.executor
            .execute(
                RolePass::new(role, "Should I buy?", &context)
                    .with_prior(&prior)
                    .with_instruction(PromptTemplate::synthesis_instruction("Should I buy?"))
                    .with_visibility(Visibility::Visible { is_summary: true }),
                &publisher,
            )
            .await
            .unwrap();

        let request = &h.gateway.requests()[0];
        assert!(request.messages[0].content.contains("- budget: 2000000"));
        assert_eq!(request.messages[1].content, "Earlier question");
        assert_eq!(request.messages[2].content, "Earlier answer");
        let last = request.messages.last().unwrap();
        assert!(last.content.contains("--- Financial Advisor ---"));
        assert!(last.content.contains("Merge the advisors' findings"));
        assert_eq!(request.tools.len(), 14);
    }
}
