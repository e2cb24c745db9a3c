//! RunTurn use case: the orchestrator.
//!
//! Processes one user message from intent recognition to the final
//! answer, pushing [`TurnEvent`](roundtable_domain::TurnEvent)s as it goes:
//!
//! ```text
//! conversation ──▶ recognize ──▶ plan ──┬─ sequential roles ──▶ synthesis ─┐
//!                                       └─ discussion rounds ──▶ synthesis ─┤
//!                                                   persist + done ◀────────┘
//! ```
//!
//! Each turn runs as its own task. At most one turn owns a conversation
//! at a time; a second message for a busy conversation is rejected with
//! error 4090 instead of queued.

mod persistence;
mod slots;
mod types;

pub use types::{RunTurnError, TurnHandle, TurnRequest};

use crate::config::OrchestrationParams;
use crate::ports::conversation_logger::{ConversationLogger, NoConversationLogger, TurnLogEntry};
use crate::ports::conversation_store::ConversationStore;
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::tool_executor::ToolExecutorPort;
use crate::ports::tool_schema::ToolSchemaPort;
use crate::use_cases::execute_role::{RoleExecutor, RolePass, Visibility};
use crate::use_cases::plan_execution::ExecutionPlanner;
use crate::use_cases::publisher::EventPublisher;
use crate::use_cases::recognize_intent::IntentRecognizer;
use crate::use_cases::run_discussion::DiscussionCoordinator;
use persistence::PersistenceWriter;
use roundtable_domain::{
    ConversationContext, ConversationId, DomainError, EventKind, ExecutionMode, ExecutionPlan,
    PromptTemplate, Role, RoleCatalog, RoleId, RoleOutput, Speaker, StepKind, conversation_title,
};
use serde_json::json;
use slots::{Acquire, ConversationLease, ConversationSlots};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

/// Longest conversation title, in characters.
const TITLE_MAX_CHARS: usize = 30;

/// Orchestrator for user turns.
///
/// Cheap to clone; clones share the conversation slots and the
/// persistence writer.
#[derive(Clone)]
pub struct RunTurnUseCase {
    gateway: Arc<dyn LlmGateway>,
    tools: Arc<dyn ToolExecutorPort>,
    schema: Arc<dyn ToolSchemaPort>,
    catalog: Arc<RoleCatalog>,
    store: Arc<dyn ConversationStore>,
    logger: Arc<dyn ConversationLogger>,
    params: OrchestrationParams,
    slots: Arc<ConversationSlots>,
    writer: PersistenceWriter,
}

impl RunTurnUseCase {
    /// Create the orchestrator. Must be called inside a Tokio runtime,
    /// since it spawns the persistence writer.
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        tools: Arc<dyn ToolExecutorPort>,
        schema: Arc<dyn ToolSchemaPort>,
        catalog: Arc<RoleCatalog>,
        store: Arc<dyn ConversationStore>,
    ) -> Self {
        let writer = PersistenceWriter::spawn(store.clone());
        Self {
            gateway,
            tools,
            schema,
            catalog,
            store,
            logger: Arc::new(NoConversationLogger),
            params: OrchestrationParams::default(),
            slots: ConversationSlots::new(),
            writer,
        }
    }

    pub fn with_params(mut self, params: OrchestrationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn catalog(&self) -> &RoleCatalog {
        &self.catalog
    }

    /// Start a turn and return its event stream.
    ///
    /// Ownership of an existing conversation is decided here, before the
    /// turn task is spawned, so of two messages for the same conversation
    /// the one started first wins.
    pub fn start(&self, request: TurnRequest) -> TurnHandle {
        let (tx, rx) = mpsc::channel(self.params.event_buffer);
        let cancel = CancellationToken::new();
        let handle = TurnHandle::new(rx, cancel.clone());

        let claim = match &request.conversation_id {
            Some(id) => match self.slots.acquire(id) {
                Acquire::Busy => Claim::Busy(id.clone()),
                Acquire::Leased(lease, context) => Claim::Existing(lease, context),
                Acquire::Vacant(lease) => Claim::Unloaded(lease),
            },
            None => Claim::New,
        };

        let this = self.clone();
        let closed = tx.clone();
        let span = info_span!("turn", session = %request.session_id);
        tokio::spawn(
            async move {
                let publisher = EventPublisher::new(tx, cancel.clone());
                tokio::select! {
                    _ = this.drive(request, claim, publisher) => {}
                    _ = closed.closed() => {
                        debug!("Event receiver dropped, aborting turn");
                        cancel.cancel();
                    }
                }
            }
            .instrument(span),
        );
        handle
    }

    /// Copy of a conversation's context, if no turn currently owns it.
    pub fn conversation(&self, id: &ConversationId) -> Option<ConversationContext> {
        self.slots.snapshot(id)
    }

    /// Wait until queued persistence writes have reached the store.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    // ==================== Turn ====================

    async fn drive(&self, request: TurnRequest, claim: Claim, publisher: EventPublisher) {
        let result = self.run(&request, claim, &publisher).await;
        match result {
            Ok(()) => publisher.finish(None).await,
            Err(e) if e.is_cancelled() => {
                info!("Turn cancelled");
            }
            Err(e) => {
                error!(error = %e, "Turn failed");
                self.logger.log(TurnLogEntry::new(
                    "turn_finished",
                    json!({ "success": false, "error_code": e.error_code().as_u16() }),
                ));
                publisher.finish(Some(e.error_code())).await;
            }
        }
    }

    async fn run(
        &self,
        request: &TurnRequest,
        claim: Claim,
        publisher: &EventPublisher,
    ) -> Result<(), RunTurnError> {
        let token = publisher.token();
        let (lease, mut context) = self.open_conversation(request, claim, publisher).await?;
        let conversation_id = lease.id().clone();

        publisher.emit(EventKind::ThinkingStart).await?;

        for (key, value) in &request.attributes {
            context.note_attribute(key.clone(), value.clone());
        }
        self.writer.append(
            &conversation_id,
            Speaker::User,
            request.message.clone(),
            json!({ "session_id": request.session_id }),
        );
        self.logger.log(TurnLogEntry::new(
            "turn_started",
            json!({
                "conversation_id": conversation_id.as_str(),
                "session_id": request.session_id,
                "mode": request.mode.as_str(),
                "message": request.message,
            }),
        ));

        // Recognize and plan
        let recognizer =
            IntentRecognizer::new(self.gateway.clone(), self.catalog.clone(), self.params.clone());
        let intent = recognizer.recognize(&request.message, token).await?;
        publisher
            .step(
                StepKind::Planning,
                format!("Recognized: {}", self.role_names(&intent.roles)),
                None,
            )
            .await?;

        let planner =
            ExecutionPlanner::new(self.gateway.clone(), self.catalog.clone(), self.params.clone());
        let plan = planner
            .plan(&intent.roles, &request.message, request.mode, token)
            .await?;
        publisher
            .step(
                StepKind::Planning,
                format!(
                    "Plan: {} [{}] ({})",
                    self.role_names(&plan.roles),
                    plan.mode,
                    plan.reason
                ),
                None,
            )
            .await?;
        self.logger.log(TurnLogEntry::new(
            "plan_created",
            json!({
                "roles": plan.roles,
                "mode": plan.mode.as_str(),
                "reason": plan.reason,
            }),
        ));

        // Execute
        let executor = Arc::new(RoleExecutor::new(
            self.gateway.clone(),
            self.tools.clone(),
            self.schema.clone(),
            self.params.clone(),
        ));
        let answer = if plan.mode == ExecutionMode::Discussion && plan.domain_roles().len() >= 2 {
            self.run_discussion(&plan, executor, request, &context, publisher, &conversation_id)
                .await?
        } else {
            if plan.mode == ExecutionMode::Discussion {
                info!("Discussion needs two participants, running sequentially");
            }
            self.run_sequential(&plan, &executor, request, &context, publisher, &conversation_id)
                .await?
        };

        // Commit
        self.writer.append(
            &conversation_id,
            Speaker::Assistant,
            answer.content.clone(),
            json!({
                "role": answer.role,
                "is_summary": plan.synthesized || plan.mode == ExecutionMode::Discussion,
                "degraded": answer.degraded,
                "final": true,
            }),
        );
        context.append_exchange(request.message.clone(), answer.content.clone());
        lease.commit(context);

        self.logger.log(TurnLogEntry::new(
            "turn_finished",
            json!({
                "conversation_id": conversation_id.as_str(),
                "success": true,
                "answer_role": answer.role,
                "answer_chars": answer.content.len(),
            }),
        ));
        info!(conversation = %conversation_id, role = %answer.role, "Turn finished");
        Ok(())
    }

    /// Take ownership of the turn's conversation and load its context.
    async fn open_conversation(
        &self,
        request: &TurnRequest,
        claim: Claim,
        publisher: &EventPublisher,
    ) -> Result<(ConversationLease, ConversationContext), RunTurnError> {
        match claim {
            Claim::Busy(id) => {
                warn!(conversation = %id, "Conversation busy, rejecting message");
                Err(RunTurnError::ConversationBusy(id))
            }
            Claim::Existing(lease, context) => Ok((lease, context)),
            Claim::Unloaded(lease) => {
                let id = lease.id().clone();
                let context = match self.store.load_history(&id).await {
                    Ok(turns) => {
                        debug!(conversation = %id, turns = turns.len(), "Loaded history");
                        ConversationContext::from_history(id, turns)
                    }
                    Err(e) => {
                        debug!(conversation = %id, error = %e, "No stored history");
                        ConversationContext::new(Some(id))
                    }
                };
                Ok((lease, context))
            }
            Claim::New => {
                let title = conversation_title(&request.message, TITLE_MAX_CHARS);
                let (id, allocated) = match self
                    .store
                    .create_conversation(request.user_id.as_deref(), &title)
                    .await
                {
                    Ok(id) => (id, true),
                    Err(e) => {
                        warn!(error = %e, "Failed to create conversation, continuing unsaved");
                        (ConversationId::generate(), false)
                    }
                };
                let lease = match self.slots.acquire(&id) {
                    Acquire::Vacant(lease) | Acquire::Leased(lease, _) => lease,
                    Acquire::Busy => return Err(RunTurnError::ConversationBusy(id)),
                };
                if allocated {
                    publisher
                        .emit(EventKind::ConversationCreated {
                            conversation_id: id.to_string(),
                            title,
                        })
                        .await?;
                }
                Ok((lease, ConversationContext::new(Some(id))))
            }
        }
    }

    async fn run_sequential(
        &self,
        plan: &ExecutionPlan,
        executor: &RoleExecutor,
        request: &TurnRequest,
        context: &ConversationContext,
        publisher: &EventPublisher,
        conversation_id: &ConversationId,
    ) -> Result<RoleOutput, RunTurnError> {
        let mut outputs: Vec<RoleOutput> = Vec::new();

        for id in plan.domain_roles() {
            let role = self.role(id)?;
            publisher
                .step(
                    StepKind::RoleDispatch,
                    format!("{} {} is analyzing", role.icon, role.name),
                    Some(&role.id),
                )
                .await?;
            let output = executor
                .execute(
                    RolePass::new(role, &request.message, context).with_prior(&outputs),
                    publisher,
                )
                .await?;
            publisher
                .step(
                    StepKind::RoleComplete,
                    format!("{} finished", role.name),
                    Some(&role.id),
                )
                .await?;
            self.record_role(conversation_id, &output, !plan.synthesized);
            outputs.push(output);
        }

        let Some(synthesis_id) = plan.synthesis_role() else {
            return outputs
                .pop()
                .ok_or_else(|| DomainError::InvalidCatalog("plan without roles".into()).into());
        };

        let synthesis = self.role(synthesis_id)?;
        publisher
            .step(
                StepKind::Synthesizing,
                format!("{} is merging {} answers", synthesis.name, outputs.len()),
                Some(&synthesis.id),
            )
            .await?;
        let answer = executor
            .execute(
                RolePass::new(synthesis, &request.message, context)
                    .with_prior(&outputs)
                    .with_instruction(PromptTemplate::synthesis_instruction(&request.message))
                    .with_visibility(Visibility::Visible { is_summary: true }),
                publisher,
            )
            .await?;
        self.log_role(&answer);
        Ok(answer)
    }

    async fn run_discussion(
        &self,
        plan: &ExecutionPlan,
        executor: Arc<RoleExecutor>,
        request: &TurnRequest,
        context: &ConversationContext,
        publisher: &EventPublisher,
        conversation_id: &ConversationId,
    ) -> Result<RoleOutput, RunTurnError> {
        let coordinator = DiscussionCoordinator::new(
            self.gateway.clone(),
            executor,
            self.catalog.clone(),
            self.params.clone(),
        );
        let outcome = coordinator
            .run(plan.domain_roles(), &request.message, context, publisher)
            .await?;

        self.writer.append(
            conversation_id,
            Speaker::Assistant,
            outcome.transcript.clone(),
            json!({
                "kind": "discussion_transcript",
                "rounds": outcome.rounds,
                "termination": outcome.reason.as_str(),
            }),
        );
        self.logger.log(TurnLogEntry::new(
            "discussion_terminated",
            json!({
                "reason": outcome.reason.as_str(),
                "rounds": outcome.rounds,
                "participants": plan.domain_roles(),
            }),
        ));
        self.log_role(&outcome.answer);
        Ok(outcome.answer)
    }

    // ==================== Helpers ====================

    /// Persist an intermediate role answer. The last answer of a plan
    /// without synthesis is persisted by the caller as the final one.
    fn record_role(&self, conversation_id: &ConversationId, output: &RoleOutput, is_final: bool) {
        self.log_role(output);
        if is_final {
            return;
        }
        self.writer.append(
            conversation_id,
            Speaker::Assistant,
            output.content.clone(),
            json!({
                "role": output.role,
                "is_summary": false,
                "degraded": output.degraded,
                "final": false,
            }),
        );
    }

    fn log_role(&self, output: &RoleOutput) {
        self.logger.log(TurnLogEntry::new(
            "role_completed",
            json!({
                "role": output.role,
                "degraded": output.degraded,
                "chars": output.content.len(),
            }),
        ));
    }

    fn role(&self, id: &RoleId) -> Result<&Role, RunTurnError> {
        self.catalog
            .get(id)
            .ok_or_else(|| DomainError::UnknownRole(id.to_string()).into())
    }

    fn role_names(&self, ids: &[RoleId]) -> String {
        ids.iter()
            .map(|id| {
                self.catalog
                    .get(id)
                    .map(|r| r.name.clone())
                    .unwrap_or_else(|| id.to_string())
            })
            .collect::<Vec<_>>()
            .join(" → ")
    }
}

/// Ownership decided when the turn was started.
enum Claim {
    Busy(ConversationId),
    Existing(ConversationLease, ConversationContext),
    Unloaded(ConversationLease),
    New,
}

#[cfg(test)]
mod tests;
