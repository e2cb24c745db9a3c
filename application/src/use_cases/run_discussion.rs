//! Discussion coordinator.
//!
//! Runs the multi-round negotiation between the plan's domain roles and
//! closes it with one synthesis pass:
//!
//! 1. every participant, in plan order, states its position given the
//!    transcript of all previous rounds
//! 2. after each full round the round limit, the consensus question and
//!    the stall detector are checked, in that order
//! 3. the synthesis role reads the whole transcript and answers the user

use crate::config::OrchestrationParams;
use crate::ports::llm_gateway::{ChatRequest, LlmGateway};
use crate::use_cases::execute_role::{RoleExecutor, RolePass, Visibility};
use crate::use_cases::publisher::EventPublisher;
use crate::use_cases::run_turn::RunTurnError;
use crate::use_cases::shared::chat_or_fallback;
use roundtable_domain::{
    ConversationContext, DiscussionState, DomainError, EventKind, Message, PromptTemplate, Role,
    RoleCatalog, RoleId, RoleOutput, StepKind, TerminationReason, parse_consensus_answer,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How a discussion ended and what it produced.
#[derive(Debug, Clone)]
pub struct DiscussionOutcome {
    pub reason: TerminationReason,
    pub rounds: u32,
    pub transcript: String,
    /// The synthesis answer, the turn's primary answer
    pub answer: RoleOutput,
}

pub struct DiscussionCoordinator {
    gateway: Arc<dyn LlmGateway>,
    executor: Arc<RoleExecutor>,
    catalog: Arc<RoleCatalog>,
    params: OrchestrationParams,
}

impl DiscussionCoordinator {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        executor: Arc<RoleExecutor>,
        catalog: Arc<RoleCatalog>,
        params: OrchestrationParams,
    ) -> Self {
        Self {
            gateway,
            executor,
            catalog,
            params,
        }
    }

    /// Run the discussion among `participants` and synthesize the answer.
    pub async fn run(
        &self,
        participants: &[RoleId],
        utterance: &str,
        context: &ConversationContext,
        publisher: &EventPublisher,
    ) -> Result<DiscussionOutcome, RunTurnError> {
        let roles = self.resolve(participants)?;
        let synthesis = self.role(self.catalog.synthesis_role())?;
        let mut state = DiscussionState::new(
            roles.iter().map(|r| r.id.clone()).collect(),
            self.params.max_discussion_rounds,
        );

        let reason = loop {
            let round = state.begin_round()?;
            publisher
                .step(
                    StepKind::DiscussionRound,
                    format!("Discussion round {} of {}", round, state.max_rounds()),
                    None,
                )
                .await?;

            let transcript = state.render_transcript();
            for role in &roles {
                let statement = self
                    .executor
                    .execute(
                        RolePass::new(role, utterance, context)
                            .with_instruction(PromptTemplate::discussion_statement(
                                utterance,
                                round,
                                &transcript,
                            ))
                            .with_visibility(Visibility::Statement),
                        publisher,
                    )
                    .await?;

                publisher
                    .emit(EventKind::Discussion {
                        from: role.id.to_string(),
                        name: role.name.clone(),
                        round,
                        content: statement.content.clone(),
                    })
                    .await?;
                state.record(role.id.clone(), role.name.clone(), statement.content);
            }

            if let Some(reason) = self.check_termination(&state, synthesis, utterance, publisher).await? {
                break state.terminate(reason);
            }
            debug!(round, "Discussion continues");
        };

        let rounds = state.round();
        info!(rounds, reason = %reason, "Discussion terminated");

        let transcript = state.render_transcript();
        publisher
            .step(
                StepKind::Synthesizing,
                format!("{} is writing the final answer ({})", synthesis.name, reason),
                Some(&synthesis.id),
            )
            .await?;
        let answer = self
            .executor
            .execute(
                RolePass::new(synthesis, utterance, context)
                    .with_instruction(PromptTemplate::discussion_synthesis(
                        utterance,
                        &transcript,
                        reason.as_str(),
                    ))
                    .with_visibility(Visibility::Visible { is_summary: true }),
                publisher,
            )
            .await?;

        Ok(DiscussionOutcome {
            reason,
            rounds,
            transcript,
            answer,
        })
    }

    /// Round limit, then consensus, then stall. `None` means keep going.
    async fn check_termination(
        &self,
        state: &DiscussionState,
        synthesis: &Role,
        utterance: &str,
        publisher: &EventPublisher,
    ) -> Result<Option<TerminationReason>, RunTurnError> {
        if state.at_max_rounds() {
            return Ok(Some(TerminationReason::MaxRounds));
        }
        if self.ask_consensus(state, synthesis, utterance, publisher).await? {
            return Ok(Some(TerminationReason::Consensus));
        }
        if state.is_stalled(self.params.stall_threshold) {
            return Ok(Some(TerminationReason::Stalled));
        }
        Ok(None)
    }

    /// Ask the synthesis role whether the panel can conclude.
    async fn ask_consensus(
        &self,
        state: &DiscussionState,
        synthesis: &Role,
        utterance: &str,
        publisher: &EventPublisher,
    ) -> Result<bool, RunTurnError> {
        let request = ChatRequest::new(vec![
            Message::system(synthesis.prompt.clone()),
            Message::user(PromptTemplate::consensus_question(
                utterance,
                &state.render_transcript(),
            )),
        ])
        .with_temperature(self.params.routing_temperature);

        match chat_or_fallback(
            self.gateway.as_ref(),
            request,
            self.params.retry_backoff,
            publisher.token(),
        )
        .await?
        {
            Ok(response) => Ok(parse_consensus_answer(&response.text_content())),
            Err(e) => {
                warn!(error = %e, "Consensus check failed, continuing discussion");
                Ok(false)
            }
        }
    }

    fn resolve(&self, ids: &[RoleId]) -> Result<Vec<&Role>, RunTurnError> {
        ids.iter().map(|id| self.role(id)).collect()
    }

    fn role(&self, id: &RoleId) -> Result<&Role, RunTurnError> {
        self.catalog
            .get(id)
            .ok_or_else(|| DomainError::UnknownRole(id.to_string()).into())
    }
}
