//! Execution planning use case.
//!
//! One role gives a trivial plan. Several roles are ordered by one model
//! call; if that call fails or its reply is unusable the roles keep
//! catalog-declaration order and the plan says why.

use crate::config::OrchestrationParams;
use crate::ports::llm_gateway::{ChatRequest, LlmGateway};
use crate::use_cases::run_turn::RunTurnError;
use crate::use_cases::shared::chat_or_fallback;
use roundtable_domain::{
    ExecutionMode, ExecutionPlan, Message, PromptTemplate, Role, RoleCatalog, RoleId, TurnMode,
    assemble_plan, parse_ordering,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub struct ExecutionPlanner {
    gateway: Arc<dyn LlmGateway>,
    catalog: Arc<RoleCatalog>,
    params: OrchestrationParams,
}

impl ExecutionPlanner {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        catalog: Arc<RoleCatalog>,
        params: OrchestrationParams,
    ) -> Self {
        Self {
            gateway,
            catalog,
            params,
        }
    }

    /// Build the plan for recognized roles.
    ///
    /// The mode comes from the caller's flag; the planner never picks it.
    pub async fn plan(
        &self,
        recognized: &[RoleId],
        utterance: &str,
        mode: TurnMode,
        token: &CancellationToken,
    ) -> Result<ExecutionPlan, RunTurnError> {
        let candidates = self.catalog.in_declaration_order(recognized);

        let domain: Vec<RoleId> = candidates
            .iter()
            .filter(|r| !self.catalog.is_synthesis(r))
            .cloned()
            .collect();

        match candidates.len() {
            0 => {
                return Ok(ExecutionPlan::single(
                    self.catalog.default_role().clone(),
                    ExecutionMode::Sequential,
                ));
            }
            1 => {
                return Ok(ExecutionPlan::single(
                    candidates[0].clone(),
                    ExecutionMode::Sequential,
                ));
            }
            _ => {}
        }

        if domain.len() <= 1 {
            // Nothing to order: one specialist plus the synthesis role
            return Ok(assemble_plan(
                candidates,
                &self.catalog,
                mode.execution_mode(),
                "single specialist with synthesis",
            ));
        }

        let roles: Vec<&Role> = domain.iter().filter_map(|id| self.catalog.get(id)).collect();
        let request = ChatRequest::new(vec![
            Message::system(PromptTemplate::plan_system()),
            Message::user(PromptTemplate::plan_user(utterance, &roles)),
        ])
        .with_temperature(self.params.routing_temperature);

        let reply = chat_or_fallback(
            self.gateway.as_ref(),
            request,
            self.params.retry_backoff,
            token,
        )
        .await?;

        let plan = match reply {
            Ok(response) => match parse_ordering(&response.text_content(), &domain) {
                Some(order) => {
                    let reason = order
                        .reason
                        .filter(|r| !r.trim().is_empty())
                        .unwrap_or_else(|| "ordered by planner".to_string());
                    assemble_plan(order.roles, &self.catalog, mode.execution_mode(), reason)
                }
                None => {
                    warn!("Planner reply unusable, keeping declaration order");
                    self.fallback(domain, "planner reply unusable; declaration order")
                }
            },
            Err(e) => {
                warn!(error = %e, "Planner call failed, keeping declaration order");
                self.fallback(domain, format!("planning failed ({}); declaration order", e))
            }
        };

        debug!(roles = ?plan.roles, mode = %plan.mode, reason = %plan.reason, "Plan created");
        Ok(plan)
    }

    fn fallback(&self, domain: Vec<RoleId>, reason: impl Into<String>) -> ExecutionPlan {
        assemble_plan(domain, &self.catalog, ExecutionMode::Sequential, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm_gateway::GatewayError;
    use crate::use_cases::test_support::{Reply, ScriptedGateway};
    use roundtable_domain::role::{
        FINANCIAL_ADVISOR, MARKET_ANALYST, POLICY_EXPERT, PURCHASE_CONSULTANT,
    };

    fn planner(gateway: Arc<ScriptedGateway>) -> ExecutionPlanner {
        ExecutionPlanner::new(
            gateway,
            Arc::new(RoleCatalog::home_purchase().unwrap()),
            OrchestrationParams::default().with_retry_backoff(std::time::Duration::ZERO),
        )
    }

    fn ids(raw: &[&str]) -> Vec<RoleId> {
        raw.iter().map(|s| RoleId::from(*s)).collect()
    }

    #[tokio::test]
    async fn test_single_role_plan_needs_no_model_call() {
        let gateway = Arc::new(ScriptedGateway::new(vec![]));
        let plan = planner(gateway.clone())
            .plan(&ids(&[FINANCIAL_ADVISOR]), "loan?", TurnMode::Discussion, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(plan.roles, ids(&[FINANCIAL_ADVISOR]));
        assert_eq!(plan.mode, ExecutionMode::Sequential);
        assert_eq!(plan.reason, "single domain");
        assert!(!plan.synthesized);
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_planner_order_with_synthesis_appended() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Reply::text(
            r#"{"order": ["policy_expert", "financial_advisor"], "reason": "eligibility first"}"#,
        )]));
        let plan = planner(gateway.clone())
            .plan(
                &ids(&[FINANCIAL_ADVISOR, POLICY_EXPERT]),
                "mortgage policy?",
                TurnMode::Standard,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(
            plan.roles,
            ids(&[POLICY_EXPERT, FINANCIAL_ADVISOR, PURCHASE_CONSULTANT])
        );
        assert_eq!(plan.reason, "eligibility first");
        assert!(plan.synthesized);
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn test_discussion_flag_passes_through() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Reply::text(
            r#"["market_analyst", "financial_advisor"]"#,
        )]));
        let plan = planner(gateway)
            .plan(
                &ids(&[FINANCIAL_ADVISOR, MARKET_ANALYST]),
                "buy now?",
                TurnMode::Discussion,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(plan.mode, ExecutionMode::Discussion);
        assert_eq!(plan.domain_roles(), ids(&[MARKET_ANALYST, FINANCIAL_ADVISOR]).as_slice());
    }

    #[tokio::test]
    async fn test_planner_failure_falls_back_to_declaration_order() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Reply::error(GatewayError::Unknown(
            "boom".into(),
        ))]));
        let plan = planner(gateway)
            .plan(
                &ids(&[MARKET_ANALYST, FINANCIAL_ADVISOR]),
                "buy now?",
                TurnMode::Discussion,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(
            plan.roles,
            ids(&[FINANCIAL_ADVISOR, MARKET_ANALYST, PURCHASE_CONSULTANT])
        );
        assert_eq!(plan.mode, ExecutionMode::Sequential);
        assert!(plan.reason.contains("planning failed"));
    }

    #[tokio::test]
    async fn test_unusable_reply_falls_back() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Reply::text("no idea")]));
        let plan = planner(gateway)
            .plan(
                &ids(&[FINANCIAL_ADVISOR, POLICY_EXPERT]),
                "q",
                TurnMode::Standard,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(
            plan.roles,
            ids(&[FINANCIAL_ADVISOR, POLICY_EXPERT, PURCHASE_CONSULTANT])
        );
        assert!(plan.reason.contains("unusable"));
    }

    #[tokio::test]
    async fn test_recognized_synthesis_role_moves_last_without_model_call() {
        let gateway = Arc::new(ScriptedGateway::new(vec![]));
        let plan = planner(gateway.clone())
            .plan(
                &ids(&[PURCHASE_CONSULTANT, FINANCIAL_ADVISOR]),
                "should i buy with this loan?",
                TurnMode::Standard,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(plan.roles, ids(&[FINANCIAL_ADVISOR, PURCHASE_CONSULTANT]));
        assert!(plan.synthesized);
        assert_eq!(gateway.call_count(), 0);
    }
}
