//! Intent recognition use case.
//!
//! Keyword routing first; only when no keyword matches is the model asked
//! to pick roles. The result is never empty: every failure path ends at
//! the catalog's default role.

use crate::config::OrchestrationParams;
use crate::ports::llm_gateway::{ChatRequest, LlmGateway};
use crate::use_cases::run_turn::RunTurnError;
use crate::use_cases::shared::chat_or_fallback;
use roundtable_domain::{
    Message, PromptTemplate, RoleCatalog, RoleId, match_keywords, parse_role_selection,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How the roles of a turn were chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionSource {
    Keywords,
    Classifier,
    Default,
}

/// Result of intent recognition: at least one role id.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedIntent {
    pub roles: Vec<RoleId>,
    pub source: RecognitionSource,
}

pub struct IntentRecognizer {
    gateway: Arc<dyn LlmGateway>,
    catalog: Arc<RoleCatalog>,
    params: OrchestrationParams,
}

impl IntentRecognizer {
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

    /// Map an utterance to one or more role ids.
    pub async fn recognize(
        &self,
        utterance: &str,
        token: &CancellationToken,
    ) -> Result<RecognizedIntent, RunTurnError> {
        let matched = match_keywords(utterance, &self.catalog);
        if !matched.is_empty() {
            debug!(roles = ?matched, "Roles matched by keyword");
            return Ok(RecognizedIntent {
                roles: matched,
                source: RecognitionSource::Keywords,
            });
        }

        let classified = self.classify_with_llm(utterance, token).await?;
        if !classified.is_empty() {
            info!(roles = ?classified, "Roles selected by classifier");
            return Ok(RecognizedIntent {
                roles: classified,
                source: RecognitionSource::Classifier,
            });
        }

        let fallback = self.catalog.default_role().clone();
        debug!(role = %fallback, "No role recognized, using default");
        Ok(RecognizedIntent {
            roles: vec![fallback],
            source: RecognitionSource::Default,
        })
    }

    /// Ask the model which roles apply. Empty on any failure.
    async fn classify_with_llm(
        &self,
        utterance: &str,
        token: &CancellationToken,
    ) -> Result<Vec<RoleId>, RunTurnError> {
        if utterance.trim().is_empty() {
            return Ok(Vec::new());
        }

        let request = ChatRequest::new(vec![
            Message::system(PromptTemplate::classify_system()),
            Message::user(PromptTemplate::classify_user(utterance, &self.catalog)),
        ])
        .with_temperature(self.params.routing_temperature);

        match chat_or_fallback(
            self.gateway.as_ref(),
            request,
            self.params.retry_backoff,
            token,
        )
        .await?
        {
            Ok(response) => {
                let roles = parse_role_selection(&response.text_content(), &self.catalog);
                if roles.is_empty() {
                    warn!("Classifier reply named no known role");
                }
                Ok(roles)
            }
            Err(e) => {
                warn!(error = %e, "Classifier call failed, using default role");
                Ok(Vec::new())
            }
        }
    }
}
