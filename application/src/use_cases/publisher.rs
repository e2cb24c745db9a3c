//! Event publisher for one turn.
//!
//! Orchestration code pushes typed [`EventKind`]s through an
//! [`EventPublisher`]; a separate delivery task drains the receiving end
//! of the channel to whatever transport the client uses.
//!
//! The publisher is the only place that can end a stream. [`finish`]
//! consumes it, so `done` can be sent at most once, and it is skipped
//! entirely when the turn was cancelled.
//!
//! [`finish`]: EventPublisher::finish

use crate::use_cases::run_turn::RunTurnError;
use roundtable_domain::{ErrorCode, EventKind, RoleId, StepKind, TurnEvent};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct EventPublisher {
    tx: mpsc::Sender<TurnEvent>,
    cancel: CancellationToken,
}

impl EventPublisher {
    pub fn new(tx: mpsc::Sender<TurnEvent>, cancel: CancellationToken) -> Self {
        Self { tx, cancel }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Push one event.
    ///
    /// Fails with `Cancelled` once the turn is cancelled. A closed
    /// receiver cancels the turn.
    pub async fn emit(&self, kind: EventKind) -> Result<(), RunTurnError> {
        if self.cancel.is_cancelled() {
            return Err(RunTurnError::Cancelled);
        }
        let event = TurnEvent::now(kind);
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(RunTurnError::Cancelled),
            sent = self.tx.send(event) => match sent {
                Ok(()) => Ok(()),
                Err(_) => {
                    debug!("Event receiver dropped, cancelling turn");
                    self.cancel.cancel();
                    Err(RunTurnError::Cancelled)
                }
            },
        }
    }

    /// Push a `thinking_step`.
    pub async fn step(
        &self,
        step_type: StepKind,
        content: impl Into<String>,
        role: Option<&RoleId>,
    ) -> Result<(), RunTurnError> {
        self.emit(EventKind::ThinkingStep {
            step_type,
            content: content.into(),
            role: role.map(|r| r.to_string()),
        })
        .await
    }

    /// End the stream: an optional `error`, then `done`.
    ///
    /// Does nothing when the turn was cancelled.
    pub async fn finish(self, error: Option<ErrorCode>) {
        if let Some(code) = error {
            let sent = self
                .emit(EventKind::Error {
                    code,
                    message: code.user_message().to_string(),
                })
                .await;
            if sent.is_err() {
                return;
            }
        }
        let _ = self.emit(EventKind::Done).await;
    }
}
