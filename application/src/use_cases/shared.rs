//! Shared utilities for use cases.
//!
//! Cancellation checks, cancellable awaits and the retry-once policy for
//! model calls, used by every stage of a turn.

use crate::ports::llm_gateway::{ChatRequest, GatewayError, LlmGateway, StreamHandle};
use crate::use_cases::run_turn::RunTurnError;
use roundtable_domain::LlmResponse;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Check if cancellation has been requested.
pub(crate) fn check_cancelled(token: &CancellationToken) -> Result<(), RunTurnError> {
    if token.is_cancelled() {
        return Err(RunTurnError::Cancelled);
    }
    Ok(())
}

/// Await `future` unless the token fires first.
///
/// When the token wins, `future` is dropped, which aborts the pending
/// model or tool call.
pub(crate) async fn cancellable<F: Future>(
    token: &CancellationToken,
    future: F,
) -> Result<F::Output, RunTurnError> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(RunTurnError::Cancelled),
        output = future => Ok(output),
    }
}

/// Send a chat request, retrying once after `backoff` on a transient error.
pub(crate) async fn chat_with_retry(
    gateway: &dyn LlmGateway,
    request: ChatRequest,
    backoff: Duration,
    token: &CancellationToken,
) -> Result<LlmResponse, RunTurnError> {
    check_cancelled(token)?;
    match cancellable(token, gateway.chat(request.clone())).await? {
        Ok(response) => Ok(response),
        Err(e) if e.is_transient() => {
            warn!(error = %e, "Transient model failure, retrying once");
            cancellable(token, tokio::time::sleep(backoff)).await?;
            Ok(cancellable(token, gateway.chat(request)).await??)
        }
        Err(e) => Err(e.into()),
    }
}

/// Open a streaming chat request, retrying once on a transient error.
///
/// Only opening the stream is retried. A stream that fails after deltas
/// were delivered cannot be replayed.
pub(crate) async fn open_stream_with_retry(
    gateway: &dyn LlmGateway,
    request: ChatRequest,
    backoff: Duration,
    token: &CancellationToken,
) -> Result<StreamHandle, RunTurnError> {
    check_cancelled(token)?;
    match cancellable(token, gateway.chat_stream(request.clone())).await? {
        Ok(handle) => Ok(handle),
        Err(e) if e.is_transient() => {
            warn!(error = %e, "Transient model failure, retrying once");
            cancellable(token, tokio::time::sleep(backoff)).await?;
            Ok(cancellable(token, gateway.chat_stream(request)).await??)
        }
        Err(e) => Err(e.into()),
    }
}

/// Like [`chat_with_retry`], but hands transport failures back to the
/// caller as the inner `Err` instead of ending the turn. Cancellation
/// still propagates through the outer `Err`.
pub(crate) async fn chat_or_fallback(
    gateway: &dyn LlmGateway,
    request: ChatRequest,
    backoff: Duration,
    token: &CancellationToken,
) -> Result<Result<LlmResponse, GatewayError>, RunTurnError> {
    match chat_with_retry(gateway, request, backoff, token).await {
        Ok(response) => Ok(Ok(response)),
        Err(RunTurnError::GatewayError(e)) => Ok(Err(e)),
        Err(e) => Err(e),
    }
}
