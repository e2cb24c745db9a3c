//! Domain error types and the stable error codes shown to users.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Invalid role catalog: {0}")]
    InvalidCatalog(String),

    #[error("Discussion already terminated")]
    DiscussionTerminated,

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}

/// Stable, user-facing error code carried by `error` events.
///
/// The numeric value and the short message are the only things a client
/// ever sees about a failure; internal details stay in the logs.
///
/// | Code | Meaning |
/// |------|---------|
/// | 1001 | Model transport timed out |
/// | 1002 | Model transport rejected credentials |
/// | 1003 | Model transport rate limited |
/// | 1099 | Model transport failed for another reason |
/// | 4090 | Conversation already has a turn in flight |
/// | 5000 | Internal error |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum ErrorCode {
    TransportTimeout,
    TransportAuth,
    TransportRateLimited,
    TransportUnknown,
    ConversationBusy,
    Internal,
}

impl ErrorCode {
    pub fn as_u16(&self) -> u16 {
        match self {
            ErrorCode::TransportTimeout => 1001,
            ErrorCode::TransportAuth => 1002,
            ErrorCode::TransportRateLimited => 1003,
            ErrorCode::TransportUnknown => 1099,
            ErrorCode::ConversationBusy => 4090,
            ErrorCode::Internal => 5000,
        }
    }

    /// Short human-readable text safe to show to end users.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorCode::TransportTimeout => "The model service timed out, please retry.",
            ErrorCode::TransportAuth => "The model service rejected our credentials.",
            ErrorCode::TransportRateLimited => "The model service is busy, please retry shortly.",
            ErrorCode::TransportUnknown => "The model service is temporarily unavailable.",
            ErrorCode::ConversationBusy => {
                "This conversation is still answering a previous message."
            }
            ErrorCode::Internal => "Something went wrong while answering.",
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.as_u16()
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1001 => Ok(ErrorCode::TransportTimeout),
            1002 => Ok(ErrorCode::TransportAuth),
            1003 => Ok(ErrorCode::TransportRateLimited),
            1099 => Ok(ErrorCode::TransportUnknown),
            4090 => Ok(ErrorCode::ConversationBusy),
            5000 => Ok(ErrorCode::Internal),
            other => Err(format!("unknown error code {}", other)),
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}
