//! OpenAI-compatible chat completion adapter
//!
//! - [`gateway`]: HTTP client implementing the `LlmGateway` port
//! - [`protocol`]: request/response wire types and stream folding

mod gateway;
mod protocol;

pub use gateway::OpenAiGateway;
