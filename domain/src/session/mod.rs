//! Model conversation types
//!
//! - [`entities::Message`]: a chat message (system, user, assistant, tool)
//! - [`response::LlmResponse`]: text and tool calls returned by the model
//! - [`stream::StreamEvent`]: incremental response events

pub mod entities;
pub mod response;
pub mod stream;
