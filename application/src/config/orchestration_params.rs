//! Orchestration parameters: turn loop control.
//!
//! [`OrchestrationParams`] groups the static parameters that bound the
//! work done in one turn: tool loop iterations, discussion rounds, stall
//! detection, history window, retry backoff and event buffering.
//! These are application-layer concerns, not domain policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Turn loop control parameters.
///
/// | Parameter | Used by |
/// |-----------|---------|
/// | `max_tool_iterations` | RoleExecutor |
/// | `max_discussion_rounds`, `stall_threshold` | DiscussionCoordinator |
/// | `history_turns` | RoleExecutor |
/// | `retry_backoff` | every model call |
/// | `event_buffer` | RunTurnUseCase |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationParams {
    /// Maximum model calls in one role's tool loop.
    pub max_tool_iterations: usize,
    /// Maximum discussion rounds before forced synthesis.
    pub max_discussion_rounds: u32,
    /// Word-overlap ratio at which two statements count as repeats.
    pub stall_threshold: f64,
    /// Number of past exchanges included in role prompts.
    pub history_turns: usize,
    /// Delay before retrying a transient model failure.
    pub retry_backoff: Duration,
    /// Capacity of the per-turn event channel.
    pub event_buffer: usize,
    /// Sampling temperature for role passes.
    pub temperature: f32,
    /// Sampling temperature for classification, ordering and consensus calls.
    pub routing_temperature: f32,
}

impl Default for OrchestrationParams {
    fn default() -> Self {
        Self {
            max_tool_iterations: 5,
            max_discussion_rounds: 5,
            stall_threshold: 0.85,
            history_turns: 5,
            retry_backoff: Duration::from_millis(500),
            event_buffer: 64,
            temperature: 0.7,
            routing_temperature: 0.1,
        }
    }
}

impl OrchestrationParams {
    // ==================== Builder Methods ====================

    pub fn with_max_tool_iterations(mut self, max: usize) -> Self {
        self.max_tool_iterations = max.max(1);
        self
    }

    pub fn with_max_discussion_rounds(mut self, max: u32) -> Self {
        self.max_discussion_rounds = max.max(1);
        self
    }

    pub fn with_stall_threshold(mut self, threshold: f64) -> Self {
        self.stall_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_history_turns(mut self, turns: usize) -> Self {
        self.history_turns = turns;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn with_event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity.max(1);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}
