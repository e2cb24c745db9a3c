//! Orchestration configuration from TOML (`[orchestration]` section)

use roundtable_application::OrchestrationParams;
use roundtable_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Turn loop limits.
///
/// # Example
///
/// ```toml
/// [orchestration]
/// max_tool_iterations = 5
/// max_discussion_rounds = 3
/// stall_threshold = 0.85
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOrchestrationConfig {
    pub max_tool_iterations: usize,
    pub max_discussion_rounds: u32,
    pub stall_threshold: f64,
    /// Past exchanges included in role prompts.
    pub history_turns: usize,
    pub retry_backoff_ms: u64,
    /// Capacity of the per-turn event channel.
    pub event_buffer: usize,
}

impl Default for FileOrchestrationConfig {
    fn default() -> Self {
        let params = OrchestrationParams::default();
        Self {
            max_tool_iterations: params.max_tool_iterations,
            max_discussion_rounds: params.max_discussion_rounds,
            stall_threshold: params.stall_threshold,
            history_turns: params.history_turns,
            retry_backoff_ms: params.retry_backoff.as_millis() as u64,
            event_buffer: params.event_buffer,
        }
    }
}

impl FileOrchestrationConfig {
    /// Convert to application `OrchestrationParams`.
    ///
    /// Out-of-range values are clamped by the params builders.
    pub fn to_params(&self, temperature: f32) -> OrchestrationParams {
        OrchestrationParams::default()
            .with_max_tool_iterations(self.max_tool_iterations)
            .with_max_discussion_rounds(self.max_discussion_rounds)
            .with_stall_threshold(self.stall_threshold)
            .with_history_turns(self.history_turns)
            .with_retry_backoff(Duration::from_millis(self.retry_backoff_ms))
            .with_event_buffer(self.event_buffer)
            .with_temperature(temperature.clamp(0.0, 2.0))
    }

    pub(super) fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let mut at_least_one = |field: &str, value: usize| {
            if value == 0 {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::OutOfRange,
                    format!("orchestration.{} must be at least 1, using 1", field),
                ));
            }
        };
        at_least_one("max_tool_iterations", self.max_tool_iterations);
        at_least_one("max_discussion_rounds", self.max_discussion_rounds as usize);
        at_least_one("event_buffer", self.event_buffer);

        if !(0.0..=1.0).contains(&self.stall_threshold) {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::OutOfRange,
                format!(
                    "orchestration.stall_threshold {} is outside 0.0..=1.0, clamping",
                    self.stall_threshold
                ),
            ));
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_params() {
        let params = FileOrchestrationConfig::default().to_params(0.7);
        assert_eq!(params, OrchestrationParams::default());
    }

    #[test]
    fn test_deserialize_partial_section() {
        let toml_str = r#"
[orchestration]
max_discussion_rounds = 3
retry_backoff_ms = 0
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        let params = config.orchestration.to_params(0.7);
        assert_eq!(params.max_discussion_rounds, 3);
        assert_eq!(params.retry_backoff, Duration::ZERO);
        assert_eq!(params.max_tool_iterations, 5);
    }

    #[test]
    fn test_out_of_range_is_clamped_and_reported() {
        let config = FileOrchestrationConfig {
            max_tool_iterations: 0,
            stall_threshold: 1.4,
            ..Default::default()
        };
        assert_eq!(config.validate().len(), 2);

        let params = config.to_params(0.7);
        assert_eq!(params.max_tool_iterations, 1);
        assert_eq!(params.stall_threshold, 1.0);
    }
}
