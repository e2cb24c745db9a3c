//! Application-level configuration.
//!
//! - [`OrchestrationParams`]: turn loop control (loop limits and retries)

pub mod orchestration_params;

pub use orchestration_params::OrchestrationParams;
