//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod execute_role;
pub mod plan_execution;
pub mod publisher;
pub mod recognize_intent;
pub mod run_discussion;
pub mod run_turn;
pub(crate) mod shared;

#[cfg(test)]
pub(crate) mod test_support;
