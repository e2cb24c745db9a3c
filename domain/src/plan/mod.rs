//! Execution planning domain module
//!
//! - [`ExecutionPlan`]: ordered roles, mode and rationale for one turn
//! - [`ExecutionMode`] / [`TurnMode`]: plan mode and the caller's flag
//! - [`parse_ordering`] / [`assemble_plan`]: pure planning rules

pub mod entities;
pub mod parsing;

pub use entities::{ExecutionMode, ExecutionPlan, TurnMode};
pub use parsing::{ProposedOrder, assemble_plan, parse_ordering};
