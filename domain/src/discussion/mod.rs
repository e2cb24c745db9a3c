//! Discussion domain module
//!
//! State and rules of the multi-round negotiation between roles:
//!
//! ```text
//! Init ──▶ Round(1) ──▶ check ──▶ Round(2) ──▶ ... ──▶ Synthesis
//!                         │                      │
//!                         └── max_rounds / consensus / stalled
//! ```
//!
//! The check after every full round tries, in order, the round limit,
//! the consensus answer and the stall detector; the first that fires is
//! recorded as the single [`TerminationReason`].

pub mod parsing;
pub mod similarity;
pub mod state;

pub use parsing::parse_consensus_answer;
pub use similarity::jaccard_similarity;
pub use state::{DiscussionState, Statement, TerminationReason};
