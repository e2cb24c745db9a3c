//! Turn event stream
//!
//! [`TurnEvent`] is the record pushed to clients while a turn runs;
//! [`validate_sequence`] states the ordering guarantees of the stream.

pub mod entities;
pub mod sequence;

pub use entities::{EventKind, StepKind, TurnEvent};
pub use sequence::{SequenceViolation, count, kinds, validate_sequence};
