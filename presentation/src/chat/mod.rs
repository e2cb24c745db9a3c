//! Terminal turn loop
//!
//! [`run_turn`] prints one turn; [`ChatRepl`] keeps a conversation going
//! over stdin lines.

mod repl;
mod turn;

pub use repl::ChatRepl;
pub use turn::{TurnSettings, run_turn};
