//! Presentation layer for roundtable
//!
//! This crate contains CLI definitions, turn event formatters
//! (console, JSON lines, server-sent events), and the interactive chat loop.

pub mod chat;
pub mod cli;
pub mod output;

// Re-export commonly used types
pub use chat::{ChatRepl, TurnSettings, run_turn};
pub use cli::commands::{Cli, ModeArg, OutputFormat};
pub use output::{
    TurnSummary, console::ConsoleFormatter, deliver, formatter::EventFormatter, formatter_for,
    wire::{JsonlFormatter, SseFormatter},
};
