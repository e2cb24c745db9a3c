//! Line-based interactive chat
//!
//! Reads one message per stdin line and answers it inside a single
//! conversation. Lines starting with `/` are commands.

use super::turn::{TurnSettings, run_turn};
use crate::cli::commands::OutputFormat;
use colored::Colorize;
use roundtable_application::RunTurnUseCase;
use roundtable_domain::TurnMode;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

/// A parsed slash command.
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Quit,
    Help,
    Mode(TurnMode),
    New,
    Roles,
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        let mut parts = line.split_whitespace();
        let head = parts.next().unwrap_or_default();
        match head {
            "/quit" | "/exit" | "/q" => Command::Quit,
            "/help" | "/h" | "/?" => Command::Help,
            "/new" => Command::New,
            "/roles" => Command::Roles,
            "/mode" => match parts.next().map(str::parse::<TurnMode>) {
                Some(Ok(mode)) => Command::Mode(mode),
                _ => Command::Unknown(line.to_string()),
            },
            _ => Command::Unknown(line.to_string()),
        }
    }
}

/// Interactive chat REPL
pub struct ChatRepl {
    use_case: Arc<RunTurnUseCase>,
    settings: TurnSettings,
}

impl ChatRepl {
    pub fn new(use_case: Arc<RunTurnUseCase>, settings: TurnSettings) -> Self {
        Self { use_case, settings }
    }

    fn console(&self) -> bool {
        self.settings.format == OutputFormat::Console
    }

    /// Run until EOF, `/quit`, or Ctrl-C at the prompt.
    pub async fn run(&mut self) -> io::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        if self.console() {
            self.print_welcome();
        }

        loop {
            if self.console() {
                print!("{} ", ">>>".cyan().bold());
                io::stdout().flush()?;
            }

            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = tokio::signal::ctrl_c() => None,
            };
            let Some(line) = line else {
                if self.console() {
                    println!("\nBye!");
                }
                break;
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if line.starts_with('/') {
                if self.handle_command(Command::parse(line)) {
                    break;
                }
                continue;
            }

            match run_turn(&self.use_case, &self.settings, line).await {
                Ok(summary) => self.settings.adopt(&summary),
                Err(e) => {
                    warn!(error = %e, "Failed to write turn output");
                    return Err(e);
                }
            }
            if self.console() {
                println!();
            }
        }

        self.use_case.flush().await;
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│          roundtable - Chat Mode             │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("Mode: {}", self.settings.mode.as_str());
        if let Some(id) = &self.settings.conversation_id {
            println!("Conversation: {}", id);
        }
        println!();
        Self::print_help();
    }

    fn print_help() {
        println!("Commands:");
        println!("  /help, /h, /?            - Show this help");
        println!("  /mode standard|discussion - Switch orchestration mode");
        println!("  /new                     - Start a new conversation");
        println!("  /roles                   - List available roles");
        println!("  /quit, /exit, /q         - Exit chat");
        println!();
    }

    /// Handle slash commands. Returns true if should exit.
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Quit => {
                if self.console() {
                    println!("Bye!");
                }
                true
            }
            Command::Help => {
                Self::print_help();
                false
            }
            Command::Mode(mode) => {
                self.settings.mode = mode;
                eprintln!("Mode set to {}", mode.as_str());
                false
            }
            Command::New => {
                self.settings.conversation_id = None;
                eprintln!("Started a new conversation");
                false
            }
            Command::Roles => {
                for role in self.use_case.catalog().iter() {
                    eprintln!("  {} {} ({})", role.icon, role.name, role.id);
                }
                false
            }
            Command::Unknown(raw) => {
                eprintln!("Unknown command: {}", raw);
                eprintln!("Type /help for available commands");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("/q"), Command::Quit);
        assert_eq!(Command::parse("/help"), Command::Help);
        assert_eq!(Command::parse("/new"), Command::New);
        assert_eq!(
            Command::parse("/mode discussion"),
            Command::Mode(TurnMode::Discussion)
        );
        assert_eq!(
            Command::parse("/mode debate"),
            Command::Unknown("/mode debate".to_string())
        );
        assert_eq!(Command::parse("/mode"), Command::Unknown("/mode".to_string()));
        assert!(matches!(Command::parse("/nope"), Command::Unknown(_)));
    }
}
