//! CLI command definitions

use clap::{Parser, ValueEnum};
use roundtable_domain::TurnMode;
use std::path::PathBuf;

/// How turn events are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, colored, with streamed answer text
    Console,
    /// One JSON event per line
    Jsonl,
    /// Server-sent events (`event:` / `data:` frames)
    Sse,
}

/// Orchestration mode for a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Specialists answer in turn, then a synthesis
    Standard,
    /// Specialists debate over several rounds before the synthesis
    Discussion,
}

impl From<ModeArg> for TurnMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Standard => TurnMode::Standard,
            ModeArg::Discussion => TurnMode::Discussion,
        }
    }
}

/// CLI arguments for roundtable
#[derive(Parser, Debug)]
#[command(name = "roundtable")]
#[command(author, version, about = "Home-purchase advisory roundtable - specialist roles answer together")]
#[command(long_about = r#"
roundtable routes each message to one or more specialist roles (financial
advisor, policy expert, market analyst, purchase consultant). Roles call
calculators and lookup tools, optionally discuss with each other, and a
synthesis role merges their answers.

Configuration files are loaded from (in priority order):
1. ROUNDTABLE_* environment variables
2. --config <path>          Explicit config file
3. ./roundtable.toml        Project-level config
4. ~/.config/roundtable/config.toml   Global config

Example:
  roundtable "How much is the monthly payment on a 1M loan over 30 years?"
  roundtable --mode discussion "Should I buy in Qingxiu now or wait?"
  roundtable -i --format jsonl --user u-42
"#)]
pub struct Cli {
    /// The message to send (omit with --interactive)
    pub message: Option<String>,

    /// Orchestration mode
    #[arg(long, value_enum, default_value = "standard")]
    pub mode: ModeArg,

    /// Session identifier attached to every turn
    #[arg(long, value_name = "ID", default_value = "cli")]
    pub session: String,

    /// Continue an existing conversation
    #[arg(long, value_name = "ID")]
    pub conversation: Option<String>,

    /// User the conversation belongs to
    #[arg(long, value_name = "ID")]
    pub user: Option<String>,

    /// Extra request attribute (can be specified multiple times)
    #[arg(long = "attr", value_name = "KEY=VALUE", value_parser = parse_attribute)]
    pub attributes: Vec<(String, String)>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "console")]
    pub format: OutputFormat,

    /// Read messages line by line from stdin, all in one conversation
    #[arg(short, long)]
    pub interactive: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Directory for daily-rolling diagnostic logs
    #[arg(long, value_name = "DIR")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn turn_mode(&self) -> TurnMode {
        self.mode.into()
    }
}

/// Parse a `key=value` pair. The key must be non-empty; the value may be.
fn parse_attribute(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty attribute key in '{}'", raw));
    }
    Ok((key.to_string(), value.trim().to_string()))
}
