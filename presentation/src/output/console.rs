//! Console output formatter for turn events

use super::formatter::EventFormatter;
use colored::Colorize;
use roundtable_domain::{EventKind, TurnEvent, truncate};
use serde_json::Value;

/// Longest tool result excerpt shown on one line.
const TOOL_PREVIEW_CHARS: usize = 120;

/// Formats turn events for a terminal.
///
/// Answer text is printed as deltas arrive; the closing `role_result`
/// only repeats the text when nothing was streamed for that role.
#[derive(Debug, Default)]
pub struct ConsoleFormatter {
    streaming_role: Option<String>,
}

impl ConsoleFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leave a streamed answer before printing anything else.
    fn break_stream(&mut self) -> &'static str {
        if self.streaming_role.take().is_some() {
            "\n"
        } else {
            ""
        }
    }

    fn header(icon: &str, name: &str, is_summary: bool) -> String {
        let title = if is_summary {
            format!("{} {} (summary)", icon, name)
        } else {
            format!("{} {}", icon, name)
        };
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn compact_args(args: &Value) -> String {
        match args {
            Value::Object(map) if map.is_empty() => String::new(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

impl EventFormatter for ConsoleFormatter {
    fn format(&mut self, event: &TurnEvent) -> String {
        match &event.kind {
            EventKind::ContentDelta { role, delta } => {
                let lead = match &self.streaming_role {
                    Some(current) if current == role => "",
                    _ => self.break_stream(),
                };
                self.streaming_role = Some(role.clone());
                format!("{}{}", lead, delta)
            }
            EventKind::RoleResult { role, content, .. } => {
                if self.streaming_role.as_deref() == Some(role.as_str()) {
                    self.streaming_role = None;
                    "\n".to_string()
                } else {
                    format!("{}{}\n", self.break_stream(), content)
                }
            }
            kind => {
                let lead = self.break_stream();
                let body = match kind {
                    EventKind::ConversationCreated {
                        conversation_id,
                        title,
                    } => format!(
                        "{} {} {}\n",
                        "Conversation:".dimmed(),
                        conversation_id,
                        format!("({})", title).dimmed()
                    ),
                    EventKind::ThinkingStart => format!("{}\n", "Thinking...".dimmed()),
                    EventKind::ThinkingStep { content, .. } => {
                        format!("  {} {}\n", "·".dimmed(), content.dimmed())
                    }
                    EventKind::ToolCall {
                        tool_name,
                        tool_args,
                        ..
                    } => format!(
                        "  {} {}({})\n",
                        "tool".yellow(),
                        tool_name.yellow().bold(),
                        Self::compact_args(tool_args)
                    ),
                    EventKind::ToolResult {
                        tool_name,
                        success,
                        content,
                        ..
                    } => {
                        let mark = if *success { "v".green() } else { "x".red() };
                        format!(
                            "  {} {}: {}\n",
                            mark,
                            tool_name,
                            truncate(&content.replace('\n', " "), TOOL_PREVIEW_CHARS).dimmed()
                        )
                    }
                    EventKind::RoleStart {
                        name,
                        icon,
                        is_summary,
                        ..
                    } => Self::header(icon, name, *is_summary),
                    EventKind::Discussion {
                        name,
                        round,
                        content,
                        ..
                    } => format!(
                        "{} {}\n{}\n",
                        format!("[round {}]", round).yellow(),
                        name.bold(),
                        content
                    ),
                    EventKind::Error { code, message } => {
                        format!("{} {}\n", format!("Error {}:", code).red().bold(), message)
                    }
                    EventKind::Done => String::new(),
                    EventKind::ContentDelta { .. } | EventKind::RoleResult { .. } => String::new(),
                };
                format!("{}{}", lead, body)
            }
        }
    }
}
