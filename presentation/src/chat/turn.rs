//! Running a single turn from the terminal

use crate::cli::commands::{Cli, OutputFormat};
use crate::output::{TurnSummary, deliver, formatter_for};
use roundtable_application::{RunTurnUseCase, TurnRequest};
use roundtable_domain::TurnMode;
use std::io;
use tracing::{debug, info};

/// Request fields shared by every turn of a CLI session.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnSettings {
    pub session_id: String,
    pub user_id: Option<String>,
    pub mode: TurnMode,
    pub attributes: Vec<(String, String)>,
    pub conversation_id: Option<String>,
    pub format: OutputFormat,
}

impl TurnSettings {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            session_id: cli.session.clone(),
            user_id: cli.user.clone(),
            mode: cli.turn_mode(),
            attributes: cli.attributes.clone(),
            conversation_id: cli.conversation.clone(),
            format: cli.format,
        }
    }

    pub fn request(&self, message: &str) -> TurnRequest {
        let mut request = TurnRequest::new(&self.session_id, message).with_mode(self.mode);
        if let Some(id) = &self.conversation_id {
            request = request.with_conversation(id.as_str());
        }
        if let Some(user) = &self.user_id {
            request = request.with_user(user);
        }
        for (key, value) in &self.attributes {
            request = request.with_attribute(key, value);
        }
        request
    }

    /// Keep talking in the conversation a turn just created.
    pub fn adopt(&mut self, summary: &TurnSummary) {
        if self.conversation_id.is_none()
            && let Some(id) = &summary.conversation_id
        {
            info!(conversation_id = %id, "Continuing in new conversation");
            self.conversation_id = Some(id.clone());
        }
    }
}

/// Run one turn, printing its events to stdout.
///
/// Ctrl-C while the turn is in flight cancels it; the stream then ends
/// without `done`.
pub async fn run_turn(
    use_case: &RunTurnUseCase,
    settings: &TurnSettings,
    message: &str,
) -> io::Result<TurnSummary> {
    let mut handle = use_case.start(settings.request(message));

    let token = handle.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupt received, cancelling turn");
            token.cancel();
        }
    });

    let mut formatter = formatter_for(settings.format);
    let mut stdout = io::stdout();
    let result = deliver(&mut handle.events, formatter.as_mut(), &mut stdout).await;
    interrupt.abort();

    let summary = result?;
    if !summary.completed && settings.format == OutputFormat::Console {
        eprintln!("\n^C turn cancelled");
    }
    Ok(summary)
}
