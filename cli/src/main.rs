//! CLI entrypoint for roundtable
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use roundtable_application::{RunTurnUseCase, ToolExecutorPort};
use roundtable_domain::ConfigIssue;
use roundtable_infrastructure::{
    ConfigLoader, FileConfig, JsonSchemaToolConverter, JsonlConversationLogger, OpenAiGateway,
    configured_registry, open_store,
};
use roundtable_presentation::{ChatRepl, Cli, TurnSettings, run_turn};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the stderr subscriber, plus a daily-rolling file sink when
/// `log_dir` is given. The returned guard must outlive every log call.
fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let mut guard = None;
    let file_layer = log_dir.map(|dir| {
        let appender = tracing_appender::rolling::daily(dir, "roundtable.log");
        let (writer, worker) = tracing_appender::non_blocking(appender);
        guard = Some(worker);
        fmt::layer().with_ansi(false).with_writer(writer)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    guard
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    if cli.no_config {
        return Ok(ConfigLoader::load_defaults());
    }
    ConfigLoader::load(cli.config.as_deref()).context("failed to load configuration")
}

/// Log warnings and fail on the first error-level issue.
fn report_issues(issues: &[ConfigIssue]) -> Result<()> {
    for issue in issues {
        warn!("config {}", issue);
    }
    if let Some(fatal) = issues.iter().find(|i| i.is_error()) {
        bail!("invalid configuration: {}", fatal.message);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref());

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_deref()) {
            println!("{}", line);
        }
        return Ok(());
    }

    if !cli.interactive && cli.message.is_none() {
        bail!("A message is required. Use --interactive to read messages from stdin.");
    }

    info!("Starting roundtable");

    let config = load_config(&cli)?;

    // === Dependency Injection ===
    let registry = configured_registry(&config.tools).context("failed to build tool registry")?;
    report_issues(&config.validate_against(registry.tool_spec()))?;

    let catalog = config.role_catalog().context("invalid role catalog")?;
    catalog
        .validate_tools(registry.tool_spec())
        .context("role references an unavailable tool")?;
    info!(
        roles = catalog.len(),
        tools = registry.stats().total_tools,
        "Catalog ready"
    );

    let gateway = OpenAiGateway::new(&config.llm).context("failed to create model gateway")?;
    let store = open_store(&config.store)
        .await
        .context("failed to open conversation store")?;

    let mut use_case = RunTurnUseCase::new(
        Arc::new(gateway),
        Arc::new(registry),
        Arc::new(JsonSchemaToolConverter),
        Arc::new(catalog),
        store,
    )
    .with_params(config.orchestration_params());

    if let Some(path) = &config.logging.conversation_log {
        let logger = JsonlConversationLogger::open(path)
            .with_context(|| format!("failed to open conversation log {}", path.display()))?;
        info!(path = %path.display(), "Conversation log enabled");
        use_case = use_case.with_logger(Arc::new(logger));
    }

    let use_case = Arc::new(use_case);
    let settings = TurnSettings::from_cli(&cli);

    if cli.interactive {
        let mut repl = ChatRepl::new(use_case, settings);
        repl.run().await.context("interactive session failed")?;
        return Ok(());
    }

    // Single message mode
    let message = cli.message.as_deref().unwrap_or_default();
    let summary = run_turn(&use_case, &settings, message)
        .await
        .context("failed to write turn output")?;
    use_case.flush().await;

    if let Some(code) = summary.error {
        bail!("turn finished with error {}", code);
    }
    Ok(())
}
