//! Veye CLI
//!
//! Main entry point for the Veye command-line tool. Provides commands
//! for asking situational questions, inspecting retrieved events,
//! zone summaries, and message ingestion.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, EventsCommand, IngestCommand, SummaryCommand};
use std::path::PathBuf;
use veye_core::{config::AppConfig, logging, AppResult};

/// Veye CLI - situational safety alerts for Haitian cities
#[derive(Parser, Debug)]
#[command(name = "veye")]
#[command(about = "Situational safety question answering over community reports", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the event store database
    #[arg(short, long, global = true, env = "VEYE_DB")]
    db: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "VEYE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a situational question and get a grounded answer
    Ask(AskCommand),

    /// Show the raw events a question would retrieve
    Events(EventsCommand),

    /// Summarize the last 24 hours for one zone
    Summary(SummaryCommand),

    /// Ingest raw community messages into the event store
    Ingest(IngestCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load()?;
    let config = config.with_overrides(
        cli.db,
        cli.config,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );
    config.validate()?;

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Veye CLI starting");
    tracing::debug!("Event store: {:?}", config.db_path);
    tracing::debug!("Endpoint: {}", config.api_base);

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Events(_) => "events",
        Commands::Summary(_) => "summary",
        Commands::Ingest(_) => "ingest",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Events(cmd) => cmd.execute(&config).await,
        Commands::Summary(cmd) => cmd.execute(&config).await,
        Commands::Ingest(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
