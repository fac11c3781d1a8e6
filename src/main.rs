use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::info;

use rubert_analyzer::config::Settings;
use rubert_analyzer::session;

/// Terminal interface for the ruBERT dangerous-content classifier.
#[derive(Parser, Debug)]
#[command(name = "rubert-analyzer", version)]
struct Args {
    /// Checkpoint directory to load before the first prompt
    #[arg(long)]
    model: Option<PathBuf>,
}

/// Main entry point.
///
/// Loads settings, initializes rolling-file logging and starts the
/// interactive analysis session.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load settings first
    let settings = Settings::new().context("failed to load configuration")?;

    // Initialize the subscriber before any file operations
    let file_appender = tracing_appender::rolling::RollingFileAppender::new(
        tracing_appender::rolling::Rotation::DAILY,
        settings
            .logging
            .file
            .as_deref()
            .unwrap_or_else(|| Path::new("logs")),
        "rubert-analyzer",
    );

    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        // Disable ANSI colors for cleaner log files
        .with_ansi(false)
        .with_line_number(true)
        .with_file(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_target(false)
        .with_max_level(parse_level(&settings.logging.level))
        .init();

    info!("ruBERT Content Analyzer starting up...");

    let log_path = settings
        .logging
        .file
        .as_deref()
        .unwrap_or_else(|| Path::new("logs"));
    std::fs::create_dir_all(log_path).context("failed to create log directory")?;
    let full_log_path = std::fs::canonicalize(log_path)?;
    info!("Log directory: {}", full_log_path.display());

    info!("Settings loaded");

    session::run(&settings, args.model).await
}

fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "error" => tracing::Level::ERROR,
        "warn" => tracing::Level::WARN,
        "debug" => tracing::Level::DEBUG,
        "trace" => tracing::Level::TRACE,
        _ => tracing::Level::INFO,
    }
}
