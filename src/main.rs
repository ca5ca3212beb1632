//! CLI entry point for the CCAA scraper pipeline.
//!
//! Provides subcommands for the three pipeline stages: extracting the raw
//! election, GDP and education sources, processing them into one merged
//! regional dataset, and rendering the scatter chart.

use anyhow::Result;
use ccaa_scraper::extract::{education, elections, gdp};
use ccaa_scraper::fetch::{BasicClient, InsecureClient};
use ccaa_scraper::{plot, process};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "ccaa_scraper")]
#[command(
    about = "Scrapes Spanish election, GDP and education statistics and merges them by region",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the three raw sources into the working directory
    Extract,
    /// Reconcile region names, aggregate and merge the raw files
    Process,
    /// Render the scatter chart from the merged file
    Plot,
    /// Extract, process and plot in one go
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/ccaa_scraper.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("ccaa_scraper.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let dir = Path::new(".");

    match cli.command {
        Commands::Extract => extract_all(dir).await,
        Commands::Process => {
            process::run(dir)?;
        }
        Commands::Plot => {
            plot::render(dir)?;
        }
        Commands::Run => {
            extract_all(dir).await;
            process::run(dir)?;
            plot::render(dir)?;
        }
    }

    Ok(())
}

/// Runs the three extraction routines in order. Each fails on its own; a
/// dead source never blocks the remaining ones.
async fn extract_all(dir: &Path) {
    match BasicClient::with_user_agent(elections::BROWSER_UA) {
        Ok(client) => {
            if let Err(e) = elections::extract(&client, dir).await {
                error!(error = %e, "election extraction failed");
            }
        }
        Err(e) => error!(error = %e, "could not build the election HTTP client"),
    }

    // Both agency endpoints sit behind the same broken certificate chain.
    match InsecureClient::new() {
        Ok(client) => {
            if let Err(e) = gdp::extract(&client, dir).await {
                error!(error = %e, "GDP extraction failed");
            }
            if let Err(e) = education::extract(&client, dir).await {
                error!(error = %e, "education extraction failed");
            }
        }
        Err(e) => error!(error = %e, "could not build the statistics-agency HTTP client"),
    }

    info!("extraction stage finished");
}
