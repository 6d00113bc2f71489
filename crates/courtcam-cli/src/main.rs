//! CourtCam command line binary.

mod cli;
mod commands;

use std::time::Duration;

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    // Install rustls crypto provider (required for TLS/HTTPS)
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        debug!("rustls crypto provider already installed");
    }

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Human-readable logs on stderr by default, JSON with `LOG_FORMAT=json`.
fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,courtcam=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let client_config = commands::client_config(cli.api_url);
    match cli.command {
        Command::Analyze {
            file,
            archive_name,
            archive,
        } => commands::analyze(client_config, &file, archive_name, archive).await,
        Command::Archive { action } => commands::archive(action).await,
        Command::CheckCourt { image } => commands::check_court(client_config, &image).await,
        Command::Debounce {
            detections,
            interval_ms,
        } => commands::debounce(&detections, Duration::from_millis(interval_ms)).await,
    }
}
