//! `scribe` -- submit and follow long-running scribe server jobs.
//!
//! Every submitted task id is persisted per channel, so an interrupted
//! run (Ctrl-C, crash, closed terminal) is picked up again with
//! `scribe resume`.
//!
//! # Environment variables
//!
//! | Variable                  | Required | Default                 | Description                      |
//! |---------------------------|----------|-------------------------|----------------------------------|
//! | `SCRIBE_API_URL`          | no       | `http://127.0.0.1:8000` | Server base URL                  |
//! | `SCRIBE_STORE_URL`        | no       | `sqlite://scribe.db`    | Task identity database           |
//! | `SCRIBE_POLL_INTERVAL_MS` | no       | `800`                   | Milliseconds between status polls|
//! | `REQUEST_TIMEOUT_SECS`    | no       | `30`                    | HTTP request timeout             |
//! | `SUBMIT_TIMEOUT_SECS`     | no       | `600`                   | Timeout for job submissions      |
//! | `SCRIBE_LOG_FORMAT`       | no       | `text`                  | `text` or `json` logs on stderr  |

use std::process::ExitCode;

use clap::Parser;
use scribe_cli::args::Cli;
use scribe_cli::commands;
use scribe_cli::config::{ClientConfig, LogFormat};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("scribe: {e}");
            return ExitCode::FAILURE;
        }
    };
    config.apply_overrides(&cli);

    init_tracing(config.log_format);

    match commands::run(cli, config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("scribe: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr; stdout carries command output.
fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "scribe_cli=info,scribe_tasks=info,scribe_store=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}
