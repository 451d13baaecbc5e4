//! newsfeed - follow news subscriptions from the terminal.
//!
//! Talks to the newsfeed backend over REST for session and subscription
//! management, and over a WebSocket for live news delivery.

mod app;
mod cli;

use std::io;
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use cli::Cli;
use newsfeed_core::config::Config;

/// File name prefix for the rolling log
const LOG_FILE_NAME: &str = "newsfeed.log";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr, filtered by `RUST_LOG` (default `warn`). When a log
/// directory is given, a daily rolling file is written there as well; the
/// returned guard must be held until exit so buffered lines are flushed.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: ignoring unreadable config: {:#}", e);
        Config::default()
    });
    config.apply_env()?;

    if let Some(ref server) = cli.server {
        config.server_url = Some(server.clone());
    }
    if let Some(ref live_url) = cli.live_url {
        config.live_url = Some(live_url.clone());
    }
    Ok(config)
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let mut app = App::new(config, cli.json)?;
    app.run(cli.command).await
}

#[tokio::main]
async fn main() {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    };

    let guard = init_tracing(config.log_dir.as_deref());
    info!(server = %config.server_url(), "newsfeed starting");

    let result = run(cli, config).await;
    if let Err(ref e) = result {
        warn!(error = %e, "Command failed");
    }

    // Flush the file writer before exiting
    drop(guard);

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
