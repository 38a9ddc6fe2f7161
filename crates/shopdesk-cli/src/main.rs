//! shopdesk - a command-line storefront and admin console for the shop backend.
//!
//! Every page of the web front end is available as a subcommand or from the
//! interactive shell. Protected pages require signing in first.

mod app;
mod commands;
mod shell;
mod views;

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use shopdesk_core::Config;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use commands::Commands;

// ============================================================================
// Constants
// ============================================================================

/// File name prefix for the rolling log in `log_dir`
const LOG_FILE_PREFIX: &str = "shopdesk.log";

#[derive(Parser)]
#[command(name = "shopdesk")]
#[command(about = "Storefront and admin console for the shop backend")]
#[command(version)]
struct Cli {
    /// Backend base URL (overrides config and SHOPDESK_API_BASE_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Request timeout in seconds (0 = no timeout)
    #[arg(short = 't', long, global = true)]
    timeout: Option<u64>,

    /// Keep the session in memory only; nothing is written to disk
    #[arg(long, global = true)]
    no_persist: bool,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Runs the interactive shell when omitted
    #[command(subcommand)]
    command: Option<Commands>,
}

impl Cli {
    /// Layer command-line flags over the loaded configuration.
    fn apply(&self, mut config: Config) -> Config {
        if let Some(ref url) = self.api_url {
            config.api_base_url = url.clone();
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = Some(timeout);
        }
        if self.no_persist {
            config.persist_session = false;
        }
        if let Some(ref dir) = self.log_dir {
            config.log_dir = Some(dir.clone());
        }
        config
    }
}

/// Initialize the tracing subscriber for logging.
///
/// Stderr always; a rolling file too when `log_dir` is set. The returned
/// guard must live until exit so buffered file output is flushed.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = Config::load()
        .context("Failed to load config")?
        .with_env_overrides();
    let config = cli.apply(config);

    let _guard = init_tracing(config.log_dir.as_deref());
    info!(api = %config.api_base_url, "shopdesk starting");

    let mut app = App::new(config)?;
    let ok = match cli.command {
        Some(command) => command.execute(&mut app).await?,
        None => Commands::Shell.execute(&mut app).await?,
    };

    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
