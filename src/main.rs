//! VoluGuard Terminal — Entry Point
//!
//! Parses the command line, loads configuration and logging, wires the
//! HTTP backend and runs one command or the interactive shell.
//!
//! Wiring sequence:
//! 1. Load `.env` (access token, base URL and log level overrides)
//! 2. Parse CLI flags (`--config`, `--token`, `--format`)
//! 3. Load config.toml + validate
//! 4. Init tracing to stderr (pretty or JSON)
//! 5. Create BackendClient (HTTP + timeouts + metrics) behind HttpBackend
//! 6. Log in with the token, unless the command needs none
//! 7. Run the command (or the shell until `quit` / Ctrl-C)
//! 8. Stop the live feed listener if one is running

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use voluguard::cli::output::print_error;
use voluguard::cli::{shell, App, Cli, Command};
use voluguard::config::{self, AppSection, LogFormat};
use voluguard::error::ApiError;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    // ── 1. .env overrides (missing file is fine) ────────────
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e).context("Failed to load .env");
        }
    }

    // ── 2. Command line ─────────────────────────────────────
    let cli = Cli::parse();

    // ── 3. Configuration ────────────────────────────────────
    let config = config::load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    // ── 4. Logging to stderr, never mixed with rendered tables ──
    init_tracing(&config.app);
    info!(
        name = %config.app.name,
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.api.base_url,
        refetch = ?config.session.market_refetch,
        "Starting VoluGuard terminal"
    );

    // ── 5. Backend client ───────────────────────────────────
    let mut app = App::new(&config, cli.format).context("Failed to initialise backend client")?;

    // ── 6/7. Login + command ────────────────────────────────
    let token = cli.token.as_deref();
    let result = match cli.command {
        Command::Shell => {
            if let Some(token) = token {
                if let Err(e) = app.login(token).await {
                    print_error(&format!("{e:#}"));
                }
            }
            shell::run(&mut app).await
        }
        Command::View(view) if !view.requires_login() => app.run(view).await,
        Command::Login => login(&mut app, token).await,
        Command::Feed { seconds } => match login(&mut app, token).await {
            Ok(()) => app.feed_for(seconds).await,
            Err(e) => Err(e),
        },
        Command::View(view) => match login(&mut app, token).await {
            Ok(()) => app.run(view).await,
            Err(e) => Err(e),
        },
    };

    // ── 8. Shutdown ─────────────────────────────────────────
    app.shutdown().await;
    debug!("Shutdown complete");
    result
}

async fn login(app: &mut App, token: Option<&str>) -> Result<()> {
    let token = token.ok_or(ApiError::MissingToken)?;
    app.login(token).await
}

fn init_tracing(app: &AppSection) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&app.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match app.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
