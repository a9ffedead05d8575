//! xhs-harvest command-line entry point
//!
//! Records for the host go to stdout, one JSON object per line. Diagnostics go
//! to stderr through `tracing`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use xhs_harvest::api::{build_http_client, HttpNoteApi};
use xhs_harvest::config::{load_settings_with_hash, Settings};
use xhs_harvest::crawler::{report_error, run_task, run_validation};
use xhs_harvest::output::{channel, forward_records, EventEmitter};
use xhs_harvest::task::TaskRequest;
use xhs_harvest::HarvestError;

/// xhs-harvest: note collection driven by a host application
///
/// Runs one collection task described by a JSON request, or checks that a
/// session cookie is still accepted.
#[derive(Parser, Debug)]
#[command(name = "xhs-harvest")]
#[command(version = "1.0.0")]
#[command(about = "Note collection engine driven by JSON task requests", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Task request as a JSON object
    #[arg(value_name = "REQUEST_JSON")]
    request: Option<String>,

    /// Path to TOML settings file
    #[arg(long, value_name = "PATH", global = true)]
    settings: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error diagnostics
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check whether a session cookie is accepted
    ValidateCookie {
        /// Cookie string, JSON-encoded
        #[arg(value_name = "COOKIE_JSON")]
        cookie: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let (emitter, records) = channel();
    let writer = tokio::spawn(forward_records(records, std::io::stdout()));

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping at the next boundary");
            interrupt.cancel();
        }
    });

    let succeeded = run(cli, &emitter, cancel).await;
    drop(emitter);

    match writer.await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => tracing::error!("Failed to write records: {}", e),
        Err(e) => tracing::error!("Record writer stopped abnormally: {}", e),
    }

    if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Runs the selected entry point, returning false if it ended with an error record
async fn run(cli: Cli, emitter: &EventEmitter, cancel: CancellationToken) -> bool {
    let settings = match load_settings(cli.settings.as_deref()) {
        Ok(settings) => settings,
        Err(e) => return !emitter.fail("INVALID_CONFIG", format!("{:#}", e)),
    };

    match cli.command {
        Some(Command::ValidateCookie { cookie }) => {
            let Some(raw) = cookie else {
                return !emitter.fail("MISSING_COOKIE", "Missing cookie parameter");
            };
            let api = match HttpNoteApi::new(&settings.api, None) {
                Ok(api) => api,
                Err(e) => {
                    report_error(emitter, &HarvestError::from(e));
                    return false;
                }
            };
            run_validation(&decode_cookie_arg(&raw), Arc::new(api), emitter)
                .await
                .is_some()
        }
        None => {
            let Some(raw) = cli.request else {
                return !emitter.fail("MISSING_CONFIG", "Missing task request parameter");
            };
            let request = match TaskRequest::from_json(&raw) {
                Ok(request) => request,
                Err(e) => {
                    report_error(emitter, &HarvestError::from(e));
                    return false;
                }
            };

            let client = match build_http_client(&settings.api, request.proxy()) {
                Ok(client) => client,
                Err(e) => {
                    report_error(emitter, &HarvestError::from(e));
                    return false;
                }
            };
            let api = match HttpNoteApi::with_client(client.clone(), &settings.api.base_url) {
                Ok(api) => api,
                Err(e) => {
                    report_error(emitter, &HarvestError::from(e));
                    return false;
                }
            };

            run_task(
                &request,
                Arc::new(api),
                client,
                &settings.fetcher,
                emitter,
                cancel,
            )
            .await
            .is_some()
        }
    }
}

/// Loads settings from `path`, or defaults when no file was given
fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };

    let (settings, hash) = load_settings_with_hash(path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;
    tracing::info!("Settings loaded from {} (hash: {})", path.display(), hash);
    Ok(settings)
}

/// The host passes the cookie JSON-encoded; a bare string is accepted as-is
fn decode_cookie_arg(raw: &str) -> String {
    serde_json::from_str::<String>(raw).unwrap_or_else(|_| raw.to_string())
}

/// Sets up the tracing subscriber on stderr based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("xhs_harvest=info,warn"),
            1 => EnvFilter::new("xhs_harvest=debug,info"),
            2 => EnvFilter::new("xhs_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
