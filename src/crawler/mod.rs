//! Crawl orchestration
//!
//! - `run_task`: parse a host request, run it through the [`TaskRouter`], drain
//!   the sinks, and emit the single terminal record
//! - `run_validation`: the standalone credential check
//!
//! Both entry points report exclusively through the [`EventEmitter`]; every
//! invocation ends with exactly one `done` or `error` record.

mod fetcher;
mod router;

pub use fetcher::{FetchOutcome, PaginatedFetcher};
pub use router::{TaskResult, TaskRouter};

use crate::api::NoteApi;
use crate::config::FetcherSettings;
use crate::output::{build_sinks, EventEmitter, Record, SinkDispatcher};
use crate::session::{Credential, SessionValidator, ValidationOutcome};
use crate::task::TaskRequest;
use crate::HarvestError;
use reqwest::Client;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs one task request end to end
///
/// # Arguments
///
/// * `request` - The host request
/// * `api` - Platform client, already configured with the request's proxy
/// * `media_client` - HTTP client for media downloads
/// * `settings` - Fetch loop settings
/// * `emitter` - Destination of every record of the invocation
/// * `cancel` - Stops the task at the next page or note boundary
///
/// # Returns
///
/// The task result when a `done` record was emitted, `None` after an `error`
/// record
pub async fn run_task(
    request: &TaskRequest,
    api: Arc<dyn NoteApi>,
    media_client: Client,
    settings: &FetcherSettings,
    emitter: &EventEmitter,
    cancel: CancellationToken,
) -> Option<TaskResult> {
    match execute_task(request, api, media_client, settings, emitter, cancel).await {
        Ok(result) => {
            tracing::info!("{}", result.summary());
            emitter.emit(result.to_record());
            Some(result)
        }
        Err(e) => {
            report_error(emitter, &e);
            None
        }
    }
}

async fn execute_task(
    request: &TaskRequest,
    api: Arc<dyn NoteApi>,
    media_client: Client,
    settings: &FetcherSettings,
    emitter: &EventEmitter,
    cancel: CancellationToken,
) -> crate::Result<TaskResult> {
    // Configuration problems must surface before any network activity.
    let kind = request.task_kind()?;
    let credential = request.credential()?;
    let descriptor = request.descriptor()?;
    let sink_config = request.sink_config()?;

    emitter.info(format!(
        "Starting {} task, output mode {:?}",
        kind, sink_config.mode
    ));
    if let Some(proxy) = request.proxy() {
        emitter.debug(format!("Using proxy {}", proxy));
    }

    let sinks = build_sinks(&sink_config, media_client)?;
    let dispatcher = SinkDispatcher::spawn(
        sinks,
        sink_config,
        settings.sink_queue_capacity,
        emitter.clone(),
    );

    let router = TaskRouter::new(api, settings.clone(), emitter.clone(), cancel);
    let routed = router.route(&descriptor, &credential, &dispatcher).await;

    // Drain the sinks before anything terminal is emitted.
    let report = dispatcher.close().await;
    if report.failures > 0 {
        emitter.warn(format!(
            "{} sink writes failed out of {} items",
            report.failures, report.received
        ));
    }

    routed
}

/// Validates a raw cookie string and reports the outcome
///
/// Emits `validation_result` followed by a terminal `done`, or a single `error`
/// record when the cookie cannot be parsed.
pub async fn run_validation(
    raw_cookie: &str,
    api: Arc<dyn NoteApi>,
    emitter: &EventEmitter,
) -> Option<ValidationOutcome> {
    let credential = match Credential::parse(raw_cookie) {
        Ok(credential) => credential,
        Err(e) => {
            report_error(emitter, &HarvestError::from(e));
            return None;
        }
    };

    let outcome = SessionValidator::new(api, emitter.clone())
        .validate(&credential)
        .await;

    emitter.emit(Record::Done {
        success: outcome.is_valid(),
        count: 0,
        api_success: outcome.is_valid(),
        api_message: outcome.message().to_string(),
        message: "cookie validation finished".to_string(),
    });
    Some(outcome)
}

/// Emits the terminal `error` record for `error`
pub fn report_error(emitter: &EventEmitter, error: &HarvestError) {
    emitter.fail(error.code(), error.to_string());
}
