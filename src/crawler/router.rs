//! Task routing
//!
//! Maps each [`TaskDescriptor`] variant to its fetch strategy and folds the
//! outcome into a [`TaskResult`]. Platform-level failures never escape as errors;
//! they end up in `api_success` / `api_message`.

use crate::api::{NoteApi, TaskContext};
use crate::config::FetcherSettings;
use crate::crawler::fetcher::{FetchOutcome, PaginatedFetcher};
use crate::output::{EventEmitter, Record, SinkDispatcher};
use crate::session::Credential;
use crate::state::{DrainReason, FetchState, TaskStatus};
use crate::task::{TaskDescriptor, TaskKind};
use crate::url::NoteRef;
use crate::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Final result of one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    pub kind: TaskKind,

    /// Items handed to the sinks
    pub count: usize,

    pub status: TaskStatus,

    /// False when the platform rejected or failed any request that mattered
    pub api_success: bool,

    /// Platform message, verbatim on failure
    pub api_message: String,

    /// True when the task stopped early on cancellation
    pub cancelled: bool,
}

impl TaskResult {
    pub fn success(&self) -> bool {
        self.status.is_success()
    }

    /// Human-readable summary used as the `done` message
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{} task {}: {} notes collected",
            self.kind,
            self.status,
            self.count
        );
        if self.cancelled {
            summary.push_str(" (cancelled)");
        }
        summary
    }

    /// The terminal `done` record for this result
    pub fn to_record(&self) -> Record {
        Record::Done {
            success: self.success(),
            count: self.count,
            api_success: self.api_success,
            api_message: self.api_message.clone(),
            message: self.summary(),
        }
    }
}

/// Entry point that runs a descriptor to completion
pub struct TaskRouter {
    api: Arc<dyn NoteApi>,
    settings: FetcherSettings,
    emitter: EventEmitter,
    cancel: CancellationToken,
}

impl TaskRouter {
    pub fn new(
        api: Arc<dyn NoteApi>,
        settings: FetcherSettings,
        emitter: EventEmitter,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            api,
            settings,
            emitter,
            cancel,
        }
    }

    /// Runs `descriptor`, feeding collected items to `dispatcher`
    ///
    /// # Arguments
    ///
    /// * `descriptor` - The validated task
    /// * `credential` - Credential used for every call of the task
    /// * `dispatcher` - Receives items in collection order
    ///
    /// # Returns
    ///
    /// * `Ok(TaskResult)` - The task ran, whether or not the platform cooperated
    /// * `Err(HarvestError)` - The sink pipeline broke or the fetch state machine
    ///   was driven illegally
    pub async fn route(
        &self,
        descriptor: &TaskDescriptor,
        credential: &Credential,
        dispatcher: &SinkDispatcher,
    ) -> Result<TaskResult> {
        match descriptor.context() {
            Some(context) => {
                self.announce(descriptor);
                self.fetch_paginated(descriptor, &context, credential, dispatcher)
                    .await
            }
            None => {
                self.fetch_fixed(descriptor.notes(), credential, dispatcher)
                    .await
            }
        }
    }

    fn announce(&self, descriptor: &TaskDescriptor) {
        match descriptor {
            TaskDescriptor::FixedNotes(_) => {}
            TaskDescriptor::UserTimeline(user) => {
                self.emitter
                    .info(format!("Collecting all notes of user {}", user.user_id));
            }
            TaskDescriptor::KeywordSearch { query, filters } => {
                self.emitter.info(format!(
                    "Searching '{}' (sort {}, type {}, time {}, target {})",
                    query,
                    filters.sort.api_tag(),
                    filters.note_type.label(),
                    filters.recency.label(),
                    filters
                        .target()
                        .map_or_else(|| "unlimited".to_string(), |n| n.to_string())
                ));
            }
        }
    }

    async fn fetch_fixed(
        &self,
        notes: &[NoteRef],
        credential: &Credential,
        dispatcher: &SinkDispatcher,
    ) -> Result<TaskResult> {
        let total = notes.len();
        let mut seen = HashSet::new();
        let mut succeeded = 0;
        let mut failed = 0;
        let mut cancelled = false;
        let mut last_message = String::new();
        let mut last_error = None;

        self.emitter.info(format!("Collecting {} notes", total));

        for (index, note) in notes.iter().enumerate() {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            if !seen.insert(note.note_id.as_str()) {
                tracing::debug!("Skipping repeated note {}", note.note_id);
                self.report_note_progress(index, total);
                continue;
            }

            match self.api.fetch_single(credential, note).await {
                Ok(response) if response.success => match response.data {
                    Some(item) => {
                        last_message = response.message;
                        dispatcher.dispatch(item).await?;
                        succeeded += 1;
                    }
                    None => {
                        failed += 1;
                        let message = format!("note {} returned no content", note.note_id);
                        self.emitter.warn(message.clone());
                        last_error = Some(message);
                    }
                },
                Ok(response) => {
                    failed += 1;
                    self.emitter.warn(format!(
                        "Note {} rejected: {}",
                        note.note_id, response.message
                    ));
                    last_error = Some(response.message);
                }
                Err(e) => {
                    failed += 1;
                    self.emitter
                        .warn(format!("Note {} request failed: {}", note.note_id, e));
                    last_error = Some(e.to_string());
                }
            }

            self.report_note_progress(index, total);
        }

        let api_message = match last_error {
            Some(error) if failed > 0 => format!("{} of {} notes failed: {}", failed, total, error),
            _ => last_message,
        };

        Ok(TaskResult {
            kind: TaskKind::Notes,
            count: succeeded,
            status: TaskStatus::from_counts(succeeded, failed),
            api_success: succeeded > 0 || failed == 0,
            api_message,
            cancelled,
        })
    }

    fn report_note_progress(&self, index: usize, total: usize) {
        self.emitter.progress(
            index + 1,
            total,
            format!("笔记 {}/{}", index + 1, total),
        );
    }

    async fn fetch_paginated(
        &self,
        descriptor: &TaskDescriptor,
        context: &TaskContext,
        credential: &Credential,
        dispatcher: &SinkDispatcher,
    ) -> Result<TaskResult> {
        let fetcher = PaginatedFetcher::new(
            self.api.as_ref(),
            credential,
            &self.settings,
            &self.emitter,
            &self.cancel,
        );
        let outcome = fetcher
            .run(context, descriptor.target_count(), dispatcher)
            .await?;
        Ok(paginated_result(descriptor.kind(), outcome))
    }
}

/// Folds a fetch outcome into a task result
fn paginated_result(kind: TaskKind, outcome: FetchOutcome) -> TaskResult {
    let (status, api_success, api_message) = match (outcome.state, outcome.reason) {
        (FetchState::Failed, _) => (
            TaskStatus::Failed,
            false,
            outcome.error.unwrap_or(outcome.api_message),
        ),
        (_, Some(DrainReason::PageFailed)) => {
            let status = if outcome.collected == 0 {
                TaskStatus::Failed
            } else {
                TaskStatus::PartiallyFailed
            };
            (status, false, outcome.error.unwrap_or(outcome.api_message))
        }
        _ => (TaskStatus::Completed, true, outcome.api_message),
    };

    TaskResult {
        kind,
        count: outcome.collected,
        status,
        api_success,
        api_message,
        cancelled: outcome.reason == Some(DrainReason::Cancelled),
    }
}
