//! Paginated fetch loop
//!
//! Drives one paginated request context page by page, strictly one request at a
//! time, and hands every net-new item to the sink dispatcher in arrival order.

use crate::api::{ApiError, Cursor, Item, NoteApi, TaskContext};
use crate::config::FetcherSettings;
use crate::output::{EventEmitter, SinkDispatcher};
use crate::session::Credential;
use crate::state::{DrainReason, FetchState};
use crate::Result;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

/// Consecutive non-advancing pages tolerated before the fetch is abandoned
const MAX_STALLED_PAGES: u32 = 2;

/// How a paginated fetch ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// `Completed` or `Failed`
    pub state: FetchState,

    /// Why pagination stopped, when it completed
    pub reason: Option<DrainReason>,

    /// Items handed to the dispatcher
    pub collected: usize,

    /// Page requests issued
    pub pages: u32,

    /// Message of the last platform response
    pub api_message: String,

    /// Page failure or protocol anomaly, if any
    pub error: Option<String>,
}

impl FetchOutcome {
    pub fn cancelled(&self) -> bool {
        self.reason == Some(DrainReason::Cancelled)
    }
}

/// Paginated fetcher for one task
pub struct PaginatedFetcher<'a> {
    api: &'a dyn NoteApi,
    credential: &'a Credential,
    settings: &'a FetcherSettings,
    emitter: &'a EventEmitter,
    cancel: &'a CancellationToken,
}

enum PageEnd {
    Drain(DrainReason),
    Anomaly(String),
}

impl<'a> PaginatedFetcher<'a> {
    pub fn new(
        api: &'a dyn NoteApi,
        credential: &'a Credential,
        settings: &'a FetcherSettings,
        emitter: &'a EventEmitter,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            api,
            credential,
            settings,
            emitter,
            cancel,
        }
    }

    /// Fetches pages until the data ends, the target is reached, a page fails,
    /// or cancellation is requested
    ///
    /// Protocol anomalies end the fetch in `Failed` instead of draining it.
    ///
    /// # Arguments
    ///
    /// * `context` - What to paginate over
    /// * `target` - Number of items wanted; `None` exhausts pagination
    /// * `dispatcher` - Receives every net-new item
    ///
    /// # Returns
    ///
    /// The outcome of the fetch. Errors are reserved for a closed dispatcher or
    /// an illegal state transition.
    pub async fn run(
        &self,
        context: &TaskContext,
        target: Option<usize>,
        dispatcher: &SinkDispatcher,
    ) -> Result<FetchOutcome> {
        let mut state = FetchState::Idle;
        let mut cursor = Cursor::start();
        let mut seen: HashSet<String> = HashSet::new();
        let mut collected = 0usize;
        let mut stalled = 0u32;
        let mut api_message = String::new();
        let mut error = None;
        let total = target.unwrap_or(0);
        let reached = |collected: usize| target.is_some_and(|t| collected >= t);

        let end = loop {
            if self.cancel.is_cancelled() {
                break PageEnd::Drain(DrainReason::Cancelled);
            }

            let page = state.page().map_or(1, |p| p + 1);
            if page > 1 && !self.settings.page_delay().is_zero() {
                tokio::select! {
                    _ = self.cancel.cancelled() => break PageEnd::Drain(DrainReason::Cancelled),
                    _ = tokio::time::sleep(self.settings.page_delay()) => {}
                }
            }

            state = state.transition(FetchState::Fetching { page })?;
            tracing::debug!("Requesting page {} at cursor {}", page, cursor);

            let response = match self.api.fetch_page(self.credential, context, &cursor).await {
                Ok(response) => response,
                Err(e @ ApiError::Decode { .. }) => {
                    api_message = e.to_string();
                    break PageEnd::Anomaly(format!("page {} is malformed: {}", page, e));
                }
                Err(e) => {
                    self.emitter
                        .warn(format!("Page {} request failed: {}", page, e));
                    api_message = e.to_string();
                    error = Some(e.to_string());
                    break PageEnd::Drain(DrainReason::PageFailed);
                }
            };

            api_message = response.message.clone();
            if !response.success {
                self.emitter
                    .warn(format!("Page {} rejected: {}", page, response.message));
                error = Some(response.message);
                break PageEnd::Drain(DrainReason::PageFailed);
            }

            let Some(data) = response.data else {
                break PageEnd::Anomaly(format!("page {} reported success without data", page));
            };

            let advanced = data.next_cursor != cursor;
            if data.items.is_empty() && !advanced {
                break PageEnd::Drain(DrainReason::EndOfData);
            }

            let received = data.items.len();
            let mut duplicates = 0;
            for item in data.items {
                if reached(collected) {
                    break;
                }
                if !seen.insert(item.id.clone()) {
                    duplicates += 1;
                    continue;
                }

                let item = self.enrich(item).await;
                dispatcher.dispatch(item).await?;
                collected += 1;
            }

            if duplicates > 0 {
                tracing::debug!("Page {}: skipped {} duplicate items", page, duplicates);
            }
            self.emitter.progress(
                collected,
                total,
                format!("第{}页: 收到 {} 条, 累计 {} 条", page, received, collected),
            );

            if reached(collected) {
                break PageEnd::Drain(DrainReason::TargetReached);
            }
            if !data.has_more {
                break PageEnd::Drain(DrainReason::EndOfData);
            }

            if advanced {
                stalled = 0;
                cursor = data.next_cursor;
            } else {
                stalled += 1;
                if stalled >= MAX_STALLED_PAGES {
                    break PageEnd::Anomaly(format!(
                        "cursor {} did not advance for {} consecutive pages",
                        cursor, stalled
                    ));
                }
            }
        };

        let pages = state.page().unwrap_or(0);
        let (state, reason) = match end {
            PageEnd::Drain(reason) => {
                let draining = state.transition(FetchState::Draining { reason })?;
                tracing::info!(
                    "Fetch drained ({}) after {} pages, {} items",
                    reason.as_str(),
                    pages,
                    collected
                );
                (draining.transition(FetchState::Completed)?, Some(reason))
            }
            PageEnd::Anomaly(message) => {
                self.emitter.error(format!("Stopping fetch: {}", message));
                error = Some(message);
                (state.transition(FetchState::Failed)?, None)
            }
        };

        Ok(FetchOutcome {
            state,
            reason,
            collected,
            pages,
            api_message,
            error,
        })
    }

    /// Replaces a list item with its detail payload when enabled
    ///
    /// A failed detail request keeps the list item.
    async fn enrich(&self, item: Item) -> Item {
        if !self.settings.fetch_details {
            return item;
        }

        match self.api.fetch_single(self.credential, &item.note_ref()).await {
            Ok(response) if response.success => match response.data {
                Some(mut detail) => {
                    if detail.xsec_token.is_none() {
                        detail.xsec_token = item.xsec_token;
                    }
                    detail
                }
                None => item,
            },
            Ok(response) => {
                tracing::debug!(
                    "Detail for {} rejected, keeping list item: {}",
                    item.id,
                    response.message
                );
                item
            }
            Err(e) => {
                tracing::debug!("Detail for {} failed, keeping list item: {}", item.id, e);
                item
            }
        }
    }
}
