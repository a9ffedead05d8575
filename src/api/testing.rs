//! Scripted [`NoteApi`] used by unit tests

use crate::api::traits::{ApiError, NoteApi};
use crate::api::types::{ApiResponse, Cursor, Item, Page, TaskContext};
use crate::session::Credential;
use crate::url::NoteRef;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// How a scripted call answers
pub(crate) enum Scripted<T> {
    Ok(T),
    Rejected(String),
    Transport(String),
    Malformed(String),
}

impl<T> Scripted<T> {
    fn into_result(self, url: &str) -> Result<ApiResponse<T>, ApiError> {
        match self {
            Self::Ok(data) => Ok(ApiResponse::ok("成功", data)),
            Self::Rejected(message) => Ok(ApiResponse::failed(message)),
            Self::Transport(message) => Err(ApiError::Connection {
                url: url.to_string(),
                message,
            }),
            Self::Malformed(message) => Err(ApiError::Decode {
                url: url.to_string(),
                message,
            }),
        }
    }
}

#[derive(Default)]
pub(crate) struct ScriptedApi {
    probe: Mutex<Option<Result<ApiResponse<Value>, ApiError>>>,
    pages: Mutex<VecDeque<Scripted<Page>>>,
    notes: Mutex<HashMap<String, VecDeque<Scripted<Item>>>>,
    pub probe_queries: Mutex<Vec<String>>,
    pub page_cursors: Mutex<Vec<Cursor>>,
    pub single_requests: Mutex<Vec<String>>,
    cancel_after: Mutex<Option<(usize, CancellationToken)>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_probe(self, response: Result<ApiResponse<Value>, ApiError>) -> Self {
        *self.probe.lock().unwrap() = Some(response);
        self
    }

    pub fn with_page(self, page: Scripted<Page>) -> Self {
        self.pages.lock().unwrap().push_back(page);
        self
    }

    pub fn with_note(self, id: &str, note: Scripted<Item>) -> Self {
        self.notes
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default()
            .push_back(note);
        self
    }

    /// Cancels `token` once `calls` page or note requests have been answered
    pub fn cancel_after(self, calls: usize, token: CancellationToken) -> Self {
        *self.cancel_after.lock().unwrap() = Some((calls, token));
        self
    }

    fn count_call(&self) {
        let calls = self.page_requests() + self.single_requests.lock().unwrap().len();
        if let Some((after, token)) = self.cancel_after.lock().unwrap().as_ref() {
            if calls >= *after {
                token.cancel();
            }
        }
    }

    pub fn page_requests(&self) -> usize {
        self.page_cursors.lock().unwrap().len()
    }
}

#[async_trait]
impl NoteApi for ScriptedApi {
    async fn probe(
        &self,
        _credential: &Credential,
        query: &str,
        _page: u32,
    ) -> Result<ApiResponse<Value>, ApiError> {
        self.probe_queries.lock().unwrap().push(query.to_string());
        self.probe
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(ApiResponse::ok("成功", Value::Null)))
    }

    async fn fetch_page(
        &self,
        _credential: &Credential,
        _context: &TaskContext,
        cursor: &Cursor,
    ) -> Result<ApiResponse<Page>, ApiError> {
        self.page_cursors.lock().unwrap().push(cursor.clone());
        self.count_call();
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Scripted::Rejected("no more scripted pages".to_string()))
            .into_result("mock://page")
    }

    async fn fetch_single(
        &self,
        _credential: &Credential,
        note: &NoteRef,
    ) -> Result<ApiResponse<Item>, ApiError> {
        self.single_requests
            .lock()
            .unwrap()
            .push(note.note_id.clone());
        self.count_call();
        self.notes
            .lock()
            .unwrap()
            .get_mut(&note.note_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Scripted::Rejected(format!("note {} not scripted", note.note_id)))
            .into_result("mock://note")
    }
}

/// A list item with the given id
pub(crate) fn item(id: &str) -> Item {
    Item {
        id: id.to_string(),
        title: format!("note {}", id),
        ..Default::default()
    }
}

/// A page of items built from ids
pub(crate) fn page(ids: &[&str], next: Cursor, has_more: bool) -> Page {
    Page {
        items: ids.iter().map(|id| item(id)).collect(),
        next_cursor: next,
        has_more,
    }
}

pub(crate) fn credential() -> Credential {
    Credential::parse("a1=test-identity; web_session=abc").unwrap()
}
