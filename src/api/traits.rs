use crate::api::types::{ApiResponse, Cursor, Item, Page, TaskContext};
use crate::session::Credential;
use crate::url::NoteRef;
use async_trait::async_trait;
use thiserror::Error;

/// Failures below the platform's own response
///
/// A call that reaches the platform and is rejected is not an `ApiError`; it is an
/// [`ApiResponse`] with `success == false`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connection { url: String, message: String },

    #[error("HTTP client error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid proxy '{proxy}': {message}")]
    InvalidProxy { proxy: String, message: String },

    #[error("Invalid endpoint: {0}")]
    Endpoint(String),

    #[error("Malformed response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// Authenticated access to the platform
///
/// Implementations must be safe to share; the engine never issues two calls under
/// one credential at the same time.
#[async_trait]
pub trait NoteApi: Send + Sync {
    /// Runs one search page for `query`, used to check a credential
    async fn probe(
        &self,
        credential: &Credential,
        query: &str,
        page: u32,
    ) -> Result<ApiResponse<serde_json::Value>, ApiError>;

    /// Fetches the page addressed by `cursor`
    async fn fetch_page(
        &self,
        credential: &Credential,
        context: &TaskContext,
        cursor: &Cursor,
    ) -> Result<ApiResponse<Page>, ApiError>;

    /// Fetches one note in full
    async fn fetch_single(
        &self,
        credential: &Credential,
        note: &NoteRef,
    ) -> Result<ApiResponse<Item>, ApiError>;
}
