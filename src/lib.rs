//! xhs-harvest: crawl orchestration for note collection
//!
//! This crate turns high-level collection tasks (a fixed list of notes, a user's
//! timeline, a keyword search) into a sequence of paginated, authenticated API
//! calls, validates session cookies before committing to work, and streams
//! progress and result records to the host process.

pub mod api;
pub mod config;
pub mod crawler;
pub mod output;
pub mod session;
pub mod state;
pub mod task;
pub mod url;

use thiserror::Error;

/// Main error type for harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid cookie: {0}")]
    Cookie(#[from] CookieError),

    #[error("API error: {0}")]
    Api(#[from] api::ApiError),

    #[error("Sink error: {0}")]
    Sink(#[from] output::SinkError),

    #[error("Invalid fetch state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::FetchState,
        to: state::FetchState,
    },
}

impl HarvestError {
    /// Stable error code reported to the host in `error` records
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(ConfigError::UnknownTaskKind(_)) => "INVALID_TASK_TYPE",
            Self::Config(ConfigError::MissingParameter(_)) => "MISSING_PARAMETER",
            Self::Config(_) => "INVALID_CONFIG",
            Self::Api(api::ApiError::InvalidProxy { .. }) => "INVALID_CONFIG",
            Self::Cookie(_) => "INVALID_COOKIE",
            _ => "EXECUTION_ERROR",
        }
    }
}

/// Configuration and request errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Malformed task request: {0}")]
    Request(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid task type: {0}")]
    UnknownTaskKind(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter {name}: {message}")]
    InvalidParameter { name: String, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Cookie string parse errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CookieError {
    #[error("cookie is missing the required `{0}` attribute, please capture it again")]
    MissingIdentity(&'static str),
}

/// Platform URL errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("No identifier found in {0}")]
    MissingId(String),

    #[error("Unsupported URL: {0}")]
    Unsupported(String),
}

/// Result type alias for harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Settings;
pub use crawler::{run_task, run_validation, TaskResult, TaskRouter};
pub use output::{EventEmitter, Record};
pub use session::{Credential, SessionValidator, ValidationOutcome};
pub use state::{FetchState, TaskStatus};
pub use task::{TaskDescriptor, TaskRequest};
