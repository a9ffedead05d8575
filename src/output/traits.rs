//! Sink traits and types
//!
//! Collected items leave the crawler through [`ItemSink`] implementations. Sinks
//! are selected from the request's save mode and only ever see items through the
//! dispatcher.

use crate::api::{Item, NoteKind};
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while persisting items
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to serialize item: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Download of {url} failed with HTTP {status}")]
    Download { url: String, status: u16 },

    #[error("Failed to lock store: {0}")]
    Lock(String),

    #[error("Sink dispatcher is closed")]
    Closed,
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Which sinks a task writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    TabularOnly,
    MediaOnly,
    Both,
    None,
}

impl SaveMode {
    pub fn wants_tabular(&self) -> bool {
        matches!(self, Self::TabularOnly | Self::Both)
    }

    pub fn wants_media(&self) -> bool {
        matches!(self, Self::MediaOnly | Self::Both)
    }
}

/// Which notes the media sink downloads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MediaFilter {
    #[default]
    All,
    VideoOnly,
    ImageOnly,
}

impl MediaFilter {
    pub fn accepts(&self, kind: NoteKind) -> bool {
        match self {
            Self::All => true,
            Self::VideoOnly => kind == NoteKind::Video,
            Self::ImageOnly => kind == NoteKind::Normal,
        }
    }
}

/// Per-task sink configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkConfig {
    pub mode: SaveMode,
    pub media_filter: MediaFilter,

    /// Root directory for downloaded media
    pub media_dir: PathBuf,

    /// Directory holding the tabular store
    pub tabular_dir: PathBuf,

    /// Name of the tabular store, without extension
    pub table_name: String,
}

impl SinkConfig {
    /// Path of the SQLite file backing the tabular sink
    pub fn tabular_path(&self) -> PathBuf {
        self.tabular_dir.join(format!(
            "{}.sqlite",
            crate::output::sanitize_component(&self.table_name)
        ))
    }
}

/// Trait for item persistence back ends
///
/// Writes for one task are serialized by the dispatcher, so implementations see
/// items in collection order.
#[async_trait]
pub trait ItemSink: Send + Sync {
    /// Short name used in log records
    fn name(&self) -> &'static str;

    /// Persists one item
    async fn write(&self, item: &Item, config: &SinkConfig) -> SinkResult<()>;

    /// Called once after the last item of the task
    async fn finish(&self) -> SinkResult<()> {
        Ok(())
    }
}
