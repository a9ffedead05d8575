//! Host record stream and item sinks
//!
//! Two kinds of output leave a running task:
//! - [`Record`]s on the host event stream (logs, progress, the terminal record)
//! - collected [`Item`](crate::api::Item)s, handed to [`ItemSink`]s through a
//!   bounded [`SinkDispatcher`]

mod dispatcher;
mod events;
mod media;
mod tabular;
mod traits;
mod writer;

pub use dispatcher::{SinkDispatcher, SinkReport};
pub use events::{channel, EventEmitter, LogLevel, Record};
pub use media::{sanitize_component, MediaSink};
pub use tabular::TabularSink;
pub use traits::{ItemSink, MediaFilter, SaveMode, SinkConfig, SinkError, SinkResult};
pub use writer::{forward_records, write_record};

use reqwest::Client;
use std::sync::Arc;

/// Builds the sinks selected by `config`
///
/// # Arguments
///
/// * `config` - Sink configuration for the task
/// * `client` - HTTP client used for media downloads
///
/// # Returns
///
/// The sinks in write order, tabular first
pub fn build_sinks(config: &SinkConfig, client: Client) -> SinkResult<Vec<Arc<dyn ItemSink>>> {
    let mut sinks: Vec<Arc<dyn ItemSink>> = Vec::new();

    if config.mode.wants_tabular() {
        sinks.push(Arc::new(TabularSink::open(&config.tabular_path())?));
    }
    if config.mode.wants_media() {
        sinks.push(Arc::new(MediaSink::new(client, config.media_dir.clone())));
    }

    Ok(sinks)
}
