//! Settings module for xhs-harvest
//!
//! This module handles loading, parsing, and validating the optional TOML settings
//! file that tunes the API transport and the fetch pipeline.
//!
//! # Example
//!
//! ```no_run
//! use xhs_harvest::config::load_settings;
//! use std::path::Path;
//!
//! let settings = load_settings(Path::new("harvest.toml")).unwrap();
//! println!("Sink queue capacity: {}", settings.fetcher.sink_queue_capacity);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ApiSettings, FetcherSettings, Settings};

// Re-export parser functions
pub use parser::{compute_settings_hash, load_settings, load_settings_with_hash, parse_settings};
