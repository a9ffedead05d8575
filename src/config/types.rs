use serde::Deserialize;
use std::time::Duration;

/// Default platform API host
pub const DEFAULT_BASE_URL: &str = "https://edith.xiaohongshu.com";

/// Default desktop browser user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Main settings structure for xhs-harvest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub fetcher: FetcherSettings,
}

/// API transport settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    /// Base URL every API path is resolved against
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Whole-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent header value
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Fetch pipeline behavior
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherSettings {
    /// Pause between consecutive list page requests (milliseconds)
    ///
    /// Per-note requests of a fixed note list and detail lookups are not delayed.
    #[serde(rename = "page-delay-ms", default)]
    pub page_delay_ms: u64,

    /// Number of items that may wait for the sinks before the fetch loop stalls
    #[serde(rename = "sink-queue-capacity", default = "default_sink_queue_capacity")]
    pub sink_queue_capacity: usize,

    /// Fetch the full note for every list entry before dispatching it
    #[serde(rename = "fetch-details", default = "default_fetch_details")]
    pub fetch_details: bool,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            page_delay_ms: 0,
            sink_queue_capacity: default_sink_queue_capacity(),
            fetch_details: default_fetch_details(),
        }
    }
}

impl FetcherSettings {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_sink_queue_capacity() -> usize {
    32
}

fn default_fetch_details() -> bool {
    true
}
