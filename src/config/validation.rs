use crate::config::types::{ApiSettings, FetcherSettings, Settings};
use crate::ConfigError;
use url::Url;

/// Validates the entire settings tree
pub fn validate(settings: &Settings) -> Result<(), ConfigError> {
    validate_api_settings(&settings.api)?;
    validate_fetcher_settings(&settings.fetcher)?;
    Ok(())
}

fn validate_api_settings(settings: &ApiSettings) -> Result<(), ConfigError> {
    let url = Url::parse(&settings.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation(format!(
            "base-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if settings.timeout_secs < 1 || settings.timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be between 1 and 300, got {}",
            settings.timeout_secs
        )));
    }

    if settings.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_fetcher_settings(settings: &FetcherSettings) -> Result<(), ConfigError> {
    if settings.sink_queue_capacity < 1 || settings.sink_queue_capacity > 1024 {
        return Err(ConfigError::Validation(format!(
            "sink-queue-capacity must be between 1 and 1024, got {}",
            settings.sink_queue_capacity
        )));
    }

    if settings.page_delay_ms > 60_000 {
        return Err(ConfigError::Validation(format!(
            "page-delay-ms must be <= 60000, got {}",
            settings.page_delay_ms
        )));
    }

    Ok(())
}
