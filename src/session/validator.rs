//! Credential validation probe
//!
//! A credential is checked with one search request for a single page. The query
//! is drawn at random from a pool of popular search terms so the probe looks
//! like ordinary browsing traffic.

use crate::api::{ApiError, ApiResponse, NoteApi};
use crate::output::EventEmitter;
use crate::session::Credential;
use rand::seq::SliceRandom;
use serde_json::Value;
use std::sync::Arc;

/// Popular search terms used as probe queries
pub const VALIDATION_KEYWORDS: &[&str] = &[
    "美食",
    "穿搭",
    "美妆",
    "旅行",
    "健身",
    "护肤",
    "摄影",
    "减肥",
    "家居",
    "宠物",
    "发型",
    "好物分享",
    "日常vlog",
    "读书",
    "手工",
];

/// Message fragments the platform uses when it has flagged an account
pub const ANOMALY_MARKERS: &[&str] = &["账号异常", "检测到账号异常"];

const VALID_MESSAGE: &str = "Cookie有效";
const REJECTED_MESSAGE: &str = "Cookie无效或已过期";
const ANOMALY_MESSAGE: &str = "检测到账号异常，Cookie已失效";

/// Result of probing a credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Invalid { reason: String },
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Message reported to the host
    pub fn message(&self) -> &str {
        match self {
            Self::Valid => VALID_MESSAGE,
            Self::Invalid { reason } => reason,
        }
    }
}

/// Returns true if `message` carries an anomaly phrase or a negative status code
pub fn has_anomaly_marker(message: &str) -> bool {
    ANOMALY_MARKERS.iter().any(|marker| message.contains(marker))
        || has_negative_code(message)
}

fn has_negative_code(message: &str) -> bool {
    message.match_indices("code=-").any(|(start, matched)| {
        message[start + matched.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit())
    })
}

/// Classifies the outcome of a probe request
///
/// Transport errors and rejected responses are invalid. An anomaly marker in
/// the message makes the probe invalid even when the platform reported success.
pub fn classify_probe(result: Result<ApiResponse<Value>, ApiError>) -> ValidationOutcome {
    let response = match result {
        Ok(response) => response,
        Err(e) => {
            return ValidationOutcome::Invalid {
                reason: format!("验证请求失败: {}", e),
            }
        }
    };

    if has_anomaly_marker(&response.message) {
        return ValidationOutcome::Invalid {
            reason: ANOMALY_MESSAGE.to_string(),
        };
    }

    if response.success {
        return ValidationOutcome::Valid;
    }

    let message = response.message.trim();
    let reason = if message.is_empty() || message == "'msg'" {
        REJECTED_MESSAGE.to_string()
    } else {
        message.to_string()
    };
    ValidationOutcome::Invalid { reason }
}

/// Probes credentials and reports the outcome on the event stream
pub struct SessionValidator {
    api: Arc<dyn NoteApi>,
    emitter: EventEmitter,
}

impl SessionValidator {
    pub fn new(api: Arc<dyn NoteApi>, emitter: EventEmitter) -> Self {
        Self { api, emitter }
    }

    fn pick_keyword(&self) -> &'static str {
        VALIDATION_KEYWORDS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(VALIDATION_KEYWORDS[0])
    }

    /// Issues one probe and emits a `validation_result` record
    ///
    /// # Arguments
    ///
    /// * `credential` - The parsed credential to check
    ///
    /// # Returns
    ///
    /// The classified outcome. Nothing is retried.
    pub async fn validate(&self, credential: &Credential) -> ValidationOutcome {
        let keyword = self.pick_keyword();
        self.emitter
            .debug(format!("Validating cookie with search probe '{}'", keyword));

        let outcome = classify_probe(self.api.probe(credential, keyword, 1).await);
        match &outcome {
            ValidationOutcome::Valid => tracing::info!("Cookie accepted"),
            ValidationOutcome::Invalid { reason } => tracing::warn!("Cookie rejected: {}", reason),
        }

        self.emitter
            .validation_result(outcome.is_valid(), outcome.message());
        outcome
    }
}
