//! Session handling
//!
//! - `Credential`: the parsed cookie bundle every API call is authenticated with
//! - `SessionValidator`: a single low-cost probe that decides whether a credential
//!   is still accepted before the host commits to a task

mod cookie;
mod validator;

pub use cookie::{trans_cookies, Credential, IDENTITY_ATTRIBUTE};
pub use validator::{
    classify_probe, has_anomaly_marker, SessionValidator, ValidationOutcome, ANOMALY_MARKERS,
    VALIDATION_KEYWORDS,
};
