//! Platform URL handling
//!
//! Hosts pass notes and users either as share links copied from the platform or as
//! bare identifiers. This module extracts the identifiers and the `xsec_*` access
//! tokens the API requires, and builds canonical links for export.

mod links;
mod refs;

pub use links::{note_url, user_profile_url, WEB_ORIGIN};
pub use refs::{parse_note_ref, parse_user_ref};

/// Reference to a single note
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NoteRef {
    /// Platform note identifier
    pub note_id: String,

    /// Access token carried by share links
    pub xsec_token: Option<String>,

    /// Where the token was issued (e.g. `pc_search`, `pc_user`)
    pub xsec_source: Option<String>,
}

impl NoteRef {
    /// Creates a reference from a bare id with no access token
    pub fn new(note_id: impl Into<String>) -> Self {
        Self {
            note_id: note_id.into(),
            xsec_token: None,
            xsec_source: None,
        }
    }

    /// Attaches an access token
    pub fn with_token(mut self, token: impl Into<String>, source: impl Into<String>) -> Self {
        self.xsec_token = Some(token.into());
        self.xsec_source = Some(source.into());
        self
    }
}

/// Reference to a user profile
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserRef {
    /// Platform user identifier
    pub user_id: String,

    /// Access token carried by share links
    pub xsec_token: Option<String>,

    /// Where the token was issued
    pub xsec_source: Option<String>,
}

impl UserRef {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            xsec_token: None,
            xsec_source: None,
        }
    }
}
