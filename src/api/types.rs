use crate::task::SearchFilters;
use crate::url::{NoteRef, UserRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque pagination token
///
/// The engine never interprets the token; it only compares it with the previous
/// one to detect a stalled cursor. `Cursor::start()` requests the first page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cursor(Option<String>);

impl Cursor {
    pub fn start() -> Self {
        Self(None)
    }

    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn token(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_start(&self) -> bool {
        self.0.is_none()
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(token) => write!(f, "{}", token),
            None => write!(f, "<start>"),
        }
    }
}

/// Outcome of one API call that reached the platform
///
/// `message` is the platform's own message and is carried even on success.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// What a paginated request is about
#[derive(Debug, Clone, PartialEq)]
pub enum TaskContext {
    UserTimeline(UserRef),
    KeywordSearch {
        query: String,
        filters: SearchFilters,
    },
}

/// One page of results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Items in platform order
    pub items: Vec<Item>,

    /// Token for the next request
    pub next_cursor: Cursor,

    /// False once the platform reports no further data
    pub has_more: bool,
}

/// Note flavour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    #[default]
    Normal,
    Video,
}

impl NoteKind {
    pub fn from_api(value: &str) -> Self {
        if value == "video" {
            Self::Video
        } else {
            Self::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Video => "video",
        }
    }
}

/// Note author
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRef {
    pub user_id: String,
    pub nickname: String,
}

/// Interaction counters as displayed by the platform (e.g. `"1.2万"`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interactions {
    pub liked: String,
    pub collected: String,
    pub comments: String,
    pub shares: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// A downloadable media file attached to a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub kind: MediaKind,
    pub url: String,
}

/// A single retrieved note
///
/// `raw` is the platform payload, passed through to sinks verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub xsec_token: Option<String>,
    pub title: String,
    pub description: String,
    pub kind: NoteKind,
    pub author: AuthorRef,
    pub interactions: Interactions,
    /// Publish time, milliseconds since the epoch
    pub published_at: Option<i64>,
    pub ip_location: Option<String>,
    pub tags: Vec<String>,
    pub media: Vec<MediaRef>,
    pub raw: serde_json::Value,
}

impl Item {
    /// Reference used to request this note's detail
    pub fn note_ref(&self) -> NoteRef {
        NoteRef {
            note_id: self.id.clone(),
            xsec_token: self.xsec_token.clone(),
            xsec_source: self.xsec_token.as_ref().map(|_| "pc_search".to_string()),
        }
    }

    /// Canonical web link for this note
    pub fn web_url(&self) -> String {
        crate::url::note_url(&self.id, self.xsec_token.as_deref())
    }
}
