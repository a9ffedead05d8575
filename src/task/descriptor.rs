use crate::api::TaskContext;
use crate::task::filters::SearchFilters;
use crate::url::{NoteRef, UserRef};
use crate::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Kind of task as named by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Notes,
    User,
    Search,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Notes => "notes",
            Self::User => "user",
            Self::Search => "search",
        }
    }
}

impl FromStr for TaskKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "notes" => Ok(Self::Notes),
            "user" => Ok(Self::User),
            "search" => Ok(Self::Search),
            "" => Err(ConfigError::MissingParameter("taskType".to_string())),
            other => Err(ConfigError::UnknownTaskKind(other.to_string())),
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully validated task
#[derive(Debug, Clone, PartialEq)]
pub enum TaskDescriptor {
    /// Fetch each listed note individually
    FixedNotes(Vec<NoteRef>),

    /// Fetch every note a user has published
    UserTimeline(UserRef),

    /// Fetch keyword search results
    KeywordSearch {
        query: String,
        filters: SearchFilters,
    },
}

impl TaskDescriptor {
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::FixedNotes(_) => TaskKind::Notes,
            Self::UserTimeline(_) => TaskKind::User,
            Self::KeywordSearch { .. } => TaskKind::Search,
        }
    }

    /// Number of items the task asks for, `None` when it should exhaust pagination
    pub fn target_count(&self) -> Option<usize> {
        match self {
            Self::FixedNotes(notes) => Some(notes.len()),
            Self::UserTimeline(_) => None,
            Self::KeywordSearch { filters, .. } => filters.target(),
        }
    }

    /// Notes of a fixed-list task, empty for paginated tasks
    pub fn notes(&self) -> &[NoteRef] {
        match self {
            Self::FixedNotes(notes) => notes,
            _ => &[],
        }
    }

    /// Paginated request context, `None` for tasks fetched note by note
    pub fn context(&self) -> Option<TaskContext> {
        match self {
            Self::FixedNotes(_) => None,
            Self::UserTimeline(user) => Some(TaskContext::UserTimeline(user.clone())),
            Self::KeywordSearch { query, filters } => Some(TaskContext::KeywordSearch {
                query: query.clone(),
                filters: filters.clone(),
            }),
        }
    }
}
