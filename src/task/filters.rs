//! Keyword search filters
//!
//! Filters are passed to every page request unmodified; the engine never filters
//! results on the client side.

use serde::{Deserialize, Serialize};

/// Result ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    General,
    Latest,
    MostLiked,
    MostCommented,
    MostCollected,
}

impl SortOrder {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::General),
            1 => Some(Self::Latest),
            2 => Some(Self::MostLiked),
            3 => Some(Self::MostCommented),
            4 => Some(Self::MostCollected),
            _ => None,
        }
    }

    pub fn api_tag(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Latest => "time_descending",
            Self::MostLiked => "popularity_descending",
            Self::MostCommented => "comment_descending",
            Self::MostCollected => "collect_descending",
        }
    }
}

/// Note type filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NoteTypeFilter {
    #[default]
    Any,
    Video,
    Image,
}

impl NoteTypeFilter {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Any),
            1 => Some(Self::Video),
            2 => Some(Self::Image),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Any => 0,
            Self::Video => 1,
            Self::Image => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Any => "不限",
            Self::Video => "视频笔记",
            Self::Image => "普通笔记",
        }
    }
}

/// Publish time window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecencyWindow {
    #[default]
    Any,
    Day,
    Week,
    HalfYear,
}

impl RecencyWindow {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Any),
            1 => Some(Self::Day),
            2 => Some(Self::Week),
            3 => Some(Self::HalfYear),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Any => "不限",
            Self::Day => "一天内",
            Self::Week => "一周内",
            Self::HalfYear => "半年内",
        }
    }
}

/// Relationship between the viewer and the note
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NoteRange {
    #[default]
    Any,
    Seen,
    Unseen,
    Followed,
}

impl NoteRange {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Any),
            1 => Some(Self::Seen),
            2 => Some(Self::Unseen),
            3 => Some(Self::Followed),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Any => "不限",
            Self::Seen => "已看过",
            Self::Unseen => "未看过",
            Self::Followed => "已关注",
        }
    }
}

/// Distance from `geo`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DistanceFilter {
    #[default]
    Any,
    SameCity,
    Nearby,
}

impl DistanceFilter {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Any),
            1 => Some(Self::SameCity),
            2 => Some(Self::Nearby),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Any => "不限",
            Self::SameCity => "同城",
            Self::Nearby => "附近",
        }
    }
}

/// Searcher location used by distance filters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Everything a keyword search passes to the platform
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    pub sort: SortOrder,
    pub note_type: NoteTypeFilter,
    pub recency: RecencyWindow,
    pub range: NoteRange,
    pub distance: DistanceFilter,
    pub geo: Option<GeoPoint>,
    /// Requested result count; 0 exhausts pagination
    pub require_num: u32,
}

impl SearchFilters {
    pub fn target(&self) -> Option<usize> {
        match self.require_num {
            0 => None,
            n => Some(n as usize),
        }
    }
}
