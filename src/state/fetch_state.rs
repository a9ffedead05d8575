//! Paginated fetch lifecycle
//!
//! ```text
//! Idle -> Fetching(1) -> Fetching(n + 1) | Draining | Failed
//! Draining -> Completed
//! ```
//!
//! Pages are requested strictly one after another, so `Fetching` carries the page
//! number currently in flight.
use crate::HarvestError;
use std::fmt;

/// Why a fetch stopped requesting pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrainReason {
    /// The platform signalled there is no more data
    EndOfData,

    /// The requested item count was reached
    TargetReached,

    /// A page request failed; items already retrieved are kept
    PageFailed,

    /// Cancellation was observed at a page boundary
    Cancelled,
}

impl DrainReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EndOfData => "end_of_data",
            Self::TargetReached => "target_reached",
            Self::PageFailed => "page_failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// State of one paginated fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchState {
    // ===== Active States =====
    /// Nothing requested yet
    Idle,

    /// Waiting on the response for `page`
    Fetching { page: u32 },

    /// No further pages will be requested
    Draining { reason: DrainReason },

    // ===== Terminal States =====
    /// Retrieved items were handed off
    Completed,

    /// Stopped on a protocol anomaly
    Failed,
}

impl FetchState {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: &FetchState) -> bool {
        match (self, next) {
            (Self::Idle, Self::Fetching { page }) => *page == 1,
            (Self::Idle, Self::Draining { .. }) => true,
            (Self::Fetching { page }, Self::Fetching { page: next_page }) => {
                *next_page == page + 1
            }
            (Self::Fetching { .. }, Self::Draining { .. }) => true,
            (Self::Fetching { .. }, Self::Failed) => true,
            (Self::Draining { .. }, Self::Completed) => true,
            _ => false,
        }
    }

    /// Moves to `next`, rejecting illegal transitions
    pub fn transition(self, next: FetchState) -> Result<FetchState, HarvestError> {
        if self.can_transition_to(&next) {
            Ok(next)
        } else {
            Err(HarvestError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Page currently in flight, if any
    pub fn page(&self) -> Option<u32> {
        match self {
            Self::Fetching { page } => Some(*page),
            _ => None,
        }
    }
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Fetching { page } => write!(f, "fetching(page={})", page),
            Self::Draining { reason } => write!(f, "draining({})", reason.as_str()),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
