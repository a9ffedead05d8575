use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Every requested item was retrieved (or the data ran out)
    Completed,

    /// Some work failed but at least one item was retrieved
    PartiallyFailed,

    /// Nothing usable was retrieved
    Failed,
}

impl TaskStatus {
    /// Returns true unless the task failed outright
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::PartiallyFailed => "partially_failed",
            Self::Failed => "failed",
        }
    }

    /// Status for a batch with `succeeded` and `failed` item outcomes
    pub fn from_counts(succeeded: usize, failed: usize) -> Self {
        match (succeeded, failed) {
            (_, 0) => Self::Completed,
            (0, _) => Self::Failed,
            _ => Self::PartiallyFailed,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
