//! State module for tracking task progress
//!
//! # Components
//!
//! - `FetchState`: lifecycle of one paginated fetch (idle, fetching, draining, completed, failed)
//! - `DrainReason`: why a fetch stopped requesting pages
//! - `TaskStatus`: terminal status reported for a whole task

mod fetch_state;
mod task_status;

// Re-export main types
pub use fetch_state::{DrainReason, FetchState};
pub use task_status::TaskStatus;
