//! Task model
//!
//! A host request (`TaskRequest`, JSON) is turned into a closed
//! `TaskDescriptor` before any network activity, so unknown task kinds and
//! missing parameters surface as configuration errors up front.

mod descriptor;
mod filters;
mod request;

pub use descriptor::{TaskDescriptor, TaskKind};
pub use filters::{
    DistanceFilter, GeoPoint, NoteRange, NoteTypeFilter, RecencyWindow, SearchFilters, SortOrder,
};
pub use request::{OutputPaths, SaveOptions, TaskRequest, DEFAULT_REQUIRE_NUM};
