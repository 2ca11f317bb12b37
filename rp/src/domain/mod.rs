//! Domain types for the planning grid
//!
//! Rows (resources and tasks), reference data (teams, sprints) and the
//! snapshot shape exchanged with the server.

mod catalog;
mod id;
mod row;

pub use catalog::{RoadmapData, Sprint, Team};
pub use id::RowId;
pub use row::{EntityKind, ResourceRow, RowKind, TaskRow, TaskStatus};

/// Default number of weeks shown in the grid
pub const DEFAULT_WEEK_COUNT: usize = 16;
