//! Task dependency graph
//!
//! Tasks can be blocked by other tasks (an edge task -> blocker) or by a
//! calendar week. Task-to-task edges must stay acyclic; every accepted
//! mutation is reported to the change tracker.

mod blockers;
mod cycles;
mod links;

use thiserror::Error;

pub use blockers::{add_blocker, add_week_blocker, can_set_blocker, remove_blocker, remove_week_blocker};
pub use cycles::{topological_order, validate_graph};
pub use links::{BlockerLink, BlockerSource, blocker_links};

/// Errors from blocker mutations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("Task {0} cannot block itself")]
    SelfBlock(String),

    #[error("Blocking {task} by {blocker} would create a cycle")]
    WouldCycle { task: String, blocker: String },

    #[error("Task not found: {0}")]
    UnknownTask(String),
}
