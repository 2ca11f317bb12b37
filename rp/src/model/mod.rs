//! Row model and the planner that edits it
//!
//! [`RowModel`] is the single owner of all rows. [`Planner`] is the only
//! way the host mutates it: every edit goes through a planner method that
//! keeps the invariants and reports typed changes to the tracker.

mod planner;
mod rows;

use thiserror::Error;

pub use planner::Planner;
pub use rows::RowModel;

use crate::graph::GraphError;
use crate::ordering::OrderError;

/// Errors from planner operations
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Row not found: {0}")]
    UnknownRow(String),

    #[error("Week {week} is outside the grid (0..{week_count})")]
    WeekOutOfRange { week: usize, week_count: usize },

    #[error("Expected {expected} weeks, got {got}")]
    WrongWeekCount { got: usize, expected: usize },

    #[error("Invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: f64 },

    #[error("Field {0} cannot be set directly")]
    ManagedField(&'static str),

    #[error("{kind} already exists: {key}")]
    Duplicate { kind: &'static str, key: String },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    /// Whether the request was rejected by validation (nothing changed)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ModelError::Graph(_)
                | ModelError::Order(OrderError::KindMismatch { .. })
                | ModelError::ManagedField(_)
                | ModelError::WrongWeekCount { .. }
                | ModelError::InvalidValue { .. }
        )
    }
}
