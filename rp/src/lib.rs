//! Roadplan - weekly resource-planning core
//!
//! The data layer behind a planning grid of resources (weekly capacity per
//! function) and tasks (planned employment over a number of weeks).
//!
//! # Modules
//!
//! - [`scheduler`] - auto plans, overload detection, auto/manual authority
//! - [`graph`] - task and week blockers, cycle rejection
//! - [`ordering`] - prev/next row order under drag-and-drop
//! - [`tracker`] - typed change tracking and change logs
//! - [`diff`] - change log between two full snapshots
//! - [`persist`] - debounced, versioned auto-save
//! - [`model`] - row model and the planner that edits it
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod diff;
pub mod domain;
pub mod graph;
pub mod model;
pub mod ordering;
pub mod persist;
pub mod scheduler;
pub mod tracker;

pub use config::Config;
pub use diff::calculate_data_changes;
pub use domain::{EntityKind, ResourceRow, RoadmapData, RowId, RowKind, Sprint, TaskRow, TaskStatus, Team};
pub use model::{ModelError, Planner, RowModel};
pub use persist::{AutoSaveState, AutoSaver, HttpTransport, SaveError, SaveTransport};
pub use scheduler::{PlanPolicy, PlanningConfig, Scheduler};
pub use tracker::{ChangeLog, ChangeTracker};
