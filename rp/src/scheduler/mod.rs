//! Scheduler
//!
//! Computes auto plans from `planEmpl`/`planWeeks`, flags advisory
//! overload, and defines the auto/manual authority over a task's weeks.

mod calendar;
mod config;
mod core;
mod mode;
mod overload;
mod plan;

pub use self::core::{Scheduler, TaskPlan};
pub use calendar::SprintCalendar;
pub use config::{PlanPolicy, PlanningConfig, ResourceMatch};
pub use mode::{AutoPlanMode, Confirm, ConfirmDiscard, DISCARD_MANUAL_PROMPT, ToggleOutcome};
pub use overload::{compute_overload, overload_weeks, resource_load};
pub use plan::{AutoPlan, compute_auto_plan, matching_capacity, plans_match, resource_matches};
