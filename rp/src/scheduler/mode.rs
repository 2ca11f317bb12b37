//! Auto/manual authority over a task's weekly plan

use tracing::debug;

use crate::domain::{RowId, TaskRow};

/// Prompt shown before a manual plan is replaced
pub const DISCARD_MANUAL_PROMPT: &str = "Enable auto plan? The current manual plan will be overwritten.";

/// Which authority owns a task's weeks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoPlanMode {
    Auto,
    Manual,
}

impl AutoPlanMode {
    pub fn of(task: &TaskRow) -> Self {
        if task.auto_plan_enabled { Self::Auto } else { Self::Manual }
    }
}

impl std::fmt::Display for AutoPlanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// Pending Manual -> Auto switch that discards manual work
///
/// Hand it back to the planner to accept; drop it to decline.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "the switch only happens when the confirmation is accepted"]
pub struct ConfirmDiscard {
    pub task_id: RowId,
    pub prompt: &'static str,
}

impl ConfirmDiscard {
    pub(crate) fn new(task_id: RowId) -> Self {
        debug!(%task_id, "ConfirmDiscard::new: called");
        Self {
            task_id,
            prompt: DISCARD_MANUAL_PROMPT,
        }
    }
}

/// Result of a toggle request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Already in the requested mode
    Unchanged,
    Enabled,
    Disabled,
    /// Enabling would discard a manual plan; ask the user first
    NeedsConfirmation(ConfirmDiscard),
}

/// Yes/no capability supplied by the host
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}
