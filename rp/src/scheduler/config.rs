//! Planning configuration

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::DEFAULT_WEEK_COUNT;

/// How auto plans are placed on the calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanPolicy {
    /// First N weeks with any matching capacity get the full demand
    #[default]
    Demand,
    /// Earliest contiguous window whose free capacity covers the demand
    FitCapacity,
}

impl std::fmt::Display for PlanPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Demand => write!(f, "demand"),
            Self::FitCapacity => write!(f, "fit-capacity"),
        }
    }
}

/// Which resources a task draws capacity from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceMatch {
    /// Any resource with the task's function
    #[default]
    Function,
    /// Same function, the task's team among the resource's teams, and the
    /// same employee when the task names one
    Team,
}

impl std::fmt::Display for ResourceMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Function => write!(f, "function"),
            Self::Team => write!(f, "team"),
        }
    }
}

/// Planning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningConfig {
    /// Number of weeks in the grid
    #[serde(rename = "week-count", default = "default_week_count")]
    pub week_count: usize,

    /// Placement policy for auto plans
    #[serde(default)]
    pub policy: PlanPolicy,

    /// How tasks are matched to resources
    #[serde(rename = "resource-match", default)]
    pub resource_match: ResourceMatch,

    /// 0-based week index where scanning starts
    #[serde(rename = "origin-week", default)]
    pub origin_week: usize,

    /// Shift auto plans past their blockers
    #[serde(rename = "respect-blockers", default = "default_respect_blockers")]
    pub respect_blockers: bool,
}

fn default_week_count() -> usize {
    debug!("default_week_count: called");
    DEFAULT_WEEK_COUNT
}

fn default_respect_blockers() -> bool {
    true
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            week_count: DEFAULT_WEEK_COUNT,
            policy: PlanPolicy::Demand,
            resource_match: ResourceMatch::Function,
            origin_week: 0,
            respect_blockers: true,
        }
    }
}
