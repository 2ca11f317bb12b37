//! Auto-plan computation for a single task

use serde::Serialize;
use tracing::debug;

use super::config::{PlanPolicy, ResourceMatch};
use crate::domain::{ResourceRow, TaskRow};

/// Tolerance for capacity comparisons
pub(crate) const EPSILON: f64 = 1e-9;

/// A computed weekly allocation with its bounds
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoPlan {
    pub weeks: Vec<f64>,
    /// 1-based first planned week
    pub start_week: Option<u32>,
    /// 1-based last planned week
    pub end_week: Option<u32>,
}

impl AutoPlan {
    /// Plan with every week at zero
    pub fn empty(week_count: usize) -> Self {
        Self {
            weeks: vec![0.0; week_count],
            start_week: None,
            end_week: None,
        }
    }

    /// Derive bounds from an allocation vector
    pub fn from_weeks(weeks: Vec<f64>) -> Self {
        let start_week = weeks.iter().position(|w| *w > 0.0).map(|i| i as u32 + 1);
        let end_week = weeks.iter().rposition(|w| *w > 0.0).map(|i| i as u32 + 1);
        Self {
            weeks,
            start_week,
            end_week,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start_week.is_none()
    }

    /// Total planned effort
    pub fn fact(&self) -> f64 {
        self.weeks.iter().sum()
    }
}

/// Whether `resource` can take work of `task`
pub fn resource_matches(resource: &ResourceRow, task: &TaskRow, matching: ResourceMatch) -> bool {
    if resource.function != task.function {
        return false;
    }
    match matching {
        ResourceMatch::Function => true,
        ResourceMatch::Team => {
            let team = task.team.trim();
            let same_empl = match (&task.empl, &resource.empl) {
                (Some(wanted), Some(have)) => wanted == have,
                (Some(_), None) => false,
                (None, _) => true,
            };
            resource.team.iter().any(|t| t == team) && same_empl
        }
    }
}

/// Summed availability of resources matching the task
pub fn matching_capacity(
    task: &TaskRow,
    resources: &[ResourceRow],
    week_count: usize,
    matching: ResourceMatch,
) -> Vec<f64> {
    let mut capacity = vec![0.0; week_count];
    for resource in resources.iter().filter(|r| resource_matches(r, task, matching)) {
        for (week, slot) in capacity.iter_mut().enumerate() {
            *slot += resource.availability(week);
        }
    }
    capacity
}

/// Compute the auto plan for `task` starting at `origin`
///
/// `load` is the demand already placed on the task's function by other
/// tasks; only [`PlanPolicy::FitCapacity`] looks at it.
pub fn compute_auto_plan(
    task: &TaskRow,
    resources: &[ResourceRow],
    week_count: usize,
    origin: usize,
    policy: PlanPolicy,
    matching: ResourceMatch,
    load: &[f64],
) -> AutoPlan {
    debug!(
        task_id = %task.id,
        plan_empl = task.plan_empl,
        plan_weeks = task.plan_weeks,
        origin,
        %policy,
        %matching,
        "compute_auto_plan: called"
    );
    let demand = task.plan_empl;
    let span = task.plan_weeks as usize;
    if !demand.is_finite() || demand <= 0.0 || span == 0 {
        debug!("compute_auto_plan: no usable demand or duration, empty plan");
        return AutoPlan::empty(week_count);
    }

    let capacity = matching_capacity(task, resources, week_count, matching);
    let mut weeks = vec![0.0; week_count];

    match policy {
        PlanPolicy::Demand => {
            debug!("compute_auto_plan: Demand branch");
            let eligible = (origin..week_count).filter(|w| capacity[*w] > EPSILON).take(span);
            for week in eligible {
                weeks[week] = demand;
            }
        }
        PlanPolicy::FitCapacity => {
            debug!("compute_auto_plan: FitCapacity branch");
            let free = |w: usize| capacity[w] - load.get(w).copied().unwrap_or(0.0);
            let window = (origin..=week_count.saturating_sub(span))
                .filter(|s| s + span <= week_count)
                .find(|s| (*s..*s + span).all(|w| free(w) + EPSILON >= demand));
            match window {
                Some(start) => {
                    debug!(start, "compute_auto_plan: window found");
                    weeks[start..start + span].iter_mut().for_each(|w| *w = demand);
                }
                None => debug!("compute_auto_plan: no window fits"),
            }
        }
    }

    AutoPlan::from_weeks(weeks)
}

/// Whether two allocation vectors are equal within rounding
pub fn plans_match(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-3)
}
