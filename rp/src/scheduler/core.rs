//! Scheduler - plans every task of the grid in dependency order

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use super::calendar::SprintCalendar;
use super::config::{PlanningConfig, ResourceMatch};
use super::plan::{AutoPlan, compute_auto_plan};
use crate::domain::{ResourceRow, RowId, Sprint, TaskRow};
use crate::graph::topological_order;

/// Planned values for one task, including derived fields
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPlan {
    pub task_id: RowId,
    pub weeks: Vec<f64>,
    pub fact: f64,
    pub start_week: Option<u32>,
    pub end_week: Option<u32>,
    pub expected_start_week: Option<u32>,
    pub sprints_auto: Vec<String>,
}

/// Computes auto plans using the configured policy
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    config: PlanningConfig,
}

impl Scheduler {
    pub fn new(config: PlanningConfig) -> Self {
        debug!(?config, "Scheduler::new: called");
        Self { config }
    }

    pub fn config(&self) -> &PlanningConfig {
        &self.config
    }

    pub fn week_count(&self) -> usize {
        self.config.week_count
    }

    /// Auto plan for one task from the configured origin, ignoring other tasks
    pub fn compute_auto_plan(&self, task: &TaskRow, resources: &[ResourceRow]) -> AutoPlan {
        compute_auto_plan(
            task,
            resources,
            self.config.week_count,
            self.config.origin_week,
            self.config.policy,
            self.config.resource_match,
            &[],
        )
    }

    /// Key under which tasks drawing on the same resources pool their load
    fn load_key(&self, task: &TaskRow) -> String {
        match self.config.resource_match {
            ResourceMatch::Function => task.function.clone(),
            ResourceMatch::Team => format!(
                "{}|{}|{}",
                task.function,
                task.team.trim(),
                task.empl.as_deref().unwrap_or_default()
            ),
        }
    }

    /// Earliest 0-based week index allowed by blockers
    ///
    /// `ends` maps already planned task ids to their last planned week index.
    /// Returns None when nothing constrains the task.
    pub fn blocker_origin(&self, task: &TaskRow, ends: &HashMap<&str, Option<usize>>) -> Option<usize> {
        let after_tasks = task
            .blocker_ids
            .iter()
            .filter_map(|b| ends.get(b.as_str()).copied().flatten())
            .map(|last| last + 1);
        // Week w (1-based) is index w-1, so planning may start at index w
        let after_weeks = task.week_blockers.iter().map(|w| *w as usize);
        let origin = after_tasks.chain(after_weeks).max();
        debug!(task_id = %task.id, ?origin, "blocker_origin: called");
        origin
    }

    /// Plan every task in blocker order
    ///
    /// Auto tasks get a fresh plan; manual tasks keep their vector. Both
    /// contribute load and constrain the tasks they block. Results are in
    /// the same order as `tasks`.
    pub fn recompute_all(&self, tasks: &[TaskRow], resources: &[ResourceRow], sprints: &[Sprint]) -> Vec<TaskPlan> {
        debug!(task_count = tasks.len(), "recompute_all: called");
        let week_count = self.config.week_count;
        let calendar = SprintCalendar::new(sprints);
        let mut ends: HashMap<&str, Option<usize>> = HashMap::new();
        let mut load: HashMap<String, Vec<f64>> = HashMap::new();
        let mut plans: Vec<Option<TaskPlan>> = vec![None; tasks.len()];

        for idx in topological_order(tasks) {
            let task = &tasks[idx];
            let blocked_from = self.blocker_origin(task, &ends);
            let origin = match blocked_from {
                Some(b) if self.config.respect_blockers => b.max(self.config.origin_week),
                _ => self.config.origin_week,
            };

            let group_load = load.entry(self.load_key(task)).or_insert_with(|| vec![0.0; week_count]);
            let plan = if task.auto_plan_enabled {
                debug!(task_id = %task.id, origin, "recompute_all: auto task");
                compute_auto_plan(
                    task,
                    resources,
                    week_count,
                    origin,
                    self.config.policy,
                    self.config.resource_match,
                    group_load,
                )
            } else {
                debug!(task_id = %task.id, "recompute_all: manual task keeps its plan");
                AutoPlan::from_weeks(task.weeks.clone())
            };

            for (slot, value) in group_load.iter_mut().zip(&plan.weeks) {
                *slot += value;
            }
            ends.insert(task.id.as_str(), plan.end_week.map(|w| w as usize - 1));

            let fact = plan.fact();
            let sprints_auto = calendar.sprints_between(plan.start_week, plan.end_week);
            plans[idx] = Some(TaskPlan {
                task_id: task.id.clone(),
                expected_start_week: blocked_from.map(|w| w as u32 + 1),
                fact,
                start_week: plan.start_week,
                end_week: plan.end_week,
                weeks: plan.weeks,
                sprints_auto,
            });
        }

        plans.into_iter().flatten().collect()
    }
}
