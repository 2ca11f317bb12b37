//! Planner - the host-facing editor over the row model
//!
//! Every mutation keeps the model invariants (week vector length, acyclic
//! blockers, consistent order chains, auto plans in sync) and reports typed
//! changes to the [`ChangeTracker`].

use serde::Serialize;
use tracing::{debug, info, warn};

use super::{ModelError, RowModel};
use crate::domain::{EntityKind, RoadmapData, ResourceRow, RowId, RowKind, Sprint, TaskRow, Team};
use crate::graph::{self, BlockerLink};
use crate::ordering::{DropSide, LinkChange, LinkField, OrderError, OrderedRow, move_row, relink};
use crate::scheduler::{
    AutoPlan, AutoPlanMode, Confirm, ConfirmDiscard, PlanningConfig, Scheduler, ToggleOutcome, compute_overload,
    overload_weeks, plans_match,
};
use crate::tracker::{
    Cell, ChangeTracker, ResourceField, ResourceValue, RowAction, SprintValue, TaskField, TaskValue, TeamValue,
};

type CellChange = (String, Cell, Cell);

/// Convert pointer changes into tracker field changes
fn link_cells(kind: RowKind, changes: impl IntoIterator<Item = LinkChange>) -> Vec<CellChange> {
    changes
        .into_iter()
        .map(|c| {
            let (old, new): (Cell, Cell) = match (kind, c.field) {
                (RowKind::Task, LinkField::Prev) => (TaskValue::PrevId(c.old).into(), TaskValue::PrevId(c.new).into()),
                (RowKind::Task, LinkField::Next) => (TaskValue::NextId(c.old).into(), TaskValue::NextId(c.new).into()),
                (RowKind::Resource, LinkField::Prev) => {
                    (ResourceValue::PrevId(c.old).into(), ResourceValue::PrevId(c.new).into())
                }
                (RowKind::Resource, LinkField::Next) => {
                    (ResourceValue::NextId(c.old).into(), ResourceValue::NextId(c.new).into())
                }
            };
            (c.id.to_string(), old, new)
        })
        .collect()
}

/// Insert a row, relink its kind and report the creation
fn insert_row<R>(
    rows: &mut Vec<R>,
    row: R,
    at: usize,
    kind: RowKind,
    tracker: &ChangeTracker,
) -> Result<RowId, ModelError>
where
    R: OrderedRow + Serialize,
{
    let id = row.id().clone();
    let at = at.min(rows.len());
    debug!(%id, at, %kind, "insert_row: called");
    rows.insert(at, row);

    // The new row's own pointers travel inside its added object
    let others: Vec<LinkChange> = relink(rows).into_iter().filter(|c| c.id != id).collect();
    tracker.add_row_change(kind.entity(), id.as_str(), RowAction::added(&rows[at])?);
    tracker.add_cell_changes(link_cells(kind, others));
    Ok(id)
}

/// Remove a row, relink its kind and report the deletion
fn remove_row<R: OrderedRow>(rows: &mut Vec<R>, idx: usize, kind: RowKind, tracker: &ChangeTracker) -> R {
    let row = rows.remove(idx);
    debug!(id = %row.id(), %kind, "remove_row: called");
    tracker.add_row_change(kind.entity(), row.id().as_str(), RowAction::Deleted);
    let changes = relink(rows);
    tracker.add_cell_changes(link_cells(kind, changes));
    row
}

/// Editor over a [`RowModel`] that reports every change
#[derive(Debug)]
pub struct Planner {
    model: RowModel,
    tracker: ChangeTracker,
    scheduler: Scheduler,
}

impl Planner {
    /// Load a snapshot; order repairs are recorded as changes
    pub fn new(data: RoadmapData, config: PlanningConfig, tracker: ChangeTracker) -> Self {
        debug!(version = data.version, "Planner::new: called");
        let (model, repairs) = RowModel::from_data(data, config.week_count);
        let planner = Self {
            model,
            tracker,
            scheduler: Scheduler::new(config),
        };
        planner.track_repairs(repairs);
        planner
    }

    /// Planner over an empty grid
    pub fn empty(config: PlanningConfig) -> Self {
        Self::new(RoadmapData::default(), config, ChangeTracker::new())
    }

    /// Replace all rows with a fresh snapshot, dropping pending changes
    pub fn reload(&mut self, data: RoadmapData) {
        info!(version = data.version, "Reloading snapshot");
        self.tracker.clear_changes();
        let (model, repairs) = RowModel::from_data(data, self.scheduler.week_count());
        self.model = model;
        self.track_repairs(repairs);
    }

    fn track_repairs(&self, repairs: Vec<(RowKind, LinkChange)>) {
        let cells: Vec<CellChange> = repairs
            .into_iter()
            .flat_map(|(kind, change)| link_cells(kind, [change]))
            .collect();
        self.tracker.add_cell_changes(cells);
    }

    pub fn model(&self) -> &RowModel {
        &self.model
    }

    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn to_data(&self) -> RoadmapData {
        self.model.to_data()
    }

    /// Adopt a version returned by the server
    pub fn set_version(&mut self, version: u64) {
        self.model.set_version(version);
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.tracker.has_unsaved_changes()
    }

    fn task_idx(&self, id: &str) -> Result<usize, ModelError> {
        self.model
            .task_index(id)
            .ok_or_else(|| ModelError::UnknownRow(id.to_string()))
    }

    fn resource_idx(&self, id: &str) -> Result<usize, ModelError> {
        self.model
            .resource_index(id)
            .ok_or_else(|| ModelError::UnknownRow(id.to_string()))
    }

    fn check_week(&self, week: usize) -> Result<(), ModelError> {
        let week_count = self.model.week_count;
        if week >= week_count {
            return Err(ModelError::WeekOutOfRange { week, week_count });
        }
        Ok(())
    }

    // === Queries ===

    /// Auto plan for one task from the configured origin
    pub fn compute_auto_plan(&self, task_id: &str) -> Result<AutoPlan, ModelError> {
        let task = &self.model.tasks[self.task_idx(task_id)?];
        Ok(self.scheduler.compute_auto_plan(task, &self.model.resources))
    }

    pub fn compute_overload(&self, resource_id: &str, week: usize) -> Result<bool, ModelError> {
        let resource = &self.model.resources[self.resource_idx(resource_id)?];
        Ok(compute_overload(resource, &self.model.tasks, week))
    }

    pub fn overload_weeks(&self, resource_id: &str) -> Result<Vec<bool>, ModelError> {
        let resource = &self.model.resources[self.resource_idx(resource_id)?];
        Ok(overload_weeks(resource, &self.model.tasks))
    }

    pub fn can_set_blocker(&self, task_id: &str, blocker_id: &str) -> bool {
        graph::can_set_blocker(&self.model.tasks, task_id, blocker_id)
    }

    pub fn blocker_links(&self) -> Vec<BlockerLink> {
        graph::blocker_links(&self.model.tasks)
    }

    // === Planning ===

    /// Recompute auto plans and derived fields, recording what changed
    ///
    /// Manual tasks keep their weeks. Returns the number of changed fields.
    pub fn replan(&mut self) -> usize {
        debug!("replan: called");
        let plans = self
            .scheduler
            .recompute_all(&self.model.tasks, &self.model.resources, &self.model.sprints);
        let mut changes: Vec<CellChange> = Vec::new();

        for (task, plan) in self.model.tasks.iter_mut().zip(plans) {
            debug_assert_eq!(task.id, plan.task_id);
            let mut updates = vec![
                TaskValue::Fact(plan.fact),
                TaskValue::StartWeek(plan.start_week),
                TaskValue::EndWeek(plan.end_week),
                TaskValue::ExpectedStartWeek(plan.expected_start_week),
                TaskValue::SprintsAuto(plan.sprints_auto),
            ];
            if task.auto_plan_enabled {
                updates.push(TaskValue::Weeks(plan.weeks));
            }
            for new in updates {
                let old = TaskValue::read(task, new.field());
                if old != new {
                    new.clone().apply(task);
                    changes.push((task.id.to_string(), old.into(), new.into()));
                }
            }
        }

        let recorded = self.tracker.add_cell_changes(changes);
        debug!(recorded, "replan: complete");
        recorded
    }

    // === Rows ===

    fn ensure_new_id(&self, id: &RowId) -> Result<(), ModelError> {
        if self.model.kind_of(id.as_str()).is_some() {
            return Err(ModelError::Duplicate {
                kind: "row",
                key: id.to_string(),
            });
        }
        Ok(())
    }

    fn insert_resource(&mut self, mut resource: ResourceRow, at: usize) -> Result<RowId, ModelError> {
        self.ensure_new_id(&resource.id)?;
        resource.weeks.resize(self.model.week_count, 0.0);
        resource.prev_id = None;
        resource.next_id = None;
        let id = insert_row(&mut self.model.resources, resource, at, RowKind::Resource, &self.tracker)?;
        self.replan();
        Ok(id)
    }

    fn insert_task(&mut self, mut task: TaskRow, at: usize) -> Result<RowId, ModelError> {
        self.ensure_new_id(&task.id)?;
        if task.blocker_ids.iter().any(|b| *b == task.id) {
            return Err(graph::GraphError::SelfBlock(task.id.to_string()).into());
        }
        if let Some(missing) = task.blocker_ids.iter().find(|b| self.model.task(b.as_str()).is_none()) {
            return Err(graph::GraphError::UnknownTask(missing.to_string()).into());
        }
        task.weeks.resize(self.model.week_count, 0.0);
        task.prev_id = None;
        task.next_id = None;
        let id = insert_row(&mut self.model.tasks, task, at, RowKind::Task, &self.tracker)?;
        self.replan();
        Ok(id)
    }

    /// Append a resource at the bottom of the resources
    pub fn add_resource(&mut self, resource: ResourceRow) -> Result<RowId, ModelError> {
        debug!(id = %resource.id, "add_resource: called");
        let at = self.model.resources.len();
        self.insert_resource(resource, at)
    }

    /// Append a task at the bottom of the tasks
    pub fn add_task(&mut self, task: TaskRow) -> Result<RowId, ModelError> {
        debug!(id = %task.id, "add_task: called");
        let at = self.model.tasks.len();
        self.insert_task(task, at)
    }

    fn add_blank_row(&mut self, target: &str, offset: usize) -> Result<RowId, ModelError> {
        let week_count = self.model.week_count;
        match self.model.kind_of(target) {
            Some(RowKind::Task) => {
                let at = self.task_idx(target)? + offset;
                self.insert_task(TaskRow::new("", "", week_count), at)
            }
            Some(RowKind::Resource) => {
                let at = self.resource_idx(target)? + offset;
                self.insert_resource(ResourceRow::new("", week_count), at)
            }
            None => Err(ModelError::UnknownRow(target.to_string())),
        }
    }

    /// Insert a blank row of the target's kind right before it
    pub fn add_row_above(&mut self, target: &str) -> Result<RowId, ModelError> {
        debug!(%target, "add_row_above: called");
        self.add_blank_row(target, 0)
    }

    /// Insert a blank row of the target's kind right after it
    pub fn add_row_below(&mut self, target: &str) -> Result<RowId, ModelError> {
        debug!(%target, "add_row_below: called");
        self.add_blank_row(target, 1)
    }

    /// Copy a row (with a new id) right after its source
    pub fn duplicate_row(&mut self, id: &str) -> Result<RowId, ModelError> {
        debug!(%id, "duplicate_row: called");
        match self.model.kind_of(id) {
            Some(RowKind::Task) => {
                let idx = self.task_idx(id)?;
                let mut copy = self.model.tasks[idx].clone();
                copy.id = RowId::generate();
                self.insert_task(copy, idx + 1)
            }
            Some(RowKind::Resource) => {
                let idx = self.resource_idx(id)?;
                let mut copy = self.model.resources[idx].clone();
                copy.id = RowId::generate();
                self.insert_resource(copy, idx + 1)
            }
            None => Err(ModelError::UnknownRow(id.to_string())),
        }
    }

    /// Delete a row; a deleted task is also removed from every blocker list
    pub fn delete_row(&mut self, id: &str) -> Result<(), ModelError> {
        debug!(%id, "delete_row: called");
        match self.model.kind_of(id) {
            Some(RowKind::Task) => {
                let idx = self.task_idx(id)?;
                remove_row(&mut self.model.tasks, idx, RowKind::Task, &self.tracker);

                let mut changes: Vec<CellChange> = Vec::new();
                for task in self.model.tasks.iter_mut().filter(|t| t.blocker_ids.iter().any(|b| b == id)) {
                    let old = task.blocker_ids.clone();
                    task.blocker_ids.retain(|b| b != id);
                    changes.push((
                        task.id.to_string(),
                        TaskValue::BlockerIds(old).into(),
                        TaskValue::BlockerIds(task.blocker_ids.clone()).into(),
                    ));
                }
                self.tracker.add_cell_changes(changes);
            }
            Some(RowKind::Resource) => {
                let idx = self.resource_idx(id)?;
                remove_row(&mut self.model.resources, idx, RowKind::Resource, &self.tracker);
            }
            None => return Err(ModelError::UnknownRow(id.to_string())),
        }
        info!(%id, "Row deleted");
        self.replan();
        Ok(())
    }

    // === Fields ===

    /// Set a task field edited in the grid
    ///
    /// Blockers, order pointers, the auto-plan flag and derived fields have
    /// their own operations. Returns false when the value did not change.
    pub fn set_task_field(&mut self, id: &str, value: TaskValue) -> Result<bool, ModelError> {
        let field = value.field();
        debug!(%id, field = field.key(), "set_task_field: called");
        match field {
            TaskField::Weeks => {
                let TaskValue::Weeks(weeks) = value else {
                    return Err(ModelError::ManagedField(field.key()));
                };
                return self.set_task_weeks(id, weeks);
            }
            TaskField::BlockerIds
            | TaskField::WeekBlockers
            | TaskField::PrevId
            | TaskField::NextId
            | TaskField::AutoPlanEnabled
            | TaskField::Fact
            | TaskField::StartWeek
            | TaskField::EndWeek
            | TaskField::ExpectedStartWeek
            | TaskField::SprintsAuto => {
                warn!(%id, field = field.key(), "set_task_field: managed field");
                return Err(ModelError::ManagedField(field.key()));
            }
            _ => {}
        }
        if let TaskValue::PlanEmpl(empl) = &value {
            if !empl.is_finite() || *empl < 0.0 {
                warn!(%id, empl, "set_task_field: rejected employment");
                return Err(ModelError::InvalidValue {
                    field: field.key(),
                    value: *empl,
                });
            }
        }

        let idx = self.task_idx(id)?;
        let task = &mut self.model.tasks[idx];
        let old = TaskValue::read(task, field);
        if old == value {
            return Ok(false);
        }
        value.clone().apply(task);
        self.tracker.add_cell_change(id, old, value);

        if field.drives_auto_plan() {
            debug!(%id, "set_task_field: plan driver changed, replanning");
            self.replan();
        }
        Ok(true)
    }

    /// Replace a task's weeks by hand
    ///
    /// An auto task switches to manual in the same change set.
    pub fn set_task_weeks(&mut self, id: &str, weeks: Vec<f64>) -> Result<bool, ModelError> {
        debug!(%id, "set_task_weeks: called");
        let week_count = self.model.week_count;
        if weeks.len() != week_count {
            return Err(ModelError::WrongWeekCount {
                got: weeks.len(),
                expected: week_count,
            });
        }
        let weeks: Vec<f64> = weeks.into_iter().map(|w| w.max(0.0)).collect();
        let idx = self.task_idx(id)?;
        let task = &mut self.model.tasks[idx];
        if task.weeks == weeks {
            return Ok(false);
        }

        let mut changes: Vec<CellChange> = vec![(
            id.to_string(),
            TaskValue::Weeks(task.weeks.clone()).into(),
            TaskValue::Weeks(weeks.clone()).into(),
        )];
        if task.auto_plan_enabled {
            info!(%id, "Manual week edit, switching task to manual plan");
            task.auto_plan_enabled = false;
            changes.push((
                id.to_string(),
                TaskValue::AutoPlanEnabled(true).into(),
                TaskValue::AutoPlanEnabled(false).into(),
            ));
        }
        task.weeks = weeks;
        self.tracker.add_cell_changes(changes);
        self.replan();
        Ok(true)
    }

    /// Edit one week cell of a task
    pub fn edit_task_week(&mut self, id: &str, week: usize, value: f64) -> Result<bool, ModelError> {
        debug!(%id, week, value, "edit_task_week: called");
        self.check_week(week)?;
        let mut weeks = self.model.tasks[self.task_idx(id)?].weeks.clone();
        weeks[week] = value;
        self.set_task_weeks(id, weeks)
    }

    /// Set a resource field; order pointers are managed by reorder
    pub fn set_resource_field(&mut self, id: &str, value: ResourceValue) -> Result<bool, ModelError> {
        let field = value.field();
        debug!(%id, field = field.key(), "set_resource_field: called");
        match &value {
            ResourceValue::PrevId(_) | ResourceValue::NextId(_) => {
                return Err(ModelError::ManagedField(field.key()));
            }
            ResourceValue::Weeks(weeks) if weeks.len() != self.model.week_count => {
                return Err(ModelError::WrongWeekCount {
                    got: weeks.len(),
                    expected: self.model.week_count,
                });
            }
            _ => {}
        }

        let idx = self.resource_idx(id)?;
        let resource = &mut self.model.resources[idx];
        let old = ResourceValue::read(resource, field);
        if old == value {
            return Ok(false);
        }
        value.clone().apply(resource);
        self.tracker.add_cell_change(id, old, value);

        if matches!(field, ResourceField::Weeks | ResourceField::Function) {
            self.replan();
        }
        Ok(true)
    }

    /// Edit one week of a resource's availability
    pub fn edit_resource_week(&mut self, id: &str, week: usize, value: f64) -> Result<bool, ModelError> {
        debug!(%id, week, value, "edit_resource_week: called");
        self.check_week(week)?;
        let mut weeks = self.model.resources[self.resource_idx(id)?].weeks.clone();
        weeks[week] = value.max(0.0);
        self.set_resource_field(id, ResourceValue::Weeks(weeks))
    }

    // === Auto plan ===

    fn set_auto_flag(&mut self, idx: usize, enabled: bool) {
        let task = &mut self.model.tasks[idx];
        let old = task.auto_plan_enabled;
        task.auto_plan_enabled = enabled;
        self.tracker.add_cell_change(
            task.id.as_str(),
            TaskValue::AutoPlanEnabled(old),
            TaskValue::AutoPlanEnabled(enabled),
        );
    }

    /// Request a switch between auto and manual planning
    ///
    /// Disabling keeps the current weeks. Enabling replaces them with the
    /// computed plan; if that would discard manual work the switch waits
    /// for [`Planner::confirm_auto_plan`].
    pub fn toggle_auto_plan(&mut self, id: &str, enabled: bool) -> Result<ToggleOutcome, ModelError> {
        debug!(%id, enabled, "toggle_auto_plan: called");
        let idx = self.task_idx(id)?;
        let task = &self.model.tasks[idx];
        if task.auto_plan_enabled == enabled {
            debug!("toggle_auto_plan: already in requested mode");
            return Ok(ToggleOutcome::Unchanged);
        }

        if !enabled {
            self.set_auto_flag(idx, false);
            return Ok(ToggleOutcome::Disabled);
        }

        let mut candidate = self.model.tasks.clone();
        candidate[idx].auto_plan_enabled = true;
        let computed = self
            .scheduler
            .recompute_all(&candidate, &self.model.resources, &self.model.sprints)
            .swap_remove(idx)
            .weeks;
        let current = &self.model.tasks[idx].weeks;
        let nothing_to_lose = current.iter().all(|w| *w == 0.0) || plans_match(current, &computed);

        if nothing_to_lose {
            debug!("toggle_auto_plan: manual plan matches or is empty, enabling");
            self.set_auto_flag(idx, true);
            self.replan();
            Ok(ToggleOutcome::Enabled)
        } else {
            debug!("toggle_auto_plan: manual plan would be discarded, asking");
            Ok(ToggleOutcome::NeedsConfirmation(ConfirmDiscard::new(RowId::from(id))))
        }
    }

    /// Accept a pending switch to auto planning
    ///
    /// The plan is computed from the state at acceptance time. Returns false
    /// if the task was already back in auto mode.
    pub fn confirm_auto_plan(&mut self, confirmation: ConfirmDiscard) -> Result<bool, ModelError> {
        debug!(task_id = %confirmation.task_id, "confirm_auto_plan: called");
        let idx = self.task_idx(confirmation.task_id.as_str())?;
        if self.model.tasks[idx].auto_plan_enabled {
            return Ok(false);
        }
        info!(task_id = %confirmation.task_id, "Manual plan discarded, auto plan enabled");
        self.set_auto_flag(idx, true);
        self.replan();
        Ok(true)
    }

    /// Toggle, asking `confirm` when manual work would be lost
    pub fn toggle_auto_plan_with(
        &mut self,
        id: &str,
        enabled: bool,
        confirm: &mut impl Confirm,
    ) -> Result<AutoPlanMode, ModelError> {
        if let ToggleOutcome::NeedsConfirmation(pending) = self.toggle_auto_plan(id, enabled)? {
            if confirm.confirm(pending.prompt) {
                self.confirm_auto_plan(pending)?;
            } else {
                debug!(%id, "toggle_auto_plan_with: declined");
            }
        }
        Ok(AutoPlanMode::of(&self.model.tasks[self.task_idx(id)?]))
    }

    // === Blockers ===

    pub fn add_blocker(&mut self, task_id: &str, blocker_id: &str) -> Result<bool, ModelError> {
        let added = graph::add_blocker(&mut self.model.tasks, &self.tracker, task_id, blocker_id)?;
        if added {
            self.replan();
        }
        Ok(added)
    }

    pub fn remove_blocker(&mut self, task_id: &str, blocker_id: &str) -> Result<bool, ModelError> {
        let removed = graph::remove_blocker(&mut self.model.tasks, &self.tracker, task_id, blocker_id)?;
        if removed {
            self.replan();
        }
        Ok(removed)
    }

    pub fn add_week_blocker(&mut self, task_id: &str, week: u32) -> Result<bool, ModelError> {
        let added = graph::add_week_blocker(&mut self.model.tasks, &self.tracker, task_id, week)?;
        if added {
            self.replan();
        }
        Ok(added)
    }

    pub fn remove_week_blocker(&mut self, task_id: &str, week: u32) -> Result<bool, ModelError> {
        let removed = graph::remove_week_blocker(&mut self.model.tasks, &self.tracker, task_id, week)?;
        if removed {
            self.replan();
        }
        Ok(removed)
    }

    // === Order ===

    /// Drag `dragged` onto `target`; both must be the same kind
    pub fn reorder(&mut self, dragged: &str, target: &str, side: DropSide) -> Result<Vec<LinkChange>, ModelError> {
        debug!(%dragged, %target, ?side, "reorder: called");
        let dragged_kind = self
            .model
            .kind_of(dragged)
            .ok_or_else(|| OrderError::UnknownRow(dragged.to_string()))?;
        let target_kind = self
            .model
            .kind_of(target)
            .ok_or_else(|| OrderError::UnknownRow(target.to_string()))?;
        if dragged_kind != target_kind {
            warn!(%dragged, %target, "reorder: rejected cross-kind drag");
            return Err(OrderError::KindMismatch {
                dragged: dragged_kind,
                target: target_kind,
            }
            .into());
        }

        let changes = match dragged_kind {
            RowKind::Task => move_row(&mut self.model.tasks, dragged, target, side)?,
            RowKind::Resource => move_row(&mut self.model.resources, dragged, target, side)?,
        };
        if changes.is_empty() {
            debug!("reorder: order unchanged");
            return Ok(changes);
        }

        self.tracker.add_cell_changes(link_cells(dragged_kind, changes.clone()));
        if dragged_kind == RowKind::Task {
            self.replan();
        }
        Ok(changes)
    }

    // === Teams and sprints ===

    pub fn add_team(&mut self, team: Team) -> Result<(), ModelError> {
        debug!(name = %team.name, "add_team: called");
        if self.model.teams.iter().any(|t| t.name == team.name) {
            return Err(ModelError::Duplicate {
                kind: "team",
                key: team.name,
            });
        }
        self.tracker.add_row_change(
            EntityKind::Team,
            &team.name,
            RowAction::added(&team)?,
        );
        self.model.teams.push(team);
        Ok(())
    }

    pub fn update_team(&mut self, name: &str, value: TeamValue) -> Result<bool, ModelError> {
        debug!(%name, "update_team: called");
        let team = self
            .model
            .teams
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| ModelError::UnknownRow(name.to_string()))?;
        let old = TeamValue::read(team, value.field());
        if old == value {
            return Ok(false);
        }
        value.clone().apply(team);
        Ok(self.tracker.add_cell_change(name, old, value))
    }

    pub fn delete_team(&mut self, name: &str) -> Result<(), ModelError> {
        debug!(%name, "delete_team: called");
        let idx = self
            .model
            .teams
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| ModelError::UnknownRow(name.to_string()))?;
        self.model.teams.remove(idx);
        self.tracker
            .add_row_change(EntityKind::Team, name, RowAction::Deleted);
        Ok(())
    }

    pub fn add_sprint(&mut self, sprint: Sprint) -> Result<(), ModelError> {
        debug!(code = %sprint.code, "add_sprint: called");
        if self.model.sprints.iter().any(|s| s.code == sprint.code) {
            return Err(ModelError::Duplicate {
                kind: "sprint",
                key: sprint.code,
            });
        }
        self.tracker.add_row_change(
            EntityKind::Sprint,
            &sprint.code,
            RowAction::added(&sprint)?,
        );
        self.model.sprints.push(sprint);
        self.replan();
        Ok(())
    }

    pub fn update_sprint(&mut self, code: &str, value: SprintValue) -> Result<bool, ModelError> {
        debug!(%code, "update_sprint: called");
        let sprint = self
            .model
            .sprints
            .iter_mut()
            .find(|s| s.code == code)
            .ok_or_else(|| ModelError::UnknownRow(code.to_string()))?;
        let old = SprintValue::read(sprint, value.field());
        if old == value {
            return Ok(false);
        }
        value.clone().apply(sprint);
        self.tracker.add_cell_change(code, old, value);
        self.replan();
        Ok(true)
    }

    pub fn delete_sprint(&mut self, code: &str) -> Result<(), ModelError> {
        debug!(%code, "delete_sprint: called");
        let idx = self
            .model
            .sprints
            .iter()
            .position(|s| s.code == code)
            .ok_or_else(|| ModelError::UnknownRow(code.to_string()))?;
        self.model.sprints.remove(idx);
        self.tracker
            .add_row_change(EntityKind::Sprint, code, RowAction::Deleted);
        self.replan();
        Ok(())
    }
}
