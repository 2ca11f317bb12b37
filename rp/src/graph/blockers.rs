//! Blocker mutations

use tracing::{debug, info, warn};

use super::GraphError;
use super::cycles::{build_graph, find_cycle};
use crate::domain::{RowId, TaskRow};
use crate::tracker::{ChangeTracker, TaskValue};

/// Whether `blocker_id` may be added as a blocker of `task_id`
///
/// Evaluated against the current relations with the proposed edge added.
pub fn can_set_blocker(tasks: &[TaskRow], task_id: &str, blocker_id: &str) -> bool {
    debug!(%task_id, %blocker_id, "can_set_blocker: called");
    if task_id == blocker_id {
        debug!("can_set_blocker: self block");
        return false;
    }

    let mut graph = build_graph(tasks);
    graph.entry(task_id).or_default().push(blocker_id);
    graph.entry(blocker_id).or_default();

    let ok = find_cycle(&graph).is_none();
    debug!(ok, "can_set_blocker: evaluated");
    ok
}

fn find_task_mut<'a>(tasks: &'a mut [TaskRow], id: &str) -> Result<&'a mut TaskRow, GraphError> {
    tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| GraphError::UnknownTask(id.to_string()))
}

/// Make `blocker_id` a blocker of `task_id`
///
/// Returns `Ok(false)` when the relation already exists.
pub fn add_blocker(
    tasks: &mut [TaskRow],
    tracker: &ChangeTracker,
    task_id: &str,
    blocker_id: &str,
) -> Result<bool, GraphError> {
    debug!(%task_id, %blocker_id, "add_blocker: called");
    if task_id == blocker_id {
        warn!(%task_id, "add_blocker: rejected self block");
        return Err(GraphError::SelfBlock(task_id.to_string()));
    }
    if !tasks.iter().any(|t| t.id == blocker_id) {
        return Err(GraphError::UnknownTask(blocker_id.to_string()));
    }
    if !can_set_blocker(tasks, task_id, blocker_id) {
        warn!(%task_id, %blocker_id, "add_blocker: rejected, would create a cycle");
        return Err(GraphError::WouldCycle {
            task: task_id.to_string(),
            blocker: blocker_id.to_string(),
        });
    }

    let task = find_task_mut(tasks, task_id)?;
    if task.blocker_ids.iter().any(|b| b == blocker_id) {
        debug!("add_blocker: already present");
        return Ok(false);
    }

    let old = task.blocker_ids.clone();
    task.blocker_ids.push(RowId::from(blocker_id));
    tracker.add_cell_change(
        task_id,
        TaskValue::BlockerIds(old),
        TaskValue::BlockerIds(task.blocker_ids.clone()),
    );
    info!(%task_id, %blocker_id, "Blocker added");
    Ok(true)
}

/// Remove `blocker_id` from the blockers of `task_id`
///
/// Returns `Ok(false)` when the relation did not exist.
pub fn remove_blocker(
    tasks: &mut [TaskRow],
    tracker: &ChangeTracker,
    task_id: &str,
    blocker_id: &str,
) -> Result<bool, GraphError> {
    debug!(%task_id, %blocker_id, "remove_blocker: called");
    let task = find_task_mut(tasks, task_id)?;
    let old = task.blocker_ids.clone();
    task.blocker_ids.retain(|b| b != blocker_id);
    if task.blocker_ids.len() == old.len() {
        debug!("remove_blocker: not present");
        return Ok(false);
    }

    tracker.add_cell_change(
        task_id,
        TaskValue::BlockerIds(old),
        TaskValue::BlockerIds(task.blocker_ids.clone()),
    );
    info!(%task_id, %blocker_id, "Blocker removed");
    Ok(true)
}

/// Block `task_id` until the given 1-based week
pub fn add_week_blocker(
    tasks: &mut [TaskRow],
    tracker: &ChangeTracker,
    task_id: &str,
    week: u32,
) -> Result<bool, GraphError> {
    debug!(%task_id, week, "add_week_blocker: called");
    let task = find_task_mut(tasks, task_id)?;
    if task.week_blockers.contains(&week) {
        debug!("add_week_blocker: already present");
        return Ok(false);
    }

    let old = task.week_blockers.clone();
    task.week_blockers.push(week);
    tracker.add_cell_change(
        task_id,
        TaskValue::WeekBlockers(old),
        TaskValue::WeekBlockers(task.week_blockers.clone()),
    );
    Ok(true)
}

pub fn remove_week_blocker(
    tasks: &mut [TaskRow],
    tracker: &ChangeTracker,
    task_id: &str,
    week: u32,
) -> Result<bool, GraphError> {
    debug!(%task_id, week, "remove_week_blocker: called");
    let task = find_task_mut(tasks, task_id)?;
    let old = task.week_blockers.clone();
    task.week_blockers.retain(|w| *w != week);
    if task.week_blockers.len() == old.len() {
        return Ok(false);
    }

    tracker.add_cell_change(
        task_id,
        TaskValue::WeekBlockers(old),
        TaskValue::WeekBlockers(task.week_blockers.clone()),
    );
    Ok(true)
}
