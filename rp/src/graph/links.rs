//! Blocker links with scheduling conflicts

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::domain::{RowId, TaskRow};

/// What blocks a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "ref", rename_all = "lowercase")]
pub enum BlockerSource {
    Task(RowId),
    /// 1-based week number
    Week(u32),
}

/// One blocking relation as shown by the grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockerLink {
    pub blocked_task_id: RowId,
    pub source: BlockerSource,
    /// The blocked task is planned to start before its blocker is done
    pub conflict: bool,
}

/// Build links for every task and week blocker
///
/// A task link conflicts when the blocked task's first planned week is at or
/// before the blocker's last planned week. A week link conflicts when the
/// first planned week is at or before the blocked week.
pub fn blocker_links(tasks: &[TaskRow]) -> Vec<BlockerLink> {
    debug!(task_count = tasks.len(), "blocker_links: called");
    let by_id: HashMap<&str, &TaskRow> = tasks.iter().map(|t| (t.id.as_str(), t)).collect();
    let mut links = Vec::new();

    for task in tasks {
        let first = task.first_planned_week();

        for blocker_id in &task.blocker_ids {
            let Some(blocker) = by_id.get(blocker_id.as_str()) else {
                debug!(task_id = %task.id, %blocker_id, "blocker_links: blocker missing, skipping");
                continue;
            };
            let conflict = match (first, blocker.last_planned_week()) {
                (Some(first), Some(last)) => first <= last,
                _ => false,
            };
            links.push(BlockerLink {
                blocked_task_id: task.id.clone(),
                source: BlockerSource::Task(blocker_id.clone()),
                conflict,
            });
        }

        for &week in &task.week_blockers {
            let week_idx = (week as usize).saturating_sub(1);
            let conflict = first.is_some_and(|first| first <= week_idx);
            links.push(BlockerLink {
                blocked_task_id: task.id.clone(),
                source: BlockerSource::Week(week),
                conflict,
            });
        }
    }

    debug!(link_count = links.len(), "blocker_links: complete");
    links
}
