//! RowModel - owned collection of all grid rows

use tracing::{debug, info};

use crate::domain::{RoadmapData, ResourceRow, RowKind, Sprint, TaskRow, Team};
use crate::ordering::{LinkChange, relink, restore_order};

/// All rows of the grid, each kind in display order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowModel {
    pub(crate) version: u64,
    pub(crate) week_count: usize,
    pub(crate) resources: Vec<ResourceRow>,
    pub(crate) tasks: Vec<TaskRow>,
    pub(crate) teams: Vec<Team>,
    pub(crate) sprints: Vec<Sprint>,
}

impl RowModel {
    pub fn new(week_count: usize) -> Self {
        Self {
            week_count,
            ..Default::default()
        }
    }

    /// Load a snapshot
    ///
    /// Week vectors are padded or truncated to `week_count` and each kind is
    /// put in chain order. Returns the pointer repairs needed to make the
    /// chains consistent.
    pub fn from_data(data: RoadmapData, week_count: usize) -> (Self, Vec<(RowKind, LinkChange)>) {
        debug!(
            version = data.version,
            resources = data.resources.len(),
            tasks = data.tasks.len(),
            week_count,
            "RowModel::from_data: called"
        );
        let mut resources = restore_order(data.resources);
        let mut tasks = restore_order(data.tasks);

        for resource in &mut resources {
            resource.weeks.resize(week_count, 0.0);
        }
        for task in &mut tasks {
            task.weeks.resize(week_count, 0.0);
        }

        let mut repairs: Vec<(RowKind, LinkChange)> =
            relink(&mut resources).into_iter().map(|c| (RowKind::Resource, c)).collect();
        repairs.extend(relink(&mut tasks).into_iter().map(|c| (RowKind::Task, c)));
        if !repairs.is_empty() {
            info!(repairs = repairs.len(), "Repaired row order chains on load");
        }

        let model = Self {
            version: data.version,
            week_count,
            resources,
            tasks,
            teams: data.teams,
            sprints: data.sprints,
        };
        (model, repairs)
    }

    /// Snapshot of the current rows
    pub fn to_data(&self) -> RoadmapData {
        RoadmapData {
            version: self.version,
            teams: self.teams.clone(),
            sprints: self.sprints.clone(),
            resources: self.resources.clone(),
            tasks: self.tasks.clone(),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn set_version(&mut self, version: u64) {
        debug!(version, "RowModel::set_version: called");
        self.version = version;
    }

    pub fn week_count(&self) -> usize {
        self.week_count
    }

    pub fn resources(&self) -> &[ResourceRow] {
        &self.resources
    }

    pub fn tasks(&self) -> &[TaskRow] {
        &self.tasks
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn sprints(&self) -> &[Sprint] {
        &self.sprints
    }

    pub fn task(&self, id: &str) -> Option<&TaskRow> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn resource(&self, id: &str) -> Option<&ResourceRow> {
        self.resources.iter().find(|r| r.id == id)
    }

    /// Kind of the row with this id
    pub fn kind_of(&self, id: &str) -> Option<RowKind> {
        if self.tasks.iter().any(|t| t.id == id) {
            Some(RowKind::Task)
        } else if self.resources.iter().any(|r| r.id == id) {
            Some(RowKind::Resource)
        } else {
            None
        }
    }

    pub(crate) fn task_index(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    pub(crate) fn resource_index(&self, id: &str) -> Option<usize> {
        self.resources.iter().position(|r| r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RowId;
    use crate::ordering::check_chain;

    #[test]
    fn test_from_data_normalizes_weeks_and_order() {
        let mut a = TaskRow::with_id("a", "A", "BE", 2);
        let mut b = TaskRow::with_id("b", "B", "BE", 20);
        b.next_id = Some(RowId::from("a"));
        a.prev_id = Some(RowId::from("b"));
        let data = RoadmapData {
            version: 3,
            tasks: vec![a, b],
            resources: vec![ResourceRow::with_id("r", "BE", 0)],
            ..Default::default()
        };

        let (model, repairs) = RowModel::from_data(data, 4);
        assert_eq!(model.version(), 3);
        assert_eq!(model.tasks()[0].id, "b");
        assert_eq!(model.tasks()[1].id, "a");
        assert!(model.tasks().iter().all(|t| t.weeks.len() == 4));
        assert_eq!(model.resources()[0].weeks.len(), 4);
        assert!(repairs.is_empty());
        assert!(check_chain(model.tasks()).is_ok());
    }

    #[test]
    fn test_from_data_repairs_missing_links() {
        let data = RoadmapData {
            tasks: vec![TaskRow::with_id("a", "A", "BE", 4), TaskRow::with_id("b", "B", "BE", 4)],
            ..Default::default()
        };
        let (model, repairs) = RowModel::from_data(data, 4);
        assert_eq!(repairs.len(), 2);
        assert!(repairs.iter().all(|(kind, _)| *kind == RowKind::Task));
        assert!(check_chain(model.tasks()).is_ok());
    }

    #[test]
    fn test_lookup() {
        let data = RoadmapData {
            tasks: vec![TaskRow::with_id("t", "T", "BE", 4)],
            resources: vec![ResourceRow::with_id("r", "BE", 4)],
            ..Default::default()
        };
        let (model, _) = RowModel::from_data(data, 4);
        assert_eq!(model.kind_of("t"), Some(RowKind::Task));
        assert_eq!(model.kind_of("r"), Some(RowKind::Resource));
        assert_eq!(model.kind_of("x"), None);
        assert!(model.task("t").is_some());
        assert!(model.resource("t").is_none());
        assert_eq!(model.to_data().tasks.len(), 1);
    }
}
