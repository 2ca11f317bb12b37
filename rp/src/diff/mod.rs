//! Snapshot diff - the change log between two full snapshots
//!
//! Used when incremental tracking is bypassed (bulk reload, CLI push). The
//! output has the same shape as [`ChangeTracker::build_change_log`], so the
//! persistence layer does not care which one produced a payload.
//!
//! [`ChangeTracker::build_change_log`]: crate::tracker::ChangeTracker::build_change_log

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::domain::{EntityKind, RoadmapData};
use crate::tracker::{ChangeLog, EntityPatch};

/// Added, updated and deleted entities of one kind
#[derive(Debug, Default)]
struct KindDiff {
    added: Vec<EntityPatch>,
    updated: Vec<EntityPatch>,
    deleted: Vec<String>,
}

fn to_patch<T: Serialize>(item: &T) -> Result<EntityPatch, serde_json::Error> {
    match serde_json::to_value(item)? {
        Value::Object(map) => Ok(map),
        other => {
            let mut map = EntityPatch::new();
            map.insert("value".to_string(), other);
            Ok(map)
        }
    }
}

/// Compare two collections by a natural key
///
/// Added and updated entities are emitted whole, in `new` order; deleted
/// keys in `old` order.
fn compare<T, K>(old: &[T], new: &[T], key: K) -> Result<KindDiff, serde_json::Error>
where
    T: Serialize + PartialEq,
    K: Fn(&T) -> &str,
{
    let old_by_key: HashMap<&str, &T> = old.iter().map(|item| (key(item), item)).collect();
    let new_keys: HashMap<&str, &T> = new.iter().map(|item| (key(item), item)).collect();
    let mut diff = KindDiff::default();

    for item in new {
        match old_by_key.get(key(item)) {
            None => diff.added.push(to_patch(item)?),
            Some(previous) if *previous != item => diff.updated.push(to_patch(item)?),
            Some(_) => {}
        }
    }
    for item in old {
        if !new_keys.contains_key(key(item)) {
            diff.deleted.push(key(item).to_string());
        }
    }
    Ok(diff)
}

fn merge(log: &mut ChangeLog, kind: EntityKind, diff: KindDiff) {
    debug!(
        %kind,
        added = diff.added.len(),
        updated = diff.updated.len(),
        deleted = diff.deleted.len(),
        "merge: called"
    );
    let entities = log.entities_mut(kind);
    entities.extend(diff.added);
    entities.extend(diff.updated);
    log.deleted.of_mut(kind).extend(diff.deleted);
}

/// Change log that turns `old` into `new`
///
/// Tasks and resources are matched by id, teams by id or name, sprints by
/// code. Kinds without changes are left out of the log.
pub fn calculate_data_changes(old: &RoadmapData, new: &RoadmapData) -> Result<ChangeLog, serde_json::Error> {
    debug!(
        old_version = old.version,
        new_version = new.version,
        "calculate_data_changes: called"
    );
    let mut log = ChangeLog::default();

    merge(&mut log, EntityKind::Task, compare(&old.tasks, &new.tasks, |t| t.id.as_str())?);
    merge(
        &mut log,
        EntityKind::Resource,
        compare(&old.resources, &new.resources, |r| r.id.as_str())?,
    );
    merge(&mut log, EntityKind::Team, compare(&old.teams, &new.teams, |t| t.key())?);
    merge(
        &mut log,
        EntityKind::Sprint,
        compare(&old.sprints, &new.sprints, |s| s.code.as_str())?,
    );

    debug!(entries = log.len(), "calculate_data_changes: complete");
    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ResourceRow, Sprint, TaskRow, Team};
    use chrono::NaiveDate;
    use serde_json::json;

    fn data() -> RoadmapData {
        let day = |d: u32| NaiveDate::from_ymd_opt(2025, 1, d).unwrap();
        RoadmapData {
            version: 3,
            teams: vec![Team::new("Core")],
            sprints: vec![Sprint::new("S1", day(6), day(19))],
            resources: vec![ResourceRow::with_id("r1", "dev", 4).with_capacity(1.0)],
            tasks: vec![
                TaskRow::with_id("t1", "First", "dev", 4).with_plan(1.0, 2),
                TaskRow::with_id("t2", "Second", "dev", 4),
            ],
        }
    }

    #[test]
    fn test_identical_snapshots_empty() {
        let log = calculate_data_changes(&data(), &data()).unwrap();
        assert!(log.is_empty());
        assert_eq!(serde_json::to_value(&log).unwrap(), json!({}));
    }

    #[test]
    fn test_version_alone_is_not_a_change() {
        let mut newer = data();
        newer.version = 10;
        assert!(calculate_data_changes(&data(), &newer).unwrap().is_empty());
    }

    #[test]
    fn test_updated_task_emitted_whole() {
        let mut newer = data();
        newer.tasks[1].plan_weeks = 5;

        let log = calculate_data_changes(&data(), &newer).unwrap();

        assert_eq!(log.tasks.len(), 1);
        let patch = &log.tasks[0];
        assert_eq!(patch["id"], json!("t2"));
        assert_eq!(patch["planWeeks"], json!(5));
        assert_eq!(patch["task"], json!("Second"));
        assert!(log.resources.is_empty());
    }

    #[test]
    fn test_added_before_updated() {
        let mut newer = data();
        newer.tasks[0].epic = Some("E".into());
        newer.tasks.insert(0, TaskRow::with_id("t0", "Zero", "dev", 4));

        let log = calculate_data_changes(&data(), &newer).unwrap();

        let ids: Vec<&Value> = log.tasks.iter().map(|p| &p["id"]).collect();
        assert_eq!(ids, vec![&json!("t0"), &json!("t1")]);
    }

    #[test]
    fn test_deleted_ids_per_kind() {
        let mut newer = data();
        newer.tasks.remove(0);
        newer.resources.clear();
        newer.teams.clear();
        newer.sprints.clear();

        let log = calculate_data_changes(&data(), &newer).unwrap();

        assert_eq!(
            serde_json::to_value(&log).unwrap(),
            json!({
                "deleted": {
                    "tasks": ["t1"],
                    "resources": ["r1"],
                    "teams": ["Core"],
                    "sprints": ["S1"]
                }
            })
        );
    }

    #[test]
    fn test_team_matched_by_name() {
        let mut newer = data();
        newer.teams[0].jira_project = "CORE".into();
        newer.teams.push(Team::new("Platform"));

        let log = calculate_data_changes(&data(), &newer).unwrap();

        let names: Vec<&Value> = log.teams.iter().map(|p| &p["name"]).collect();
        assert_eq!(names, vec![&json!("Platform"), &json!("Core")]);
        assert!(log.deleted.is_empty());
    }

    #[test]
    fn test_team_matched_by_id_survives_rename() {
        let mut old = data();
        old.teams[0].id = Some("team-1".into());
        let mut newer = old.clone();
        newer.teams[0].name = "Core Platform".into();

        let log = calculate_data_changes(&old, &newer).unwrap();

        assert_eq!(log.teams.len(), 1);
        assert!(log.deleted.is_empty());
    }

    #[test]
    fn test_sprint_matched_by_code() {
        let mut newer = data();
        newer.sprints[0].end = NaiveDate::from_ymd_opt(2025, 1, 26).unwrap();

        let log = calculate_data_changes(&data(), &newer).unwrap();

        assert_eq!(log.sprints.len(), 1);
        assert_eq!(log.sprints[0]["code"], json!("S1"));
        assert_eq!(log.sprints[0]["end"], json!("2025-01-26"));
    }
}
