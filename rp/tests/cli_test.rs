//! Command-line tests for the rp binary

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

use roadplan::domain::{ResourceRow, RoadmapData, RowId, TaskRow};
use roadplan::scheduler::PlanningConfig;
use roadplan::{ChangeTracker, Planner};

const WEEKS: usize = 16;

/// Linked snapshot with one resource and two auto tasks
fn linked_snapshot() -> RoadmapData {
    let data = RoadmapData {
        version: 3,
        resources: vec![ResourceRow::with_id("r1", "dev", WEEKS).with_capacity(1.0)],
        tasks: vec![
            TaskRow::with_id("a", "API", "dev", WEEKS).with_plan(1.0, 3),
            TaskRow::with_id("b", "UI", "dev", WEEKS).with_plan(1.0, 2),
        ],
        ..Default::default()
    };
    Planner::new(data, PlanningConfig::default(), ChangeTracker::new()).to_data()
}

fn write_snapshot(dir: &Path, name: &str, data: &RoadmapData) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(data).unwrap()).unwrap();
    path
}

/// rp with config lookup and log output confined to `home`
fn rp(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("rp").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"));
    cmd
}

// =============================================================================
// check
// =============================================================================

#[test]
fn test_check_accepts_linked_snapshot() {
    let home = TempDir::new().unwrap();
    let file = write_snapshot(home.path(), "plan.json", &linked_snapshot());

    rp(&home)
        .arg("check")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Snapshot OK (1 resources, 2 tasks, version 3)"));
}

#[test]
fn test_check_reports_blocker_cycle() {
    let home = TempDir::new().unwrap();
    let mut data = linked_snapshot();
    data.tasks[0].blocker_ids = vec![RowId::from("b")];
    data.tasks[1].blocker_ids = vec![RowId::from("a")];
    let file = write_snapshot(home.path(), "plan.json", &data);

    rp(&home)
        .arg("check")
        .arg(&file)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Blocker cycle"));
}

#[test]
fn test_check_reports_wrong_week_count() {
    let home = TempDir::new().unwrap();
    let mut data = linked_snapshot();
    data.resources[0].weeks.truncate(10);
    let file = write_snapshot(home.path(), "plan.json", &data);

    rp(&home)
        .arg("check")
        .arg(&file)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Row r1 has 10 weeks, expected 16"));
}

#[test]
fn test_check_uses_project_config_week_count() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join(".roadplan.yml"), "planning:\n  week-count: 10\n").unwrap();
    let file = write_snapshot(home.path(), "plan.json", &linked_snapshot());

    rp(&home)
        .arg("check")
        .arg(&file)
        .assert()
        .failure()
        .stdout(predicate::str::contains("expected 10"));
}

// =============================================================================
// plan
// =============================================================================

#[test]
fn test_plan_json_report() {
    let home = TempDir::new().unwrap();
    let file = write_snapshot(home.path(), "plan.json", &linked_snapshot());

    let output = rp(&home)
        .args(["plan", "--format", "json"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["tasks"][0]["id"], json!("a"));
    assert_eq!(report["tasks"][0]["startWeek"], json!(1));
    assert_eq!(report["tasks"][0]["endWeek"], json!(3));
    assert_eq!(report["tasks"][0]["mode"], json!("auto"));
    // both tasks fill r1 in weeks 1 and 2
    assert_eq!(report["resources"][0]["overloadedWeeks"], json!([1, 2]));
}

#[test]
fn test_plan_write_updates_snapshot() {
    let home = TempDir::new().unwrap();
    let file = write_snapshot(home.path(), "plan.json", &linked_snapshot());

    rp(&home).args(["plan", "--write"]).arg(&file).assert().success();

    let written: RoadmapData = serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
    let a = &written.tasks[0];
    assert_eq!(&a.weeks[..4], &[1.0, 1.0, 1.0, 0.0]);
    assert_eq!(a.end_week, Some(3));
}

// =============================================================================
// diff
// =============================================================================

#[test]
fn test_diff_prints_change_log() {
    let home = TempDir::new().unwrap();
    let old = linked_snapshot();
    let mut new = old.clone();
    new.tasks[1].task = "Web UI".to_string();
    new.resources.clear();

    let old_file = write_snapshot(home.path(), "old.json", &old);
    let new_file = write_snapshot(home.path(), "new.json", &new);

    let output = rp(&home).arg("diff").arg(&old_file).arg(&new_file).output().unwrap();
    assert!(output.status.success());

    let log: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(log["tasks"][0]["id"], json!("b"));
    assert_eq!(log["tasks"][0]["task"], json!("Web UI"));
    assert_eq!(log["deleted"]["resources"], json!(["r1"]));
}

#[test]
fn test_push_with_no_changes_skips_server() {
    let home = TempDir::new().unwrap();
    let file = write_snapshot(home.path(), "plan.json", &linked_snapshot());

    rp(&home)
        .arg("push")
        .arg(&file)
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to push"));
}

#[test]
fn test_missing_file_fails() {
    let home = TempDir::new().unwrap();

    rp(&home)
        .args(["check", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}
