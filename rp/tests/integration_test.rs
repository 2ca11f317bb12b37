//! Integration tests for Roadplan
//!
//! These tests drive the planner and the auto-saver together against an
//! in-process transport.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use roadplan::domain::{EntityKind, ResourceRow, RoadmapData, TaskRow};
use roadplan::ordering::DropSide;
use roadplan::persist::{
    AutoSaveConfig, AutoSaver, SaveError, SaveOutcome, SavePhase, SaveRequest, SaveResponse, SaveTransport,
};
use roadplan::scheduler::PlanningConfig;
use roadplan::tracker::TaskValue;
use roadplan::{ChangeTracker, Planner, calculate_data_changes};

const WEEKS: usize = 16;

/// Records every request as JSON and answers from a queue
#[derive(Default)]
struct RecordingTransport {
    requests: Mutex<Vec<Value>>,
    responses: Mutex<VecDeque<SaveResponse>>,
}

impl RecordingTransport {
    fn push_response(&self, response: SaveResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SaveTransport for RecordingTransport {
    async fn save(&self, request: SaveRequest) -> Result<SaveResponse, SaveError> {
        self.requests.lock().unwrap().push(serde_json::to_value(&request)?);
        let queued = self.responses.lock().unwrap().pop_front();
        Ok(queued.unwrap_or_else(|| SaveResponse::ok(request.version + 1)))
    }

    async fn fetch(&self) -> Result<RoadmapData, SaveError> {
        Ok(RoadmapData::default())
    }

    async fn fetch_version(&self) -> Result<u64, SaveError> {
        Ok(0)
    }
}

fn snapshot() -> RoadmapData {
    RoadmapData {
        version: 7,
        resources: vec![ResourceRow::with_id("r1", "dev", WEEKS).with_capacity(1.0)],
        tasks: vec![
            TaskRow::with_id("a", "API", "dev", WEEKS).with_plan(1.0, 3),
            TaskRow::with_id("b", "UI", "dev", WEEKS).with_plan(1.0, 2),
        ],
        ..Default::default()
    }
}

/// Planner over a planned, linked snapshot with nothing pending
fn loaded_planner() -> Planner {
    let mut planner = Planner::new(snapshot(), PlanningConfig::default(), ChangeTracker::new());
    planner.replan();
    planner.tracker().clear_changes();
    planner
}

async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

// =============================================================================
// Planner + AutoSaver
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_planner_edit_is_saved_after_debounce() {
    let mut planner = loaded_planner();
    let transport = Arc::new(RecordingTransport::default());
    let saver = AutoSaver::spawn(
        planner.tracker().clone(),
        transport.clone(),
        AutoSaveConfig::default(),
        "alice",
        7,
    );

    assert!(planner.set_task_field("a", TaskValue::PlanWeeks(5)).unwrap());
    advance(1000).await;
    assert!(transport.requests().is_empty());
    assert_eq!(saver.state().phase, SavePhase::PendingDebounce);

    advance(1500).await;

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    let body = &requests[0];
    assert_eq!(body["version"], json!(7));
    assert_eq!(body["userId"], json!("alice"));

    let task_a = body["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["id"] == json!("a"))
        .unwrap();
    assert_eq!(task_a["planWeeks"], json!(5));
    assert_eq!(task_a["endWeek"], json!(5));

    let state = saver.state();
    assert_eq!(state.phase, SavePhase::Idle);
    assert_eq!(state.version, 8);
    assert!(!state.has_unsaved_changes);
    assert!(!planner.has_unsaved_changes());
}

#[tokio::test(start_paused = true)]
async fn test_blocker_change_saves_both_sides_of_the_shift() {
    let mut planner = loaded_planner();
    let transport = Arc::new(RecordingTransport::default());
    let saver = AutoSaver::spawn(
        planner.tracker().clone(),
        transport.clone(),
        AutoSaveConfig::default(),
        "alice",
        7,
    );

    assert!(planner.add_blocker("b", "a").unwrap());
    let outcome = saver.force_save().await.unwrap();
    assert_eq!(outcome, SaveOutcome::Saved { version: 8 });

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    let task_b = requests[0]["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["id"] == json!("b"))
        .cloned()
        .unwrap();
    assert_eq!(task_b["blockerIds"], json!(["a"]));
    assert_eq!(task_b["startWeek"], json!(4));
}

#[tokio::test(start_paused = true)]
async fn test_conflict_keeps_changes_until_retry() {
    let mut planner = loaded_planner();
    let transport = Arc::new(RecordingTransport::default());
    transport.push_response(SaveResponse::rejected(9, "Version conflict"));
    let saver = AutoSaver::spawn(
        planner.tracker().clone(),
        transport.clone(),
        AutoSaveConfig::default(),
        "alice",
        7,
    );

    planner.set_task_field("b", TaskValue::Task("Web UI".into())).unwrap();
    advance(2100).await;

    let state = saver.state();
    assert_eq!(state.phase, SavePhase::Error);
    assert!(state.error.is_some());
    assert!(state.has_unsaved_changes);
    assert_eq!(state.version, 9, "conflict carries the newer server version");
    assert!(planner.has_unsaved_changes());

    let outcome = saver.force_save().await.unwrap();
    assert_eq!(outcome, SaveOutcome::Saved { version: 10 });

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1]["version"], json!(9));
    assert_eq!(requests[1]["tasks"][0]["task"], json!("Web UI"));
    assert!(!planner.has_unsaved_changes());

    saver.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_conflict_named_in_message_is_recovered() {
    let mut planner = loaded_planner();
    let transport = Arc::new(RecordingTransport::default());
    transport.push_response(SaveResponse::rejected(
        0,
        "Version conflict: client version 7, server version 12",
    ));
    let saver = AutoSaver::spawn(
        planner.tracker().clone(),
        transport.clone(),
        AutoSaveConfig::default(),
        "alice",
        7,
    );

    planner.set_task_field("a", TaskValue::PlanWeeks(4)).unwrap();
    let err = saver.force_save().await.unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(saver.state().version, 12);

    assert_eq!(saver.force_save().await.unwrap(), SaveOutcome::Saved { version: 13 });
    let versions: Vec<Value> = transport.requests().iter().map(|r| r["version"].clone()).collect();
    assert_eq!(versions, vec![json!(7), json!(12)]);
}

#[tokio::test(start_paused = true)]
async fn test_deleted_row_is_sent_as_deleted_id() {
    let mut planner = loaded_planner();
    let transport = Arc::new(RecordingTransport::default());
    let saver = AutoSaver::spawn(
        planner.tracker().clone(),
        transport.clone(),
        AutoSaveConfig::default(),
        "alice",
        7,
    );

    planner.delete_row("b").unwrap();
    saver.force_save().await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests[0]["deleted"]["tasks"], json!(["b"]));
    let tasks = requests[0]["tasks"].as_array().cloned().unwrap_or_default();
    assert!(tasks.iter().all(|t| t["id"] != json!("b")));
}

// =============================================================================
// Planner + Diff
// =============================================================================

#[test]
fn test_diff_covers_tracked_edits() {
    let mut planner = loaded_planner();
    let before = planner.to_data();

    planner.set_task_field("a", TaskValue::PlanEmpl(0.5)).unwrap();
    let after = planner.to_data();

    let tracked = planner.tracker().build_change_log();
    let diffed = calculate_data_changes(&before, &after).unwrap();

    let tracked_patch = tracked.find(EntityKind::Task, "a").unwrap();
    let diffed_patch = diffed.find(EntityKind::Task, "a").unwrap();
    for (key, value) in tracked_patch {
        assert_eq!(diffed_patch.get(key), Some(value), "field {} differs", key);
    }
    assert!(diffed.find(EntityKind::Task, "b").is_none());
    assert!(diffed.resources.is_empty());
}

#[test]
fn test_reorder_shows_up_in_diff() {
    let mut planner = loaded_planner();
    let before = planner.to_data();

    planner.reorder("b", "a", DropSide::Top).unwrap();
    let after = planner.to_data();

    let diffed = calculate_data_changes(&before, &after).unwrap();
    assert_eq!(diffed.find(EntityKind::Task, "b").unwrap()["nextId"], json!("a"));
    assert_eq!(diffed.find(EntityKind::Task, "a").unwrap()["prevId"], json!("b"));
    assert!(diffed.deleted.is_empty());
}

#[test]
fn test_reload_after_save_round_trip() {
    let mut planner = loaded_planner();
    planner.reorder("b", "a", DropSide::Top).unwrap();
    planner.set_version(8);

    let json = serde_json::to_string(&planner.to_data()).unwrap();
    let data: RoadmapData = serde_json::from_str(&json).unwrap();
    let reloaded = Planner::new(data, PlanningConfig::default(), ChangeTracker::new());

    let ids: Vec<&str> = reloaded.model().tasks().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
    assert_eq!(reloaded.to_data().version, 8);
    assert!(!reloaded.has_unsaved_changes());
}
