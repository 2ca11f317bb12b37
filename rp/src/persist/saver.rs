//! AutoSaver - actor that turns tracked changes into debounced saves
//!
//! Every tracker revision (re)arms a debounce deadline. When it passes, the
//! actor snapshots the change log, sends it, and on success clears exactly
//! the snapshotted entries. Saves run inside the actor loop, so at most one
//! request is in flight; edits made meanwhile are noticed afterwards and
//! arm a new debounce.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use super::messages::{AutoSaveState, SaveCommand, SaveOutcome, SavePhase};
use super::{AutoSaveConfig, SaveError, SaveRequest, SaveTransport};
use crate::tracker::ChangeTracker;

/// Handle to the auto-save actor
#[derive(Clone)]
pub struct AutoSaver {
    tx: mpsc::Sender<SaveCommand>,
    state_rx: watch::Receiver<AutoSaveState>,
}

impl AutoSaver {
    /// Spawn the actor on the current tokio runtime
    ///
    /// `version` is the server version of the snapshot the host loaded.
    pub fn spawn(
        tracker: ChangeTracker,
        transport: Arc<dyn SaveTransport>,
        config: AutoSaveConfig,
        user_id: impl Into<String>,
        version: u64,
    ) -> Self {
        let user_id = user_id.into();
        debug!(%user_id, version, ?config, "AutoSaver::spawn: called");
        let (tx, rx) = mpsc::channel(config.channel_buffer.max(1));
        let initial = AutoSaveState {
            has_unsaved_changes: tracker.has_unsaved_changes(),
            version,
            ..Default::default()
        };
        let (state_tx, state_rx) = watch::channel(initial);
        let revisions = tracker.subscribe();

        let worker = Worker {
            tracker,
            transport,
            config,
            user_id,
            version,
            deadline: None,
            state_tx,
        };
        tokio::spawn(actor_loop(worker, rx, revisions));

        info!("AutoSaver spawned");
        Self { tx, state_rx }
    }

    /// Current save status
    pub fn state(&self) -> AutoSaveState {
        self.state_rx.borrow().clone()
    }

    /// Watch save status changes
    pub fn subscribe(&self) -> watch::Receiver<AutoSaveState> {
        self.state_rx.clone()
    }

    /// Save immediately, cancelling any pending debounce
    pub async fn force_save(&self) -> Result<SaveOutcome, SaveError> {
        debug!("force_save: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SaveCommand::ForceSave { reply: reply_tx })
            .await
            .map_err(|_| SaveError::ChannelError)?;
        reply_rx.await.map_err(|_| SaveError::ChannelError)?
    }

    /// Adopt a server version obtained outside the actor
    pub async fn set_version(&self, version: u64) -> Result<(), SaveError> {
        debug!(version, "set_version: called");
        self.tx
            .send(SaveCommand::SetVersion { version })
            .await
            .map_err(|_| SaveError::ChannelError)
    }

    /// Stop the actor; pending changes stay in the tracker
    pub async fn shutdown(&self) -> Result<(), SaveError> {
        debug!("shutdown: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SaveCommand::Shutdown { reply: reply_tx })
            .await
            .map_err(|_| SaveError::ChannelError)?;
        reply_rx.await.map_err(|_| SaveError::ChannelError)
    }
}

struct Worker {
    tracker: ChangeTracker,
    transport: Arc<dyn SaveTransport>,
    config: AutoSaveConfig,
    user_id: String,
    version: u64,
    deadline: Option<Instant>,
    state_tx: watch::Sender<AutoSaveState>,
}

impl Worker {
    fn publish(&self, update: impl FnOnce(&mut AutoSaveState)) {
        self.state_tx.send_modify(update);
    }

    /// A change was recorded: (re)arm the debounce
    fn on_change(&mut self) {
        let pending = self.tracker.has_unsaved_changes();
        debug!(pending, enabled = self.config.enabled, "on_change: called");
        if !pending {
            self.deadline = None;
            self.publish(|s| {
                s.has_unsaved_changes = false;
                if s.phase == SavePhase::PendingDebounce {
                    s.phase = SavePhase::Idle;
                }
            });
            return;
        }
        if !self.config.enabled {
            self.publish(|s| s.has_unsaved_changes = true);
            return;
        }

        self.deadline = Some(Instant::now() + self.config.debounce());
        self.publish(|s| {
            s.phase = SavePhase::PendingDebounce;
            s.has_unsaved_changes = true;
        });
    }

    /// Send everything recorded so far
    async fn save(&mut self) -> Result<SaveOutcome, SaveError> {
        self.deadline = None;
        let snapshot = self.tracker.snapshot();
        if snapshot.log.is_empty() {
            debug!("save: nothing to save");
            self.tracker.release_snapshot();
            self.publish(|s| {
                s.phase = SavePhase::Idle;
                s.has_unsaved_changes = false;
            });
            return Ok(SaveOutcome::NothingToSave);
        }

        debug!(through = snapshot.through, entries = snapshot.log.len(), version = self.version, "save: called");
        self.publish(|s| {
            s.phase = SavePhase::Saving;
            s.is_saving = true;
            s.error = None;
        });

        let request = SaveRequest::new(self.version, self.user_id.clone(), snapshot.log);
        let result = match self.transport.save(request).await {
            Ok(response) => response.into_result(),
            Err(e) => Err(e),
        };

        match result {
            Ok(version) => {
                self.tracker.clear_through(snapshot.through);
                self.version = version;
                let pending = self.tracker.has_unsaved_changes();
                info!(version, pending, "Saved changes");
                self.publish(|s| {
                    s.phase = SavePhase::Idle;
                    s.is_saving = false;
                    s.last_saved = Some(Utc::now());
                    s.error = None;
                    s.has_unsaved_changes = pending;
                    s.version = version;
                });
                Ok(SaveOutcome::Saved { version })
            }
            Err(e) => {
                self.tracker.release_snapshot();
                let server_version = match e.server_version() {
                    Some(version) => Some(version),
                    None if e.is_conflict() => self.fetch_server_version().await,
                    None => None,
                };
                if let Some(server_version) = server_version.filter(|v| *v != self.version) {
                    info!(server_version, "Adopting server version after conflict");
                    self.version = server_version;
                }
                warn!(error = %e, retryable = e.is_retryable(), conflict = e.is_conflict(), "Save failed");
                let message = e.to_string();
                let version = self.version;
                let pending = self.tracker.has_unsaved_changes();
                self.publish(|s| {
                    s.phase = SavePhase::Error;
                    s.is_saving = false;
                    s.error = Some(message);
                    s.has_unsaved_changes = pending;
                    s.version = version;
                });
                Err(e)
            }
        }
    }

    /// Ask the server for its version when a conflict did not name one
    async fn fetch_server_version(&self) -> Option<u64> {
        debug!("fetch_server_version: called");
        match self.transport.fetch_version().await {
            Ok(version) => Some(version),
            Err(e) => {
                warn!(error = %e, "Could not fetch server version after conflict");
                None
            }
        }
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn actor_loop(
    mut worker: Worker,
    mut rx: mpsc::Receiver<SaveCommand>,
    mut revisions: watch::Receiver<u64>,
) {
    debug!("AutoSaver actor started");

    loop {
        let deadline = worker.deadline;
        tokio::select! {
            changed = revisions.changed() => {
                if changed.is_err() {
                    debug!("actor_loop: tracker dropped");
                    break;
                }
                worker.on_change();
            }

            _ = wait_for(deadline) => {
                debug!("actor_loop: debounce elapsed");
                // Failures are published through the state channel
                let _ = worker.save().await;
            }

            cmd = rx.recv() => match cmd {
                Some(SaveCommand::ForceSave { reply }) => {
                    debug!("actor_loop: ForceSave command");
                    let result = worker.save().await;
                    let _ = reply.send(result);
                }
                Some(SaveCommand::SetVersion { version }) => {
                    debug!(version, "actor_loop: SetVersion command");
                    worker.version = version;
                    worker.publish(|s| s.version = version);
                }
                Some(SaveCommand::Shutdown { reply }) => {
                    debug!("actor_loop: Shutdown command");
                    let _ = reply.send(());
                    break;
                }
                None => {
                    debug!("actor_loop: all handles dropped");
                    break;
                }
            },
        }
    }

    info!("AutoSaver stopped");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::persist::SaveResponse;
    use crate::persist::mock::MockTransport;
    use crate::tracker::{ResourceValue, TaskValue, TeamValue};
    use serde_json::json;

    fn setup(config: AutoSaveConfig, transport: MockTransport) -> (ChangeTracker, Arc<MockTransport>, AutoSaver) {
        let tracker = ChangeTracker::new();
        let transport = Arc::new(transport);
        let saver = AutoSaver::spawn(tracker.clone(), transport.clone(), config, "u1", 1);
        (tracker, transport, saver)
    }

    fn edit_plan(tracker: &ChangeTracker, id: &str, from: u32, to: u32) {
        tracker.add_cell_change(id, TaskValue::PlanWeeks(from), TaskValue::PlanWeeks(to));
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_edits_coalesce_into_one_save() {
        let (tracker, transport, saver) = setup(AutoSaveConfig::default(), MockTransport::new());

        edit_plan(&tracker, "t1", 1, 2);
        advance(500).await;
        edit_plan(&tracker, "t1", 2, 3);
        advance(500).await;
        tracker.add_cell_change("r1", ResourceValue::Function("qa".into()), ResourceValue::Function("dev".into()));
        advance(1500).await;
        assert_eq!(transport.call_count(), 0, "debounce restarts on every edit");
        assert_eq!(saver.state().phase, SavePhase::PendingDebounce);

        advance(600).await;

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let body = serde_json::to_value(&requests[0]).unwrap();
        assert_eq!(body["version"], json!(1));
        assert_eq!(body["userId"], json!("u1"));
        assert_eq!(body["tasks"], json!([{"id": "t1", "planWeeks": 3}]));
        assert_eq!(body["resources"], json!([{"id": "r1", "fn": "dev"}]));
        assert!(body.get("teams").is_none());
        assert!(body.get("deleted").is_none());

        let state = saver.state();
        assert_eq!(state.phase, SavePhase::Idle);
        assert_eq!(state.version, 2);
        assert!(!state.has_unsaved_changes);
        assert!(state.last_saved.is_some());
        assert!(!tracker.has_unsaved_changes());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_windows_send_separate_saves() {
        let (tracker, transport, saver) = setup(AutoSaveConfig::default(), MockTransport::new());

        edit_plan(&tracker, "t1", 1, 2);
        advance(2500).await;
        tracker.add_cell_change(
            "Core",
            TeamValue::JiraProject("A".into()),
            TeamValue::JiraProject("B".into()),
        );
        advance(2500).await;

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].version, 1);
        assert_eq!(requests[1].version, 2);
        assert!(requests[1].changes.tasks.is_empty());
        assert_eq!(requests[1].changes.teams.len(), 1);
        assert_eq!(saver.state().version, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_edits_during_save_stay_pending() {
        let transport = MockTransport::new().with_delay(Duration::from_millis(1000));
        let (tracker, transport, saver) = setup(AutoSaveConfig::default(), transport);

        edit_plan(&tracker, "t1", 1, 2);
        advance(2100).await;
        assert_eq!(saver.state().phase, SavePhase::Saving);
        assert!(saver.state().is_saving);

        edit_plan(&tracker, "t2", 1, 4);
        advance(1000).await;

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].changes.find(crate::domain::EntityKind::Task, "t2").is_none());
        assert!(tracker.has_unsaved_changes());
        assert_eq!(saver.state().phase, SavePhase::PendingDebounce);

        advance(3100).await;

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].version, 2);
        assert_eq!(requests[1].changes.tasks, vec![json!({"id": "t2", "planWeeks": 4}).as_object().unwrap().clone()]);
        assert!(!tracker.has_unsaved_changes());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_save_keeps_changes() {
        let transport = MockTransport::new();
        transport.push_response(Err(SaveError::ApiError {
            status: 500,
            message: "boom".into(),
        }));
        let (tracker, transport, saver) = setup(AutoSaveConfig::default(), transport);

        edit_plan(&tracker, "t1", 1, 2);
        advance(2100).await;

        let state = saver.state();
        assert_eq!(state.phase, SavePhase::Error);
        assert_eq!(state.error.as_deref(), Some("API error 500: boom"));
        assert!(state.has_unsaved_changes);
        assert!(tracker.has_unsaved_changes());

        // A manual retry sends the same changes again
        let outcome = saver.force_save().await.unwrap();
        assert_eq!(outcome, SaveOutcome::Saved { version: 2 });
        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].changes, requests[1].changes);
        assert_eq!(saver.state().error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_edit_after_failure_rearms_debounce() {
        let transport = MockTransport::new();
        transport.push_response(Ok(SaveResponse::rejected(0, "disk full")));
        let (tracker, transport, saver) = setup(AutoSaveConfig::default(), transport);

        edit_plan(&tracker, "t1", 1, 2);
        advance(2100).await;
        assert_eq!(saver.state().phase, SavePhase::Error);

        edit_plan(&tracker, "t1", 2, 3);
        advance(2100).await;

        assert_eq!(transport.call_count(), 2);
        assert_eq!(saver.state().phase, SavePhase::Idle);
        assert_eq!(transport.requests()[1].changes.tasks[0]["planWeeks"], json!(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_save_cancels_debounce() {
        let (tracker, transport, saver) = setup(AutoSaveConfig::default(), MockTransport::new());

        edit_plan(&tracker, "t1", 1, 2);
        let outcome = saver.force_save().await.unwrap();
        assert_eq!(outcome, SaveOutcome::Saved { version: 2 });

        advance(5000).await;
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_log_never_reaches_network() {
        let (_tracker, transport, saver) = setup(AutoSaveConfig::default(), MockTransport::new());

        assert_eq!(saver.force_save().await.unwrap(), SaveOutcome::NothingToSave);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_conflict_adopts_server_version() {
        let transport = MockTransport::new();
        transport.push_response(Ok(SaveResponse::rejected(7, "Version conflict: server has 7")));
        let (tracker, transport, saver) = setup(AutoSaveConfig::default(), transport);

        edit_plan(&tracker, "t1", 1, 2);
        let err = saver.force_save().await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(saver.state().version, 7);

        assert_eq!(saver.force_save().await.unwrap(), SaveOutcome::Saved { version: 8 });
        assert_eq!(transport.requests()[1].version, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_conflict_version_named_in_message() {
        let transport = MockTransport::new();
        transport.push_response(Ok(SaveResponse::rejected(
            0,
            "Version conflict: client version 1, server version 5",
        )));
        let (tracker, transport, saver) = setup(AutoSaveConfig::default(), transport);

        edit_plan(&tracker, "t1", 1, 2);
        let err = saver.force_save().await.unwrap_err();
        assert_eq!(err.server_version(), Some(5));
        assert_eq!(saver.state().version, 5);
        assert_eq!(transport.version_fetches(), 0);

        assert_eq!(saver.force_save().await.unwrap(), SaveOutcome::Saved { version: 6 });
        let versions: Vec<u64> = transport.requests().iter().map(|r| r.version).collect();
        assert_eq!(versions, vec![1, 5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_conflict_without_version_fetches_it() {
        let transport = MockTransport::new().with_server_version(9);
        transport.push_response(Ok(SaveResponse::rejected(0, "version mismatch")));
        let (tracker, transport, saver) = setup(AutoSaveConfig::default(), transport);

        edit_plan(&tracker, "t1", 1, 2);
        assert!(saver.force_save().await.unwrap_err().is_conflict());
        assert_eq!(transport.version_fetches(), 1);
        assert_eq!(saver.state().version, 9);
        assert_eq!(saver.state().phase, SavePhase::Error);

        assert_eq!(saver.force_save().await.unwrap(), SaveOutcome::Saved { version: 10 });
        assert_eq!(transport.requests()[1].version, 9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_does_not_fetch_version() {
        let transport = MockTransport::new().with_server_version(9);
        transport.push_response(Ok(SaveResponse::rejected(0, "disk full")));
        let (tracker, transport, saver) = setup(AutoSaveConfig::default(), transport);

        edit_plan(&tracker, "t1", 1, 2);
        saver.force_save().await.unwrap_err();
        assert_eq!(transport.version_fetches(), 0);
        assert_eq!(saver.state().version, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_only_forced_saves() {
        let config = AutoSaveConfig {
            enabled: false,
            ..Default::default()
        };
        let (tracker, transport, saver) = setup(config, MockTransport::new());

        edit_plan(&tracker, "t1", 1, 2);
        advance(5000).await;
        assert_eq!(transport.call_count(), 0);
        assert!(saver.state().has_unsaved_changes);

        saver.force_save().await.unwrap();
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_version_and_shutdown() {
        let (tracker, transport, saver) = setup(AutoSaveConfig::default(), MockTransport::new());

        saver.set_version(41).await.unwrap();
        edit_plan(&tracker, "t1", 1, 2);
        saver.force_save().await.unwrap();
        assert_eq!(transport.requests()[0].version, 41);

        saver.shutdown().await.unwrap();
        assert!(matches!(saver.force_save().await, Err(SaveError::ChannelError)));
    }
}
