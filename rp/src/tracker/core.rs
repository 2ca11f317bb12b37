//! ChangeTracker - pending field and row changes since the last save
//!
//! The tracker is a cheap-to-clone handle. The host records changes as they
//! happen; the persistence coordinator snapshots the log, sends it, and on
//! success clears exactly the entries that were part of that snapshot.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::field::{Cell, FieldKey};
use super::log::{ChangeLog, EntityPatch, id_key};
use crate::domain::EntityKind;

/// Row-level lifecycle event
#[derive(Debug, Clone, PartialEq)]
pub enum RowAction {
    /// Row created locally; carries the full initial object
    Added(Map<String, Value>),
    Deleted,
}

impl RowAction {
    /// Build an `Added` action from a serializable row
    pub fn added<T: Serialize>(row: &T) -> Result<Self, serde_json::Error> {
        match serde_json::to_value(row)? {
            Value::Object(map) => Ok(Self::Added(map)),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                Ok(Self::Added(map))
            }
        }
    }
}

/// A change log together with the highest sequence number it covers
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSnapshot {
    pub log: ChangeLog,
    pub through: u64,
}

#[derive(Debug, Clone)]
struct CellEntry {
    value: Cell,
    seq: u64,
    at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct RowEntry {
    action: RowAction,
    seq: u64,
    at: DateTime<Utc>,
    /// Deletion of a row whose add is still in flight
    supersedes_add: bool,
}

type RowKey = (EntityKind, String);

#[derive(Debug, Default)]
struct TrackerState {
    cells: BTreeMap<(EntityKind, String, FieldKey), CellEntry>,
    rows: BTreeMap<RowKey, RowEntry>,
    last_seq: u64,
    /// Highest sequence handed to a snapshot that has not been resolved
    snapshot_mark: u64,
    /// Highest sequence confirmed saved
    cleared_mark: u64,
}

impl TrackerState {
    fn next_seq(&mut self) -> u64 {
        self.last_seq += 1;
        self.last_seq
    }

    fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.rows.is_empty()
    }

    fn build(&self) -> ChangeLog {
        debug!(cells = self.cells.len(), rows = self.rows.len(), "TrackerState::build: called");
        // (kind, id) -> (first seq, patch)
        let mut patches: HashMap<RowKey, (u64, EntityPatch)> = HashMap::new();
        let mut log = ChangeLog::default();
        let mut deleted: Vec<(u64, EntityKind, String)> = Vec::new();

        for ((kind, id), entry) in &self.rows {
            match &entry.action {
                RowAction::Added(data) => {
                    let mut patch = data.clone();
                    patch.insert(id_key(*kind).to_string(), Value::String(id.clone()));
                    patches.insert((*kind, id.clone()), (entry.seq, patch));
                }
                RowAction::Deleted => deleted.push((entry.seq, *kind, id.clone())),
            }
        }

        for ((kind, id, field), entry) in &self.cells {
            if matches!(
                self.rows.get(&(*kind, id.clone())).map(|r| &r.action),
                Some(RowAction::Deleted)
            ) {
                debug!(%kind, %id, "TrackerState::build: cell change suppressed by delete");
                continue;
            }
            let (first_seq, patch) = patches.entry((*kind, id.clone())).or_insert_with(|| {
                let mut patch = EntityPatch::new();
                patch.insert(id_key(*kind).to_string(), Value::String(id.clone()));
                (entry.seq, patch)
            });
            *first_seq = (*first_seq).min(entry.seq);
            patch.insert(field.key().to_string(), entry.value.to_json());
        }

        let mut ordered: Vec<(u64, EntityKind, EntityPatch)> =
            patches.into_iter().map(|((kind, _), (seq, patch))| (seq, kind, patch)).collect();
        ordered.sort_by_key(|(seq, _, _)| *seq);
        for (_, kind, patch) in ordered {
            log.entities_mut(kind).push(patch);
        }

        deleted.sort_by_key(|(seq, _, _)| *seq);
        for (_, kind, id) in deleted {
            log.deleted.of_mut(kind).push(id);
        }
        log
    }
}

fn record_cell(state: &mut TrackerState, id: &str, old: Cell, new: Cell) -> bool {
    let field = new.field();
    debug!(%id, field = field.key(), "record_cell: called");
    if old.field() != field {
        warn!(%id, old = old.field().key(), new = field.key(), "record_cell: field mismatch, ignoring");
        return false;
    }
    if old == new {
        debug!(%id, field = field.key(), "record_cell: value unchanged, skipping");
        return false;
    }

    let kind = field.kind();
    if matches!(
        state.rows.get(&(kind, id.to_string())).map(|r| &r.action),
        Some(RowAction::Deleted)
    ) {
        debug!(%kind, %id, "record_cell: row already deleted, skipping");
        return false;
    }
    let seq = state.next_seq();
    state.cells.insert(
        (kind, id.to_string(), field),
        CellEntry {
            value: new,
            seq,
            at: Utc::now(),
        },
    );
    true
}

/// Shared tracker of unsaved changes
#[derive(Clone)]
pub struct ChangeTracker {
    state: Arc<Mutex<TrackerState>>,
    revision: Arc<watch::Sender<u64>>,
}

impl Default for ChangeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChangeTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeTracker")
            .field("revision", &*self.revision.borrow())
            .finish_non_exhaustive()
    }
}

impl ChangeTracker {
    pub fn new() -> Self {
        debug!("ChangeTracker::new: called");
        let (revision, _) = watch::channel(0);
        Self {
            state: Arc::new(Mutex::new(TrackerState::default())),
            revision: Arc::new(revision),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r += 1);
    }

    /// Receive a notification for every recorded change
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Current revision (number of recorded changes since creation)
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Record a field change. Returns false when nothing was recorded.
    ///
    /// Editing the same field twice keeps only the latest value.
    pub fn add_cell_change(&self, id: &str, old: impl Into<Cell>, new: impl Into<Cell>) -> bool {
        let recorded = record_cell(&mut self.lock(), id, old.into(), new.into());
        if recorded {
            self.bump();
        }
        recorded
    }

    /// Record several field changes as one change set
    ///
    /// The whole set is visible to a snapshot at once. Returns how many
    /// changes were recorded.
    pub fn add_cell_changes<I>(&self, changes: I) -> usize
    where
        I: IntoIterator<Item = (String, Cell, Cell)>,
    {
        let mut recorded = 0;
        {
            let mut state = self.lock();
            for (id, old, new) in changes {
                if record_cell(&mut state, &id, old, new) {
                    recorded += 1;
                }
            }
        }
        debug!(recorded, "add_cell_changes: called");
        if recorded > 0 {
            self.bump();
        }
        recorded
    }

    /// Record a row creation or deletion
    pub fn add_row_change(&self, kind: EntityKind, id: &str, action: RowAction) {
        debug!(%kind, %id, deleted = matches!(action, RowAction::Deleted), "add_row_change: called");
        {
            let mut state = self.lock();
            let key = (kind, id.to_string());
            match action {
                RowAction::Deleted => {
                    state.cells.retain(|(k, i, _), _| !(*k == kind && i == id));
                    let pending_add = match state.rows.get(&key) {
                        Some(RowEntry {
                            action: RowAction::Added(_),
                            seq,
                            ..
                        }) => Some(*seq > state.snapshot_mark),
                        _ => None,
                    };
                    if pending_add == Some(true) {
                        debug!(%kind, %id, "add_row_change: row never sent, dropping all traces");
                        state.rows.remove(&key);
                    } else {
                        let seq = state.next_seq();
                        state.rows.insert(
                            key,
                            RowEntry {
                                action: RowAction::Deleted,
                                seq,
                                at: Utc::now(),
                                supersedes_add: pending_add.is_some(),
                            },
                        );
                    }
                }
                added => {
                    let seq = state.next_seq();
                    state.rows.insert(
                        key,
                        RowEntry {
                            action: added,
                            seq,
                            at: Utc::now(),
                            supersedes_add: false,
                        },
                    );
                }
            }
        }
        self.bump();
    }

    /// Build the change log from the current pending state
    pub fn build_change_log(&self) -> ChangeLog {
        debug!("build_change_log: called");
        self.lock().build()
    }

    /// Build the change log and mark its entries as in flight
    pub fn snapshot(&self) -> ChangeSnapshot {
        let mut state = self.lock();
        let through = state.last_seq;
        state.snapshot_mark = through;
        let log = state.build();
        debug!(through, entries = log.len(), "snapshot: called");
        ChangeSnapshot { log, through }
    }

    /// Drop every entry covered by a confirmed snapshot
    ///
    /// Entries recorded after the snapshot (including newer values of the
    /// same field) stay pending.
    pub fn clear_through(&self, through: u64) {
        let mut state = self.lock();
        let before = state.cells.len() + state.rows.len();
        state.cells.retain(|_, e| e.seq > through);
        state.rows.retain(|_, e| e.seq > through);
        // in-flight adds are confirmed now
        state.rows.values_mut().for_each(|e| e.supersedes_add = false);
        state.cleared_mark = state.cleared_mark.max(through);
        state.snapshot_mark = state.cleared_mark;
        debug!(
            through,
            removed = before - (state.cells.len() + state.rows.len()),
            "clear_through: called"
        );
    }

    /// Forget the in-flight mark after a failed save
    ///
    /// Rows added and deleted around the failed save never reached the
    /// server, so their deletions are dropped too.
    pub fn release_snapshot(&self) {
        let mut state = self.lock();
        debug!(mark = state.snapshot_mark, cleared = state.cleared_mark, "release_snapshot: called");
        state.snapshot_mark = state.cleared_mark;
        state
            .rows
            .retain(|_, e| !(e.supersedes_add && matches!(e.action, RowAction::Deleted)));
    }

    /// Drop all pending changes (after a full reload)
    pub fn clear_changes(&self) {
        debug!("clear_changes: called");
        let mut state = self.lock();
        state.cells.clear();
        state.rows.clear();
        state.cleared_mark = state.last_seq;
        state.snapshot_mark = state.last_seq;
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.lock().is_empty()
    }

    /// Timestamp of the oldest pending change
    pub fn oldest_change_at(&self) -> Option<DateTime<Utc>> {
        let state = self.lock();
        state
            .cells
            .values()
            .map(|c| c.at)
            .chain(state.rows.values().map(|r| r.at))
            .min()
    }
}
