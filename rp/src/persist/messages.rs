//! Auto-save actor messages and published state

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::oneshot;

use super::SaveError;

/// Where the auto-saver is in its save cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SavePhase {
    #[default]
    Idle,
    /// Waiting for the debounce period to pass
    PendingDebounce,
    Saving,
    /// Last save failed; changes are still pending
    Error,
}

impl std::fmt::Display for SavePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::PendingDebounce => write!(f, "pending"),
            Self::Saving => write!(f, "saving"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Save status exposed to the host
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoSaveState {
    pub phase: SavePhase,
    pub is_saving: bool,
    pub last_saved: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub has_unsaved_changes: bool,
    /// Server version the next save is sent with
    pub version: u64,
}

/// Result of a completed save request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { version: u64 },
    /// The change log was empty; nothing was sent
    NothingToSave,
}

/// Commands sent to the AutoSaver actor
#[derive(Debug)]
pub enum SaveCommand {
    /// Cancel the debounce timer and save now
    ForceSave {
        reply: oneshot::Sender<Result<SaveOutcome, SaveError>>,
    },
    /// Adopt a version obtained elsewhere (e.g. after a reload)
    SetVersion { version: u64 },
    Shutdown { reply: oneshot::Sender<()> },
}
