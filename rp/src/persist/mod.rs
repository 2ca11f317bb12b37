//! Persistence - debounced auto-save of tracked changes
//!
//! [`AutoSaver`] watches the [`ChangeTracker`](crate::tracker::ChangeTracker)
//! and ships change logs through a [`SaveTransport`], tracking the server's
//! optimistic-concurrency version.

mod config;
mod error;
mod messages;
mod saver;
mod transport;

pub use config::{AutoSaveConfig, ServerConfig};
pub use error::SaveError;
pub use messages::{AutoSaveState, SaveCommand, SaveOutcome, SavePhase};
pub use saver::AutoSaver;
#[cfg(test)]
pub use transport::mock;
pub use transport::{HttpTransport, SaveRequest, SaveResponse, SaveTransport};
