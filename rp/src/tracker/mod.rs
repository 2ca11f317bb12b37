//! Change tracking
//!
//! Records typed field and row changes as the grid is edited and builds the
//! minimal change log sent to the server.

mod core;
mod field;
mod log;

pub use self::core::{ChangeSnapshot, ChangeTracker, RowAction};
pub use field::{
    Cell, FieldKey, ResourceField, ResourceValue, SprintField, SprintValue, TaskField, TaskValue, TeamField, TeamValue,
};
pub use log::{ChangeLog, DeletedIds, EntityPatch, id_key};
