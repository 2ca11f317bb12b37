//! Persistent row order under drag-and-drop
//!
//! Rows of one kind form a doubly linked list through `prevId`/`nextId`.
//! Every reorder re-derives the pointers of the whole kind and reports only
//! the ones that changed.

mod chain;

use thiserror::Error;

pub use chain::{DropSide, LinkChange, LinkField, OrderedRow, check_chain, move_row, relink, restore_order};

use crate::domain::RowKind;

/// Errors from reorder operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("Cannot move a {dragged} row next to a {target} row")]
    KindMismatch { dragged: RowKind, target: RowKind },

    #[error("Row not found: {0}")]
    UnknownRow(String),

    #[error("Broken order chain: {0}")]
    BrokenChain(String),
}
