//! Doubly linked display order over rows of one kind

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use super::OrderError;
use crate::domain::{ResourceRow, RowId, TaskRow};

/// A row that carries `prevId`/`nextId` order pointers
pub trait OrderedRow {
    fn id(&self) -> &RowId;
    fn prev_id(&self) -> Option<&RowId>;
    fn next_id(&self) -> Option<&RowId>;
    fn set_prev_id(&mut self, prev: Option<RowId>);
    fn set_next_id(&mut self, next: Option<RowId>);
}

impl OrderedRow for ResourceRow {
    fn id(&self) -> &RowId {
        &self.id
    }

    fn prev_id(&self) -> Option<&RowId> {
        self.prev_id.as_ref()
    }

    fn next_id(&self) -> Option<&RowId> {
        self.next_id.as_ref()
    }

    fn set_prev_id(&mut self, prev: Option<RowId>) {
        self.prev_id = prev;
    }

    fn set_next_id(&mut self, next: Option<RowId>) {
        self.next_id = next;
    }
}

impl OrderedRow for TaskRow {
    fn id(&self) -> &RowId {
        &self.id
    }

    fn prev_id(&self) -> Option<&RowId> {
        self.prev_id.as_ref()
    }

    fn next_id(&self) -> Option<&RowId> {
        self.next_id.as_ref()
    }

    fn set_prev_id(&mut self, prev: Option<RowId>) {
        self.prev_id = prev;
    }

    fn set_next_id(&mut self, next: Option<RowId>) {
        self.next_id = next;
    }
}

/// Where a dragged row lands relative to the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropSide {
    /// Immediately before the target
    Top,
    /// Immediately after the target
    Bottom,
}

impl std::str::FromStr for DropSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "top" | "before" => Ok(Self::Top),
            "bottom" | "after" => Ok(Self::Bottom),
            _ => Err(format!("Unknown drop side: {}", s)),
        }
    }
}

/// Which pointer changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkField {
    Prev,
    Next,
}

/// A changed order pointer on one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkChange {
    pub id: RowId,
    pub field: LinkField,
    pub old: Option<RowId>,
    pub new: Option<RowId>,
}

/// Re-derive prev/next for every row from the slice order
///
/// Returns only the pointers that actually changed.
pub fn relink<R: OrderedRow>(rows: &mut [R]) -> Vec<LinkChange> {
    debug!(row_count = rows.len(), "relink: called");
    let ids: Vec<RowId> = rows.iter().map(|r| r.id().clone()).collect();
    let mut changes = Vec::new();

    for (idx, row) in rows.iter_mut().enumerate() {
        let prev = idx.checked_sub(1).map(|i| ids[i].clone());
        let next = ids.get(idx + 1).cloned();

        if row.prev_id() != prev.as_ref() {
            changes.push(LinkChange {
                id: ids[idx].clone(),
                field: LinkField::Prev,
                old: row.prev_id().cloned(),
                new: prev.clone(),
            });
            row.set_prev_id(prev);
        }
        if row.next_id() != next.as_ref() {
            changes.push(LinkChange {
                id: ids[idx].clone(),
                field: LinkField::Next,
                old: row.next_id().cloned(),
                new: next.clone(),
            });
            row.set_next_id(next);
        }
    }

    debug!(change_count = changes.len(), "relink: complete");
    changes
}

/// Move `dragged` next to `target` and relink the whole collection
///
/// Dropping a row onto itself is a no-op. Dropping onto the neighbour it
/// already sits next to yields no changes.
pub fn move_row<R: OrderedRow>(
    rows: &mut Vec<R>,
    dragged: &str,
    target: &str,
    side: DropSide,
) -> Result<Vec<LinkChange>, OrderError> {
    debug!(%dragged, %target, ?side, "move_row: called");
    if dragged == target {
        debug!("move_row: dragged onto itself, no-op");
        return Ok(Vec::new());
    }

    let from = rows
        .iter()
        .position(|r| r.id() == dragged)
        .ok_or_else(|| OrderError::UnknownRow(dragged.to_string()))?;
    if !rows.iter().any(|r| r.id() == target) {
        return Err(OrderError::UnknownRow(target.to_string()));
    }

    let row = rows.remove(from);
    let target_idx = rows
        .iter()
        .position(|r| r.id() == target)
        .ok_or_else(|| OrderError::UnknownRow(target.to_string()))?;
    let insert_at = match side {
        DropSide::Top => target_idx,
        DropSide::Bottom => target_idx + 1,
    };
    debug!(from, insert_at, "move_row: reinserting");
    rows.insert(insert_at, row);

    Ok(relink(rows))
}

/// Rebuild display order from stored prev/next pointers
///
/// Chains are followed from every head in stored order. Rows that no head
/// reaches (cycles, dangling pointers) are appended in stored order. Call
/// [`relink`] afterwards to repair the pointers.
pub fn restore_order<R: OrderedRow>(rows: Vec<R>) -> Vec<R> {
    debug!(row_count = rows.len(), "restore_order: called");
    let index: HashMap<RowId, usize> = rows.iter().enumerate().map(|(i, r)| (r.id().clone(), i)).collect();
    let mut visited: HashSet<usize> = HashSet::new();
    let mut order: Vec<usize> = Vec::with_capacity(rows.len());

    for (start, row) in rows.iter().enumerate() {
        let is_head = row.prev_id().is_none_or(|p| !index.contains_key(p));
        if !is_head || visited.contains(&start) {
            continue;
        }
        let mut cursor = Some(start);
        while let Some(idx) = cursor {
            if !visited.insert(idx) {
                debug!(idx, "restore_order: chain loops back, stopping walk");
                break;
            }
            order.push(idx);
            cursor = rows[idx].next_id().and_then(|n| index.get(n).copied());
        }
    }

    if order.len() < rows.len() {
        warn!(
            orphaned = rows.len() - order.len(),
            "restore_order: rows not reachable from a head, appending"
        );
        order.extend((0..rows.len()).filter(|i| !visited.contains(i)));
    }

    let mut slots: Vec<Option<R>> = rows.into_iter().map(Some).collect();
    order.into_iter().filter_map(|i| slots[i].take()).collect()
}

/// Check that the rows form exactly one consistent chain in slice order
pub fn check_chain<R: OrderedRow>(rows: &[R]) -> Result<(), OrderError> {
    debug!(row_count = rows.len(), "check_chain: called");
    for (idx, row) in rows.iter().enumerate() {
        let expected_prev = idx.checked_sub(1).map(|i| rows[i].id());
        let expected_next = rows.get(idx + 1).map(|r| r.id());
        if row.prev_id() != expected_prev {
            return Err(OrderError::BrokenChain(format!(
                "{} has prevId {:?}, expected {:?}",
                row.id(),
                row.prev_id().map(RowId::as_str),
                expected_prev.map(RowId::as_str)
            )));
        }
        if row.next_id() != expected_next {
            return Err(OrderError::BrokenChain(format!(
                "{} has nextId {:?}, expected {:?}",
                row.id(),
                row.next_id().map(RowId::as_str),
                expected_next.map(RowId::as_str)
            )));
        }
    }
    Ok(())
}
