//! Cycle detection and topological ordering over blocker edges

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::domain::TaskRow;

/// Adjacency: task id -> blocker ids (only blockers that exist)
pub(super) type BlockerGraph<'a> = HashMap<&'a str, Vec<&'a str>>;

pub(super) fn build_graph(tasks: &[TaskRow]) -> BlockerGraph<'_> {
    debug!(task_count = tasks.len(), "build_graph: called");
    let known: HashSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
    tasks
        .iter()
        .map(|t| {
            let blockers = t
                .blocker_ids
                .iter()
                .map(|b| b.as_str())
                .filter(|b| known.contains(b))
                .collect();
            (t.id.as_str(), blockers)
        })
        .collect()
}

/// Find a cycle in the graph, returning the path that closes it
pub(super) fn find_cycle(graph: &BlockerGraph<'_>) -> Option<Vec<String>> {
    debug!(node_count = graph.len(), "find_cycle: called");
    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut cycle_path = Vec::new();

    // Sorted for a deterministic report
    let mut nodes: Vec<&str> = graph.keys().copied().collect();
    nodes.sort_unstable();

    for node in nodes {
        if !visited.contains(node) && has_cycle_dfs(node, graph, &mut visited, &mut rec_stack, &mut cycle_path) {
            debug!(?cycle_path, "find_cycle: cycle detected");
            return Some(cycle_path);
        }
    }
    None
}

/// DFS helper for cycle detection
fn has_cycle_dfs<'a>(
    node: &'a str,
    graph: &BlockerGraph<'a>,
    visited: &mut HashSet<&'a str>,
    rec_stack: &mut HashSet<&'a str>,
    cycle_path: &mut Vec<String>,
) -> bool {
    debug!(%node, "has_cycle_dfs: called");
    visited.insert(node);
    rec_stack.insert(node);
    cycle_path.push(node.to_string());

    if let Some(blockers) = graph.get(node) {
        for &blocker in blockers {
            if !visited.contains(blocker) {
                debug!(%node, %blocker, "has_cycle_dfs: visiting unvisited blocker");
                if has_cycle_dfs(blocker, graph, visited, rec_stack, cycle_path) {
                    return true;
                }
            } else if rec_stack.contains(blocker) {
                debug!(%node, %blocker, "has_cycle_dfs: back edge found - cycle detected");
                cycle_path.push(blocker.to_string());
                return true;
            }
        }
    }

    rec_stack.remove(node);
    cycle_path.pop();
    false
}

/// Validate the blocker graph of a loaded snapshot
///
/// Returns the cycle path if the stored relations are cyclic.
pub fn validate_graph(tasks: &[TaskRow]) -> Result<(), Vec<String>> {
    debug!(task_count = tasks.len(), "validate_graph: called");
    match find_cycle(&build_graph(tasks)) {
        Some(path) => Err(path),
        None => Ok(()),
    }
}

/// Order tasks so every blocker comes before the tasks it blocks
///
/// Returns indices into `tasks`, stable with respect to slice order. A
/// cyclic graph falls back to slice order.
pub fn topological_order(tasks: &[TaskRow]) -> Vec<usize> {
    debug!(task_count = tasks.len(), "topological_order: called");
    if let Err(path) = validate_graph(tasks) {
        debug!(?path, "topological_order: cycle, falling back to display order");
        return (0..tasks.len()).collect();
    }

    let index_map: HashMap<&str, usize> = tasks.iter().enumerate().map(|(i, t)| (t.id.as_str(), i)).collect();
    let mut visited = HashSet::new();
    let mut result = Vec::with_capacity(tasks.len());

    for idx in 0..tasks.len() {
        topo_dfs_idx(idx, tasks, &index_map, &mut visited, &mut result);
    }

    debug!(result_len = result.len(), "topological_order: complete");
    result
}

/// DFS helper for topological sort (returns indices)
fn topo_dfs_idx(
    idx: usize,
    tasks: &[TaskRow],
    index_map: &HashMap<&str, usize>,
    visited: &mut HashSet<usize>,
    result: &mut Vec<usize>,
) {
    if !visited.insert(idx) {
        return;
    }

    for blocker in &tasks[idx].blocker_ids {
        if let Some(&blocker_idx) = index_map.get(blocker.as_str()) {
            topo_dfs_idx(blocker_idx, tasks, index_map, visited, result);
        } else {
            debug!(idx, %blocker, "topo_dfs_idx: blocker not in task list");
        }
    }
    result.push(idx);
}
