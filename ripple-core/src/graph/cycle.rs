//! Cycle Guard
//!
//! Reachability over parent edges. Every new edge `parent -> child` is
//! checked before the graph is mutated: if `parent` already reaches `child`,
//! the edge would close a cycle and is rejected.

use std::collections::{HashSet, VecDeque};

use super::arena::Graph;
use super::node::NodeId;

/// Breadth-first search from `root` over parent edges.
///
/// Returns `true` as soon as any of `targets` is reached (the root itself
/// included). A `None` root is treated as reaching everything, which is what
/// "no parent yet" sentinels expect.
pub fn reaches(graph: &Graph, root: Option<NodeId>, targets: &[NodeId]) -> bool {
    let Some(root) = root else { return true };

    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([root]);
    while let Some(id) = queue.pop_front() {
        if targets.contains(&id) {
            return true;
        }
        if !visited.insert(id) {
            continue;
        }
        if let Some(node) = graph.get(id) {
            queue.extend(node.parents().iter().filter(|parent| !visited.contains(parent)));
        }
    }
    false
}
