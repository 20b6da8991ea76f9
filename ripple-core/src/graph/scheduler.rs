//! Pending Queue
//!
//! The queue determines the order in which dirty nodes are evaluated during
//! a round. It ensures that parents are always evaluated before their
//! children.
//!
//! # Algorithm
//!
//! Every node is queued under its depth. Because a child is always deeper
//! than each of its parents, popping the minimum depth guarantees that every
//! parent which can still change in this round has already been evaluated:
//!
//! 1. Seed the queue with the nodes dirtied by the host.
//! 2. Pop the shallowest node and evaluate it.
//! 3. If it changed, queue its children (insert-if-absent).
//! 4. Repeat until empty.
//!
//! Ties at equal depth resolve in insertion order. No per-node ready
//! counters are needed.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use super::node::NodeId;

/// Depth-ordered set of nodes awaiting evaluation.
#[derive(Debug, Default)]
pub struct PendingQueue {
    heap: BinaryHeap<Reverse<(u32, u64, NodeId)>>,
    members: HashSet<NodeId>,
    sequence: u64,
}

impl PendingQueue {
    /// Create a new empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a node unless it is already pending. Returns whether it was added.
    pub fn push(&mut self, id: NodeId, depth: u32) -> bool {
        if !self.members.insert(id) {
            return false;
        }
        self.sequence += 1;
        self.heap.push(Reverse((depth, self.sequence, id)));
        true
    }

    /// Remove and return the shallowest pending node with its depth.
    pub fn pop(&mut self) -> Option<(NodeId, u32)> {
        let Reverse((depth, _, id)) = self.heap.pop()?;
        self.members.remove(&id);
        Some((id, depth))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.members.contains(&id)
    }

    /// Get the number of pending nodes.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Drop every pending node.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.members.clear();
    }
}
