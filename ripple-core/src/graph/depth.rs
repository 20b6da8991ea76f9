//! Depth Invariant
//!
//! A node's depth is 0 without parents, else one more than the deepest
//! parent. Whenever a node's parents change, its depth is recomputed and a
//! change cascades through every node that reads it. The cascade terminates
//! because the cycle guard keeps the graph acyclic.

use std::collections::VecDeque;

use super::arena::Graph;
use super::node::{NodeId, ParentCollection};

impl Graph {
    /// Depth a node with these parents must have.
    pub(crate) fn depth_from(&self, parents: &ParentCollection) -> u32 {
        parents
            .iter()
            .filter_map(|parent| self.get(parent))
            .map(|parent| parent.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Recompute the depth of `start` and cascade to its readers.
    ///
    /// Returns the number of nodes whose depth changed.
    pub(crate) fn refresh_depth(&mut self, start: NodeId) -> usize {
        let mut queue = VecDeque::from([start]);
        let mut updated = 0;

        while let Some(id) = queue.pop_front() {
            let Some(node) = self.get(id) else { continue };
            let depth = self.depth_from(node.parents());
            if depth == node.depth() {
                continue;
            }

            let Ok(node) = self.node_mut(id) else { continue };
            node.depth = depth;
            updated += 1;
            queue.extend(node.readers.keys().copied());
        }
        updated
    }

    /// Every (parent, child) pair where the child is not deeper than the
    /// parent. Empty whenever the invariant holds.
    pub fn depth_violations(&self) -> Vec<(NodeId, NodeId)> {
        self.ids()
            .filter_map(|id| self.get(id))
            .flat_map(|child| {
                child
                    .parents()
                    .iter()
                    .filter(|parent| {
                        self.get(*parent)
                            .map_or(true, |parent| parent.depth() >= child.depth())
                    })
                    .map(|parent| (parent, child.id()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}
