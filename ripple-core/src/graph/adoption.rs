//! Parent/Child Adoption
//!
//! Wiring happens in two steps. Setting or adding a parent stores a read
//! reference (the child may read the parent, and its depth follows the
//! parent's), but does not subscribe. [`Graph::commit`] then registers a
//! finished node in the children set of every current parent, and only from
//! that point on do changes propagate to it.

use tracing::trace;

use super::arena::Graph;
use super::cycle::reaches;
use super::node::{NodeId, ParentSlot};
use crate::error::{GraphError, Result};

impl Graph {
    /// Set a single parent slot.
    ///
    /// Returns `Ok(false)` when the slot already holds `parent`. The new
    /// edge is checked by the cycle guard before anything is mutated. The
    /// child is not subscribed to the new parent.
    pub fn set_parent(&mut self, child: NodeId, slot: usize, parent: Option<NodeId>) -> Result<bool> {
        let current = match self.node(child)?.parents().slot(slot) {
            Some(ParentSlot::Single(current)) => *current,
            _ => {
                return Err(GraphError::NoSuchSlot {
                    node: child,
                    slot,
                    shape: "single",
                })
            }
        };
        if current == parent {
            return Ok(false);
        }

        if let Some(parent) = parent {
            self.check_port(child, slot, parent)?;
            self.guard_edge(parent, child)?;
            self.retain(parent, child)?;
        }
        if let Some(old) = current {
            self.release(old, child);
        }

        if let Some(ParentSlot::Single(stored)) = self.node_mut(child)?.parents.slot_mut(slot) {
            *stored = parent;
        }
        self.refresh_depth(child);
        Ok(true)
    }

    /// Append parents to a list slot.
    ///
    /// Every new edge is validated before the list changes. Live children are
    /// subscribed to the added parents. Returns whether anything was added.
    pub fn add_parents(&mut self, child: NodeId, slot: usize, parents: &[NodeId]) -> Result<bool> {
        self.list_slot(child, slot)?;
        if parents.is_empty() {
            return Ok(false);
        }
        for parent in parents {
            self.check_port(child, slot, *parent)?;
            self.guard_edge(*parent, child)?;
        }

        let live = self.node(child)?.is_live();
        for parent in parents {
            self.retain(*parent, child)?;
            if live {
                self.subscribe(*parent, child)?;
            }
        }
        if let Some(ParentSlot::List(list)) = self.node_mut(child)?.parents.slot_mut(slot) {
            list.extend_from_slice(parents);
        }
        self.refresh_depth(child);
        Ok(true)
    }

    /// Remove one occurrence of each given parent from a list slot.
    ///
    /// A parent that is no longer referenced at all loses the child from its
    /// children set. Returns whether anything was removed.
    pub fn remove_parents(&mut self, child: NodeId, slot: usize, parents: &[NodeId]) -> Result<bool> {
        self.list_slot(child, slot)?;

        let mut removed = Vec::new();
        if let Some(ParentSlot::List(list)) = self.node_mut(child)?.parents.slot_mut(slot) {
            for parent in parents {
                if let Some(position) = list.iter().position(|p| p == parent) {
                    list.remove(position);
                    removed.push(*parent);
                }
            }
        }
        if removed.is_empty() {
            return Ok(false);
        }

        for parent in removed {
            self.release(parent, child);
        }
        self.refresh_depth(child);
        Ok(true)
    }

    /// Replace the whole content of a list slot.
    ///
    /// The new list is validated as a whole first; on error the slot keeps
    /// its old parents.
    pub fn set_parent_list(&mut self, child: NodeId, slot: usize, parents: Vec<NodeId>) -> Result<bool> {
        let current = self.list_slot(child, slot)?.to_vec();
        if current == parents {
            return Ok(false);
        }
        // a path from a new parent to `child` never runs through the edges
        // being removed, so checking against the current graph is exact
        for parent in &parents {
            self.check_port(child, slot, *parent)?;
            self.guard_edge(*parent, child)?;
        }
        self.remove_parents(child, slot, &current)?;
        self.add_parents(child, slot, &parents)?;
        Ok(true)
    }

    /// Subscribe `id` to every current parent and mark it live.
    ///
    /// This is the step that makes future changes of the parents propagate
    /// to the node. Committing twice is harmless.
    pub fn commit(&mut self, id: NodeId) -> Result<()> {
        let parents: Vec<NodeId> = self.node(id)?.parents().iter().collect();
        for parent in parents {
            self.subscribe(parent, id)?;
        }
        self.node_mut(id)?.live = true;
        trace!(node = %id, "committed");
        Ok(())
    }

    /// Whether `child` is in the children set of `parent`.
    pub fn is_subscribed(&self, parent: NodeId, child: NodeId) -> bool {
        self.get(parent)
            .is_some_and(|node| node.children().contains(&child))
    }

    /// Re-point every reader of `old` to `new`.
    ///
    /// Subscriptions move along with the references and the readers' depths
    /// are recomputed. `old` keeps its own parents; detaching it is up to the
    /// caller. Returns the number of readers moved.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<usize> {
        if old == new {
            return Ok(0);
        }
        let old_output = self.node(old)?.behavior().output();
        let new_output = self.node(new)?.behavior().output();
        if old_output != new_output {
            return Err(GraphError::PortMismatch {
                kind: self.node(new)?.kind().to_string(),
                slot: 0,
                expected: old_output.to_string(),
                found: new_output.to_string(),
            });
        }

        let old_node = self.node(old)?;
        let readers: Vec<(NodeId, usize)> = old_node
            .readers()
            .iter()
            .map(|(reader, count)| (*reader, *count))
            .collect();
        let subscribed: Vec<NodeId> = old_node.children().iter().copied().collect();
        for (reader, _) in &readers {
            self.guard_edge(new, *reader)?;
        }

        for (reader, count) in &readers {
            let node = self.node_mut(*reader)?;
            for slot in node.parents.slots_mut() {
                slot.repoint(old, new);
            }
            {
                let new_node = self.node_mut(new)?;
                *new_node.readers.entry(*reader).or_insert(0) += count;
                if subscribed.contains(reader) {
                    new_node.children.insert(*reader);
                }
            }
            let old_node = self.node_mut(old)?;
            old_node.readers.shift_remove(reader);
            old_node.children.shift_remove(reader);
            self.refresh_depth(*reader);
        }

        trace!(%old, %new, readers = readers.len(), "replaced");
        Ok(readers.len())
    }

    /// Remove a node that nothing reads anymore.
    ///
    /// The node disappears from its parents' reader and children sets and its
    /// handle becomes dead.
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        let readers = self.node(id)?.readers().len();
        if readers > 0 {
            return Err(GraphError::StillReferenced { node: id, readers });
        }
        if let Some(node) = self.remove_slot(id) {
            for parent in node.parents().iter() {
                self.release(parent, id);
            }
        }
        trace!(node = %id, "detached");
        Ok(())
    }

    /// Detach uncommitted, non-source nodes left without readers, walking
    /// up through their parents. Returns the number of nodes removed.
    pub(crate) fn prune_orphans(&mut self, candidates: Vec<NodeId>) -> usize {
        let mut pending = candidates;
        let mut pruned = 0;
        while let Some(id) = pending.pop() {
            let Some(node) = self.get(id) else { continue };
            if node.is_live() || node.behavior().is_source() || !node.readers().is_empty() {
                continue;
            }
            let parents: Vec<NodeId> = node.parents().iter().collect();
            if self.detach(id).is_ok() {
                pruned += 1;
                pending.extend(parents);
            }
        }
        pruned
    }

    pub(crate) fn guard_edge(&self, parent: NodeId, child: NodeId) -> Result<()> {
        if reaches(self, Some(parent), &[child]) {
            tracing::warn!(%parent, %child, "rejected cycle-introducing edge");
            return Err(GraphError::Cycle { parent, child });
        }
        Ok(())
    }

    fn list_slot(&self, child: NodeId, slot: usize) -> Result<&[NodeId]> {
        match self.node(child)?.parents().slot(slot) {
            Some(ParentSlot::List(list)) => Ok(list),
            _ => Err(GraphError::NoSuchSlot {
                node: child,
                slot,
                shape: "list",
            }),
        }
    }

    /// Record one more read reference from `child` to `parent`.
    pub(crate) fn retain(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        *self.node_mut(parent)?.readers.entry(child).or_insert(0) += 1;
        Ok(())
    }

    /// Drop one read reference; the last one also drops the subscription.
    fn release(&mut self, parent: NodeId, child: NodeId) {
        let Ok(node) = self.node_mut(parent) else { return };
        let Some(count) = node.readers.get_mut(&child) else { return };
        *count -= 1;
        if *count == 0 {
            node.readers.shift_remove(&child);
            node.children.shift_remove(&child);
        }
    }

    fn subscribe(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.node_mut(parent)?.children.insert(child);
        Ok(())
    }
}
