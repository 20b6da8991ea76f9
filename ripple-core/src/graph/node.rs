//! Graph Nodes
//!
//! This module defines the records that live in the graph arena: node
//! handles, parent slots, and the node record itself.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use smallvec::SmallVec;

use super::behavior::Behavior;

/// Stable handle to a node in the graph arena.
///
/// Handles are never reused: once a node is detached its handle stays dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Get the raw ID value.
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a node carries a persistent value or a momentary pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The node holds a typed value between rounds.
    Value,

    /// The node is provoked for at most one round at a time.
    Trigger,
}

/// One parent slot of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentSlot {
    /// A fixed single reference. `None` is a detached slot.
    Single(Option<NodeId>),

    /// A variable-length list. Duplicates are allowed.
    List(Vec<NodeId>),
}

impl ParentSlot {
    /// Iterate over the non-null parents of this slot.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        let (single, list) = match self {
            ParentSlot::Single(parent) => (*parent, &[][..]),
            ParentSlot::List(parents) => (None, parents.as_slice()),
        };
        single.into_iter().chain(list.iter().copied())
    }

    /// Replace every occurrence of `old` by `new`. Returns the number replaced.
    pub(crate) fn repoint(&mut self, old: NodeId, new: NodeId) -> usize {
        match self {
            ParentSlot::Single(Some(parent)) if *parent == old => {
                *parent = new;
                1
            }
            ParentSlot::Single(_) => 0,
            ParentSlot::List(parents) => {
                let mut count = 0;
                for parent in parents.iter_mut().filter(|p| **p == old) {
                    *parent = new;
                    count += 1;
                }
                count
            }
        }
    }
}

/// Uniform view over all parent slots of a node.
///
/// Wiring, the cycle guard, depth computation and debug output all walk
/// parents through this type, regardless of how a node kind lays out its
/// slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentCollection {
    slots: SmallVec<[ParentSlot; 3]>,
}

impl ParentCollection {
    /// An empty collection (a leaf).
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fixed single slot.
    pub fn with_single(mut self, parent: NodeId) -> Self {
        self.slots.push(ParentSlot::Single(Some(parent)));
        self
    }

    /// Append a list slot.
    pub fn with_list(mut self, parents: impl Into<Vec<NodeId>>) -> Self {
        self.slots.push(ParentSlot::List(parents.into()));
        self
    }

    /// One single slot per parent, in order.
    pub fn singles(parents: &[NodeId]) -> Self {
        parents
            .iter()
            .fold(Self::new(), |acc, parent| acc.with_single(*parent))
    }

    /// Number of slots, including empty ones.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Get a slot by index.
    pub fn slot(&self, index: usize) -> Option<&ParentSlot> {
        self.slots.get(index)
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut ParentSlot> {
        self.slots.get_mut(index)
    }

    pub(crate) fn slots_mut(&mut self) -> impl Iterator<Item = &mut ParentSlot> {
        self.slots.iter_mut()
    }

    /// All slots in order.
    pub fn slots(&self) -> &[ParentSlot] {
        &self.slots
    }

    /// The parent in a single slot, if the slot exists and is set.
    pub fn single_at(&self, index: usize) -> Option<NodeId> {
        match self.slots.get(index) {
            Some(ParentSlot::Single(parent)) => *parent,
            _ => None,
        }
    }

    /// The parents of a list slot, or an empty slice.
    pub fn list_at(&self, index: usize) -> &[NodeId] {
        match self.slots.get(index) {
            Some(ParentSlot::List(parents)) => parents,
            _ => &[],
        }
    }

    /// Iterate over every non-null parent, slot by slot.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots.iter().flat_map(ParentSlot::iter)
    }

    /// Whether there is no non-null parent at all.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Whether `id` appears in any slot.
    pub fn contains(&self, id: NodeId) -> bool {
        self.iter().any(|parent| parent == id)
    }
}

/// A node record in the graph arena.
///
/// Two relations connect a node to its parents:
///
/// - every parent lists the node in its `readers`, counted per reference;
///   depth changes cascade along this relation;
/// - once the node is committed, every parent also lists it in `children`;
///   the engine only propagates along this relation.
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    role: Role,
    pub(crate) depth: u32,
    pub(crate) live: bool,
    pub(crate) parents: ParentCollection,
    pub(crate) readers: IndexMap<NodeId, usize>,
    pub(crate) children: IndexSet<NodeId>,
    pub(crate) behavior: Box<dyn Behavior>,
}

impl Node {
    pub(crate) fn new(
        id: NodeId,
        depth: u32,
        parents: ParentCollection,
        behavior: Box<dyn Behavior>,
    ) -> Self {
        Self {
            id,
            role: behavior.role(),
            depth,
            live: false,
            parents,
            readers: IndexMap::new(),
            children: IndexSet::new(),
            behavior,
        }
    }

    /// Get the node's ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Value or trigger.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Topological rank: 0 for leaves, else one more than the deepest parent.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Whether the node has been committed as part of a live definition.
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// The node's parent slots.
    pub fn parents(&self) -> &ParentCollection {
        &self.parents
    }

    /// Nodes that reference this node in a parent slot, with reference counts.
    pub fn readers(&self) -> &IndexMap<NodeId, usize> {
        &self.readers
    }

    /// Nodes subscribed to this node's changes.
    pub fn children(&self) -> &IndexSet<NodeId> {
        &self.children
    }

    /// The node kind.
    pub fn behavior(&self) -> &dyn Behavior {
        self.behavior.as_ref()
    }

    /// Short kind name, e.g. `Sum` or `InputTrigger`.
    pub fn kind(&self) -> &'static str {
        self.behavior.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_display() {
        assert_eq!(NodeId::from(7).to_string(), "#7");
        assert_eq!(NodeId::from_index(4).index(), 4);
    }

    #[test]
    fn parent_collection_iterates_all_slots() {
        let a = NodeId::from(1);
        let b = NodeId::from(2);
        let c = NodeId::from(3);

        let parents = ParentCollection::new()
            .with_single(a)
            .with_list(vec![b, c, b]);

        assert_eq!(parents.iter().collect::<Vec<_>>(), vec![a, b, c, b]);
        assert_eq!(parents.single_at(0), Some(a));
        assert_eq!(parents.single_at(1), None);
        assert_eq!(parents.list_at(1), &[b, c, b]);
        assert!(parents.list_at(0).is_empty());
        assert!(parents.contains(c));
        assert!(!parents.is_empty());
    }

    #[test]
    fn empty_single_slots_are_skipped() {
        let mut parents = ParentCollection::singles(&[NodeId::from(1)]);
        if let Some(slot) = parents.slot_mut(0) {
            *slot = ParentSlot::Single(None);
        }
        assert_eq!(parents.slot_count(), 1);
        assert!(parents.is_empty());
    }

    #[test]
    fn repoint_replaces_every_occurrence() {
        let old = NodeId::from(1);
        let new = NodeId::from(9);
        let mut slot = ParentSlot::List(vec![old, NodeId::from(2), old]);
        assert_eq!(slot.repoint(old, new), 2);
        assert_eq!(slot, ParentSlot::List(vec![new, NodeId::from(2), new]));

        let mut single = ParentSlot::Single(Some(NodeId::from(2)));
        assert_eq!(single.repoint(old, new), 0);
    }
}
