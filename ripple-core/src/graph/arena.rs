//! Graph Arena
//!
//! All nodes live in one arena and address each other by [`NodeId`]. Parent
//! and child relations are plain handle lists, so rewriting the graph never
//! has to untangle owning references.

use std::any::type_name;
use std::collections::{HashSet, VecDeque};

use super::behavior::{Behavior, EvalContext, SlotShape, Vacant};
use super::node::{Node, NodeId, ParentCollection, ParentSlot};
use crate::error::{GraphError, Result};

/// The node arena.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<Option<Node>>,
    len: usize,
}

impl Graph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes currently in the graph.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the handle addresses a node that has not been detached.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    /// Get a node, failing for unknown handles.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.get(id).ok_or(GraphError::UnknownNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(GraphError::UnknownNode(id))
    }

    /// Handles of every node, in creation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().flatten().map(Node::id)
    }

    /// Insert a node with the given parents.
    ///
    /// The parents are validated against the behavior's signature, the node
    /// becomes a reader of each parent, and its state is primed from them.
    /// The node is not subscribed: see [`Graph::commit`].
    pub fn add_node(
        &mut self,
        behavior: Box<dyn Behavior>,
        parents: ParentCollection,
    ) -> Result<NodeId> {
        self.check_signature(behavior.as_ref(), &parents)?;

        let id = NodeId::from_index(self.nodes.len());
        let depth = self.depth_from(&parents);
        for parent in parents.iter() {
            self.retain(parent, id)?;
        }
        self.nodes.push(Some(Node::new(id, depth, parents, behavior)));
        self.len += 1;

        if let Err(err) = self.prime(id) {
            self.detach(id)?;
            return Err(err);
        }
        Ok(id)
    }

    /// Build a new node of the same kind as `template` over other parents.
    pub fn rebuild_with_parents(
        &mut self,
        template: NodeId,
        parents: ParentCollection,
    ) -> Result<NodeId> {
        let behavior = self.node(template)?.behavior().clone_without_parents();
        self.add_node(behavior, parents)
    }

    /// A transparent passthrough over `id`: a `Shell` for values, a
    /// one-parent `Any` gate for triggers.
    pub fn passthrough(&mut self, id: NodeId) -> Result<NodeId> {
        let node = self.node(id)?;
        match node.behavior().passthrough() {
            Some(shell) => self.add_node(shell, ParentCollection::new().with_single(id)),
            None => self.any_of(vec![id]),
        }
    }

    fn check_signature(&self, behavior: &dyn Behavior, parents: &ParentCollection) -> Result<()> {
        let kind = behavior.kind();
        let signature = behavior.signature();
        if signature.slots().len() != parents.slot_count() {
            return Err(GraphError::Arity {
                kind: kind.to_string(),
                expected: format!("{} slot(s)", signature.slots().len()),
                found: parents.slot_count(),
            });
        }

        for (index, (spec, slot)) in signature.slots().iter().zip(parents.slots()).enumerate() {
            match (spec.shape, slot) {
                (SlotShape::Single, ParentSlot::Single(Some(_))) => {}
                (SlotShape::List { min }, ParentSlot::List(list)) if list.len() >= min => {}
                (SlotShape::List { min }, ParentSlot::List(list)) => {
                    return Err(GraphError::Arity {
                        kind: kind.to_string(),
                        expected: format!("at least {min}"),
                        found: list.len(),
                    });
                }
                (shape, _) => {
                    return Err(GraphError::NoSuchSlot {
                        node: NodeId::from_index(self.nodes.len()),
                        slot: index,
                        shape: match shape {
                            SlotShape::Single => "single",
                            SlotShape::List { .. } => "list",
                        },
                    });
                }
            }

            for parent in slot.iter() {
                let offered = self.node(parent)?.behavior().output();
                if !spec.port.accepts(&offered) {
                    return Err(GraphError::PortMismatch {
                        kind: kind.to_string(),
                        slot: index,
                        expected: spec.port.to_string(),
                        found: offered.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Check that `parent` may be wired into `slot` of `child`.
    pub(crate) fn check_port(&self, child: NodeId, slot: usize, parent: NodeId) -> Result<()> {
        let node = self.node(child)?;
        let signature = node.behavior().signature();
        let spec = signature.slots().get(slot).ok_or(GraphError::NoSuchSlot {
            node: child,
            slot,
            shape: "declared",
        })?;
        let offered = self.node(parent)?.behavior().output();
        if spec.port.accepts(&offered) {
            Ok(())
        } else {
            Err(GraphError::PortMismatch {
                kind: node.kind().to_string(),
                slot,
                expected: spec.port.to_string(),
                found: offered.to_string(),
            })
        }
    }

    /// Run `prime` on a fresh node.
    fn prime(&mut self, id: NodeId) -> Result<()> {
        let mut behavior = self.take_behavior(id)?;
        let result = {
            let node = self.node(id)?;
            let ctx = EvalContext::new(self, id, node.parents(), None);
            behavior.prime(&ctx)
        };
        self.node_mut(id)?.behavior = behavior;
        result.map_err(|source| GraphError::eval(id, source))
    }

    /// Recompute a node from its parents' current state.
    pub(crate) fn evaluate(&mut self, id: NodeId, changed: &HashSet<NodeId>) -> Result<bool> {
        let mut behavior = self.take_behavior(id)?;
        let result = {
            let node = self.node(id)?;
            let ctx = EvalContext::new(self, id, node.parents(), Some(changed));
            behavior.evaluate(&ctx)
        };
        self.node_mut(id)?.behavior = behavior;
        result.map_err(|source| GraphError::eval(id, source))
    }

    fn take_behavior(&mut self, id: NodeId) -> Result<Box<dyn Behavior>> {
        let node = self.node_mut(id)?;
        Ok(std::mem::replace(&mut node.behavior, Box::new(Vacant)))
    }

    /// Return a provoked trigger to the unprovoked state.
    pub(crate) fn reset(&mut self, id: NodeId) {
        if let Ok(node) = self.node_mut(id) {
            node.behavior.reset();
        }
    }

    /// Whether `id` is a currently provoked trigger.
    pub fn is_provoked(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|node| node.behavior().provoked())
    }

    /// The current value of a value node.
    pub fn value<T: 'static>(&self, id: NodeId) -> Result<&T> {
        let node = self.node(id)?;
        let mismatch = || GraphError::TypeMismatch {
            node: id,
            expected: type_name::<T>(),
            found: node.behavior().output().to_string(),
        };
        node.behavior()
            .value_any()
            .ok_or_else(mismatch)?
            .downcast_ref::<T>()
            .ok_or_else(mismatch)
    }

    /// Nodes reachable from `root` through parents that are not committed
    /// yet, ordered by ascending depth (ties by creation order).
    pub fn fresh_subgraph(&self, root: NodeId) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([root]);
        let mut fresh = Vec::new();

        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            let Some(node) = self.get(id) else { continue };
            if node.is_live() {
                continue;
            }
            fresh.push(id);
            queue.extend(node.parents().iter());
        }

        fresh.sort_by_key(|id| (self.get(*id).map_or(0, Node::depth), *id));
        fresh
    }

    /// Deterministic short text for a node and its parents down to `depth`
    /// levels, e.g. `Sum(5)[Input(2), Input(3)]`. Truncated parent lists
    /// render as `[..]`.
    pub fn describe(&self, id: NodeId, depth: usize) -> Result<String> {
        let mut out = String::new();
        self.describe_into(id, depth, &mut out)?;
        Ok(out)
    }

    fn describe_into(&self, id: NodeId, depth: usize, out: &mut String) -> Result<()> {
        let node = self.node(id)?;
        out.push_str(node.kind());
        out.push('(');
        out.push_str(&node.behavior().describe_state());
        out.push(')');

        if node.parents().is_empty() {
            return Ok(());
        }
        if depth == 0 {
            out.push_str("[..]");
            return Ok(());
        }

        out.push('[');
        for (index, parent) in node.parents().iter().enumerate() {
            if index > 0 {
                out.push_str(", ");
            }
            self.describe_into(parent, depth - 1, out)?;
        }
        out.push(']');
        Ok(())
    }

    pub(crate) fn remove_slot(&mut self, id: NodeId) -> Option<Node> {
        let removed = self.nodes.get_mut(id.index()).and_then(Option::take);
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops;

    #[test]
    fn add_node_primes_value() {
        let mut graph = Graph::new();
        let a = graph.input(2_i64).unwrap();
        let b = graph.input(3_i64).unwrap();
        let sum = graph.nary(ops::sum::<i64>(), vec![a, b]).unwrap();

        assert_eq!(*graph.value::<i64>(sum).unwrap(), 5);
        assert_eq!(graph.node(sum).unwrap().depth(), 1);
        assert!(!graph.node(sum).unwrap().is_live());
        // primed, but not subscribed
        assert!(graph.node(a).unwrap().children().is_empty());
        assert_eq!(graph.node(a).unwrap().readers().get(&sum), Some(&1));
    }

    #[test]
    fn signature_mismatch_is_reported() {
        let mut graph = Graph::new();
        let a = graph.input(2_i64).unwrap();
        let flag = graph.input(true).unwrap();

        let err = graph.nary(ops::sum::<i64>(), vec![a, flag]).unwrap_err();
        assert!(matches!(err, GraphError::PortMismatch { slot: 0, .. }));

        let err = graph.nary(ops::sum::<i64>(), vec![]).unwrap_err();
        assert!(matches!(err, GraphError::Arity { found: 0, .. }));
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn failed_priming_leaves_no_node() {
        let mut graph = Graph::new();
        let a = graph.input(1_i64).unwrap();
        let zero = graph.literal(0_i64).unwrap();

        let err = graph.binary("Div", ops::divide::<i64>, a, zero).unwrap_err();
        assert!(matches!(err, GraphError::Eval { .. }));
        assert_eq!(graph.len(), 2);
        assert!(graph.node(a).unwrap().readers().is_empty());
    }

    #[test]
    fn value_type_is_checked() {
        let mut graph = Graph::new();
        let a = graph.input(2_i64).unwrap();
        assert!(matches!(
            graph.value::<f64>(a),
            Err(GraphError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn describe_is_bounded() {
        let mut graph = Graph::new();
        let a = graph.input(2_i64).unwrap();
        let b = graph.input(3_i64).unwrap();
        let sum = graph.nary(ops::sum::<i64>(), vec![a, b]).unwrap();
        let neg = graph.unary("Neg", ops::negate::<i64>, sum).unwrap();

        assert_eq!(graph.describe(neg, 0).unwrap(), "Neg(-5)[..]");
        assert_eq!(graph.describe(neg, 1).unwrap(), "Neg(-5)[Sum(5)[..]]");
        assert_eq!(
            graph.describe(neg, 2).unwrap(),
            "Neg(-5)[Sum(5)[Input(2), Input(3)]]"
        );
    }

    #[test]
    fn fresh_subgraph_stops_at_live_nodes() {
        let mut graph = Graph::new();
        let a = graph.input(2_i64).unwrap();
        graph.commit(a).unwrap();
        let one = graph.literal(1_i64).unwrap();
        let sum = graph.nary(ops::sum::<i64>(), vec![a, one]).unwrap();

        assert_eq!(graph.fresh_subgraph(sum), vec![one, sum]);
    }
}
