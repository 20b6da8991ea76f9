//! Node Behaviors
//!
//! A [`Behavior`] is the kind-specific part of a node: how it recomputes its
//! state from its parents, what it exposes to its children, and which hooks
//! the optimizer can use on it. Behaviors never hold parent handles; those
//! live in the node record and reach the behavior through [`EvalContext`].

use std::any::{type_name, Any, TypeId};
use std::collections::HashSet;
use std::fmt;

use smallvec::SmallVec;

use super::arena::Graph;
use super::node::{NodeId, ParentCollection, Role};
use crate::error::EvalError;
use crate::trigger::ConstTrigger;
use crate::value::Scalar;

/// What a node offers to its children, or what a slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port {
    /// A typed value.
    Value {
        type_id: TypeId,
        type_name: &'static str,
    },

    /// A trigger pulse.
    Trigger,

    /// Anything (only meaningful for slots).
    Any,
}

impl Port {
    /// The port for values of type `T`.
    pub fn value<T: Scalar>() -> Self {
        Port::Value {
            type_id: TypeId::of::<T>(),
            type_name: T::type_name(),
        }
    }

    /// Whether a slot with this port accepts a parent offering `offered`.
    pub fn accepts(&self, offered: &Port) -> bool {
        match (self, offered) {
            (Port::Any, _) => true,
            (Port::Trigger, Port::Trigger) => true,
            (Port::Value { type_id: want, .. }, Port::Value { type_id: got, .. }) => want == got,
            _ => false,
        }
    }

    /// Whether this port carries values of type `T`.
    pub fn is<T: 'static>(&self) -> bool {
        matches!(self, Port::Value { type_id, .. } if *type_id == TypeId::of::<T>())
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Port::Value { type_name, .. } => f.write_str(type_name),
            Port::Trigger => f.write_str("trigger"),
            Port::Any => f.write_str("any"),
        }
    }
}

/// Shape of one parent slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotShape {
    /// Exactly one parent.
    Single,

    /// A list with at least `min` parents.
    List { min: usize },
}

/// Declaration of one parent slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSpec {
    pub shape: SlotShape,
    pub port: Port,
}

/// Parent arity and types a node kind expects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    slots: SmallVec<[SlotSpec; 3]>,
}

impl Signature {
    /// A signature without slots (leaves).
    pub fn leaf() -> Self {
        Self::default()
    }

    /// Append a single slot.
    pub fn single(mut self, port: Port) -> Self {
        self.slots.push(SlotSpec {
            shape: SlotShape::Single,
            port,
        });
        self
    }

    /// Append a list slot.
    pub fn list(mut self, port: Port, min: usize) -> Self {
        self.slots.push(SlotSpec {
            shape: SlotShape::List { min },
            port,
        });
        self
    }

    /// The declared slots.
    pub fn slots(&self) -> &[SlotSpec] {
        &self.slots
    }
}

/// Algebraic properties an n-ary operation opts into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NaryFlags {
    /// `op(a, op(b, c)) == op(a, b, c)`: nested nodes may be flattened.
    pub associative: bool,

    /// Operand order is irrelevant: literal operands may be merged.
    pub commutative: bool,

    /// `op(a, a) == a`: duplicate operands may be dropped.
    pub idempotent: bool,
}

/// Optimizer view over an n-ary combinator.
pub trait NaryShape {
    /// Operation name and operand type; flattening requires equal keys.
    fn op_key(&self) -> (&'static str, TypeId);

    fn flags(&self) -> NaryFlags;

    /// Whether `candidate` is a literal equal to the operation's identity.
    fn is_identity(&self, candidate: &dyn Behavior) -> bool;

    /// Combine literal operands into a single literal.
    fn fold_literals(&self, literals: &[&dyn Behavior]) -> Result<Box<dyn Behavior>, EvalError>;
}

/// Kind-specific state and evaluation rule of a node.
pub trait Behavior: Any + Send + Sync + fmt::Debug {
    /// Short kind name used in traces and debug output.
    fn kind(&self) -> &'static str;

    fn role(&self) -> Role;

    /// Parent slots this kind expects.
    fn signature(&self) -> Signature;

    /// What this node offers to its children.
    fn output(&self) -> Port;

    /// Recompute state from the current parent state.
    ///
    /// Returns whether an observable change occurred: a new value, or a
    /// trigger becoming provoked this round.
    fn evaluate(&mut self, ctx: &EvalContext<'_>) -> Result<bool, EvalError>;

    /// Initialize state right after construction, before any round.
    ///
    /// Values compute their first result; triggers must stay unprovoked.
    fn prime(&mut self, ctx: &EvalContext<'_>) -> Result<(), EvalError> {
        self.evaluate(ctx).map(|_| ())
    }

    /// The current value, for value nodes that have one.
    fn value_any(&self) -> Option<&dyn Any> {
        None
    }

    fn provoked(&self) -> bool {
        false
    }

    /// Return to the unprovoked state at the end of a round.
    fn reset(&mut self) {}

    /// Inputs whose state is set by the host.
    fn is_source(&self) -> bool {
        false
    }

    /// Literals and frozen triggers.
    fn is_literal(&self) -> bool {
        false
    }

    /// A parentless snapshot of the current state.
    fn freeze(&self) -> Option<Box<dyn Behavior>> {
        match self.role() {
            Role::Trigger => Some(Box::new(ConstTrigger::new())),
            Role::Value => None,
        }
    }

    /// A fresh instance of the same kind, without state derived from parents.
    fn clone_without_parents(&self) -> Box<dyn Behavior>;

    /// A transparent one-parent passthrough over this node's output.
    fn passthrough(&self) -> Option<Box<dyn Behavior>> {
        None
    }

    fn as_nary(&self) -> Option<&dyn NaryShape> {
        None
    }

    /// Short text of the current state for debug output.
    fn describe_state(&self) -> String;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Implements the `Any` accessors of [`Behavior`].
macro_rules! any_accessors {
    () => {
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    };
}

pub(crate) use any_accessors;

/// Placeholder left in a node while its behavior is being evaluated.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Vacant;

impl Behavior for Vacant {
    fn kind(&self) -> &'static str {
        "Vacant"
    }

    fn role(&self) -> Role {
        Role::Value
    }

    fn signature(&self) -> Signature {
        Signature::leaf()
    }

    fn output(&self) -> Port {
        Port::Any
    }

    fn evaluate(&mut self, _ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        Ok(false)
    }

    fn clone_without_parents(&self) -> Box<dyn Behavior> {
        Box::new(Vacant)
    }

    fn describe_state(&self) -> String {
        "?".into()
    }

    any_accessors!();
}

/// Read access to the parents of the node being evaluated.
///
/// Reading through the context never subscribes: it is the "read-only" use
/// of a parent.
pub struct EvalContext<'a> {
    graph: &'a Graph,
    node: NodeId,
    parents: &'a ParentCollection,
    changed: Option<&'a HashSet<NodeId>>,
}

impl<'a> EvalContext<'a> {
    pub(crate) fn new(
        graph: &'a Graph,
        node: NodeId,
        parents: &'a ParentCollection,
        changed: Option<&'a HashSet<NodeId>>,
    ) -> Self {
        Self {
            graph,
            node,
            parents,
            changed,
        }
    }

    /// The node being evaluated.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn parents(&self) -> &'a ParentCollection {
        self.parents
    }

    /// The parent of a single slot.
    pub fn parent(&self, slot: usize) -> Option<NodeId> {
        self.parents.single_at(slot)
    }

    /// The value of the parent in a single slot.
    pub fn value<T: 'static>(&self, slot: usize) -> Result<&'a T, EvalError> {
        let parent = self.parent(slot).ok_or(EvalError::MissingParent { slot })?;
        self.value_of(parent)
    }

    /// The values of every parent in a list slot, in order.
    pub fn list<T: 'static>(&self, slot: usize) -> Result<Vec<&'a T>, EvalError> {
        self.parents
            .list_at(slot)
            .iter()
            .map(|parent| self.value_of(*parent))
            .collect()
    }

    /// The value of an arbitrary node.
    pub fn value_of<T: 'static>(&self, id: NodeId) -> Result<&'a T, EvalError> {
        let behavior = self
            .graph
            .get(id)
            .map(|node| node.behavior())
            .ok_or(EvalError::Unsettled { node: id })?;
        let value = behavior
            .value_any()
            .ok_or(EvalError::Unsettled { node: id })?;
        value
            .downcast_ref::<T>()
            .ok_or_else(|| EvalError::TypeMismatch {
                expected: type_name::<T>(),
                found: behavior.output().to_string(),
            })
    }

    /// Whether the trigger in a single slot is provoked. Empty slots are not.
    pub fn provoked(&self, slot: usize) -> bool {
        self.parent(slot)
            .is_some_and(|parent| self.graph.is_provoked(parent))
    }

    /// Provoked state of every trigger in a list slot.
    pub fn provoked_list(&self, slot: usize) -> impl Iterator<Item = bool> + 'a {
        let graph = self.graph;
        self.parents
            .list_at(slot)
            .iter()
            .map(move |parent| graph.is_provoked(*parent))
    }

    /// Whether `id` reported a change earlier in the current round.
    pub fn changed(&self, id: NodeId) -> bool {
        self.changed.is_some_and(|changed| changed.contains(&id))
    }
}
