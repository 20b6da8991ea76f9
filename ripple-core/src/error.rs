//! Error types
//!
//! Two layers of errors exist in the runtime:
//!
//! - [`EvalError`] is raised while a node recomputes its state from its
//!   parents (arithmetic, casts, missing or mistyped parents).
//! - [`GraphError`] is raised by construction, wiring and the host facade.
//!   Evaluation failures surface through [`GraphError::Eval`] together with
//!   the node that failed.

use thiserror::Error;

use crate::graph::NodeId;

/// Convenience alias used throughout the crate.
pub type Result<T, E = GraphError> = std::result::Result<T, E>;

/// Failure raised by a node while evaluating.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Integer division or remainder by zero.
    #[error("`{op}` divided by zero")]
    DivideByZero { op: &'static str },

    /// A value could not be converted between scalar types.
    #[error("cannot cast {value} from {from} to {to}")]
    Cast {
        from: &'static str,
        to: &'static str,
        value: String,
    },

    /// A parent produced a value of a different type than the node reads.
    #[error("expected a {expected} parent, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    /// A single parent slot is empty.
    #[error("parent slot {slot} is empty")]
    MissingParent { slot: usize },

    /// A parent has no value yet.
    #[error("node {node} has not produced a value")]
    Unsettled { node: NodeId },

    /// An n-ary operation without identity was applied to no operands.
    #[error("`{op}` has no operands and no identity")]
    EmptyOperands { op: &'static str },
}

/// Failure raised while building, wiring or driving the graph.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// A node or function received the wrong number of parents.
    #[error("`{kind}` expects {expected} argument(s), found {found}")]
    Arity {
        kind: String,
        expected: String,
        found: usize,
    },

    /// A parent offers a port the slot does not accept.
    #[error("`{kind}` slot {slot} expects {expected}, found {found}")]
    PortMismatch {
        kind: String,
        slot: usize,
        expected: String,
        found: String,
    },

    /// No overload of a function group accepts the argument types.
    #[error("no overload of `{function}` accepts ({found})")]
    NoOverload { function: String, found: String },

    /// The function group is not registered.
    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    /// The edge would make a node reachable from itself.
    #[error("edge {parent} -> {child} would introduce a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    /// The handle does not address a node (never created or detached).
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// The node has no slot at the given index, or the slot has another shape.
    #[error("node {node} has no {shape} slot {slot}")]
    NoSuchSlot {
        node: NodeId,
        slot: usize,
        shape: &'static str,
    },

    /// The node is still read by other nodes and cannot be detached.
    #[error("node {node} is still read by {readers} node(s)")]
    StillReferenced { node: NodeId, readers: usize },

    /// The value requested has a different type than the node holds.
    #[error("node {node} holds {found}, not {expected}")]
    TypeMismatch {
        node: NodeId,
        expected: &'static str,
        found: String,
    },

    /// No definition with that name exists.
    #[error("no definition named `{0}`")]
    UnknownName(String),

    /// A definition with that name already exists.
    #[error("`{0}` is already defined")]
    DuplicateName(String),

    /// The name is not a dotted sequence of identifiers.
    #[error("`{0}` is not a valid qualified name")]
    InvalidName(String),

    /// Only input nodes can be staged by the host.
    #[error("node {0} is not an input")]
    NotAnInput(NodeId),

    /// The node is a value, not a trigger.
    #[error("node {0} is not a trigger")]
    NotATrigger(NodeId),

    /// A node failed to evaluate.
    #[error("node {node} failed to evaluate: {source}")]
    Eval {
        node: NodeId,
        #[source]
        source: EvalError,
    },
}

impl GraphError {
    /// Attach the failing node to an evaluation error.
    pub fn eval(node: NodeId, source: EvalError) -> Self {
        Self::Eval { node, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_error_carries_source() {
        let err = GraphError::eval(NodeId::from(3), EvalError::DivideByZero { op: "Div" });
        assert_eq!(
            err.to_string(),
            "node #3 failed to evaluate: `Div` divided by zero"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn cast_error_names_types_and_value() {
        let err = EvalError::Cast {
            from: "f64",
            to: "i64",
            value: "NaN".into(),
        };
        assert_eq!(err.to_string(), "cannot cast NaN from f64 to i64");
    }
}
