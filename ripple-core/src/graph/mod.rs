//! Dependency Graph
//!
//! This module implements the node arena and everything that keeps it
//! consistent while it is built and rewritten.
//!
//! # Overview
//!
//! The graph is a directed acyclic graph where:
//!
//! - nodes are values (persistent typed state) or triggers (momentary
//!   pulses), each with a boxed [`Behavior`] describing its kind
//! - edges go from parent to child: a child reads its parents' state
//!
//! Reading a parent and being notified by it are two distinct relations. A
//! fresh node reads its parents (for priming and depth), but only a
//! committed node is in its parents' children sets, and only those receive
//! propagation.
//!
//! # Invariants
//!
//! 1. The graph is acyclic. New edges pass the cycle guard ([`reaches`])
//!    before anything is mutated.
//!
//! 2. Every node is deeper than each of its parents; leaves are at depth 0.
//!    Depth changes cascade eagerly through the readers of a node.
//!
//! 3. Handles are indices into the arena and are never reused.

mod adoption;
mod arena;
mod behavior;
mod cycle;
mod depth;
mod factory;
mod node;
mod scheduler;

pub use arena::Graph;
pub(crate) use behavior::any_accessors;
pub use behavior::{
    Behavior, EvalContext, NaryFlags, NaryShape, Port, Signature, SlotShape, SlotSpec,
};
pub use cycle::reaches;
pub use node::{Node, NodeId, ParentCollection, ParentSlot, Role};
pub use scheduler::PendingQueue;
