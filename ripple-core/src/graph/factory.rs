//! Typed node factories.
//!
//! Every factory builds the behavior, validates the parents against its
//! signature, primes the node and returns its handle. Nodes built here are
//! fresh: they read their parents but are not subscribed until committed.

use super::arena::Graph;
use super::behavior::Port;
use super::node::{NodeId, ParentCollection};
use crate::error::{GraphError, Result};
use crate::trigger::{
    ConstTrigger, Counter, Edge, EdgeDirection, Gate, GateRule, InputTrigger, OnChange,
    SelectTrigger, Snapshot, Toggle, WhenTrue,
};
use crate::value::{
    Binary, BinaryFn, Input, Literal, Nary, NaryOp, Scalar, Select, Shell, Ternary, TernaryFn,
    Unary, UnaryFn,
};

impl Graph {
    /// Add an externally mutable value.
    pub fn input<T: Scalar>(&mut self, value: T) -> Result<NodeId> {
        self.add_node(Box::new(Input::new(value)), ParentCollection::new())
    }

    /// Add a constant value.
    pub fn literal<T: Scalar>(&mut self, value: T) -> Result<NodeId> {
        self.add_node(Box::new(Literal::new(value)), ParentCollection::new())
    }

    /// Add a passthrough over `parent`.
    pub fn shell<T: Scalar>(&mut self, parent: NodeId) -> Result<NodeId> {
        self.add_node(
            Box::new(Shell::<T>::new()),
            ParentCollection::new().with_single(parent),
        )
    }

    /// Add a one-operand combinator.
    pub fn unary<A: Scalar, R: Scalar>(
        &mut self,
        name: &'static str,
        op: UnaryFn<A, R>,
        a: NodeId,
    ) -> Result<NodeId> {
        self.add_node(Box::new(Unary::new(name, op)), ParentCollection::singles(&[a]))
    }

    /// Add a two-operand combinator.
    pub fn binary<A: Scalar, B: Scalar, R: Scalar>(
        &mut self,
        name: &'static str,
        op: BinaryFn<A, B, R>,
        a: NodeId,
        b: NodeId,
    ) -> Result<NodeId> {
        self.add_node(
            Box::new(Binary::new(name, op)),
            ParentCollection::singles(&[a, b]),
        )
    }

    /// Add a three-operand combinator.
    pub fn ternary<A: Scalar, B: Scalar, C: Scalar, R: Scalar>(
        &mut self,
        name: &'static str,
        op: TernaryFn<A, B, C, R>,
        a: NodeId,
        b: NodeId,
        c: NodeId,
    ) -> Result<NodeId> {
        self.add_node(
            Box::new(Ternary::new(name, op)),
            ParentCollection::singles(&[a, b, c]),
        )
    }

    /// Add an n-ary fold over `parents`.
    pub fn nary<T: Scalar>(&mut self, op: NaryOp<T>, parents: Vec<NodeId>) -> Result<NodeId> {
        self.add_node(Box::new(Nary::new(op)), ParentCollection::new().with_list(parents))
    }

    /// Add a value mux: `then` while `condition` holds, `otherwise` if not.
    pub fn select<T: Scalar>(
        &mut self,
        condition: NodeId,
        then: NodeId,
        otherwise: NodeId,
    ) -> Result<NodeId> {
        self.add_node(
            Box::new(Select::<T>::new()),
            ParentCollection::singles(&[condition, then, otherwise]),
        )
    }

    /// Add a trigger the host can provoke.
    pub fn input_trigger(&mut self) -> Result<NodeId> {
        self.add_node(Box::new(InputTrigger::new()), ParentCollection::new())
    }

    /// Add a trigger that never fires.
    pub fn const_trigger(&mut self) -> Result<NodeId> {
        self.add_node(Box::new(ConstTrigger::new()), ParentCollection::new())
    }

    /// Add a gate combining the pulses of `parents` by `rule`.
    pub fn gate(&mut self, rule: GateRule, parents: Vec<NodeId>) -> Result<NodeId> {
        self.add_node(Box::new(Gate::new(rule)), ParentCollection::new().with_list(parents))
    }

    /// Shorthand for an [`GateRule::Any`] gate.
    pub fn any_of(&mut self, parents: Vec<NodeId>) -> Result<NodeId> {
        self.gate(GateRule::Any, parents)
    }

    /// Add a trigger that fires when any parent changed this round.
    pub fn on_change(&mut self, parents: Vec<NodeId>) -> Result<NodeId> {
        self.add_node(Box::new(OnChange::new()), ParentCollection::new().with_list(parents))
    }

    /// Add a trigger that fires when `level` turns true.
    pub fn rising(&mut self, level: NodeId) -> Result<NodeId> {
        self.edge(EdgeDirection::Rising, level)
    }

    /// Add a trigger that fires when `level` turns false.
    pub fn falling(&mut self, level: NodeId) -> Result<NodeId> {
        self.edge(EdgeDirection::Falling, level)
    }

    fn edge(&mut self, direction: EdgeDirection, level: NodeId) -> Result<NodeId> {
        self.add_node(
            Box::new(Edge::new(direction)),
            ParentCollection::singles(&[level]),
        )
    }

    /// Add a trigger that fires whenever `level` is evaluated as true.
    pub fn when_true(&mut self, level: NodeId) -> Result<NodeId> {
        self.add_node(Box::new(WhenTrue::new()), ParentCollection::singles(&[level]))
    }

    /// Add a trigger mux passing the pulses of the selected branch.
    pub fn select_trigger(
        &mut self,
        condition: NodeId,
        then: NodeId,
        otherwise: NodeId,
    ) -> Result<NodeId> {
        self.add_node(
            Box::new(SelectTrigger::new()),
            ParentCollection::singles(&[condition, then, otherwise]),
        )
    }

    /// Add a bool that flips on every pulse of `trigger`.
    pub fn toggle(&mut self, trigger: NodeId, initial: bool) -> Result<NodeId> {
        self.add_node(Box::new(Toggle::new(initial)), ParentCollection::singles(&[trigger]))
    }

    /// Add a count of the pulses of `trigger`.
    pub fn counter(&mut self, trigger: NodeId) -> Result<NodeId> {
        self.add_node(Box::new(Counter::new()), ParentCollection::singles(&[trigger]))
    }

    /// Add a sample of `value` taken on every pulse of `trigger`.
    pub fn snapshot<T: Scalar>(&mut self, value: NodeId, trigger: NodeId) -> Result<NodeId> {
        self.add_node(
            Box::new(Snapshot::<T>::new()),
            ParentCollection::singles(&[value, trigger]),
        )
    }

    /// Stage a new value on an input node. It is committed by the next
    /// evaluation of the node.
    pub fn stage_input<T: Scalar>(&mut self, id: NodeId, value: T) -> Result<()> {
        let node = self.node_mut(id)?;
        let output = node.behavior.output();
        let is_source = node.behavior.is_source();
        match node.behavior.as_any_mut().downcast_mut::<Input<T>>() {
            Some(input) => {
                input.stage(value);
                Ok(())
            }
            None if is_source && matches!(output, Port::Value { .. }) => {
                Err(GraphError::TypeMismatch {
                    node: id,
                    expected: T::type_name(),
                    found: output.to_string(),
                })
            }
            None => Err(GraphError::NotAnInput(id)),
        }
    }

    /// Request a pulse from an input trigger in the next round.
    pub fn stage_provoke(&mut self, id: NodeId) -> Result<()> {
        let node = self.node_mut(id)?;
        match node.behavior.as_any_mut().downcast_mut::<InputTrigger>() {
            Some(trigger) => {
                trigger.stage();
                Ok(())
            }
            None => Err(GraphError::NotATrigger(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::GraphError;
    use crate::graph::{Graph, Role};

    #[test]
    fn staging_checks_kind_and_type() {
        let mut graph = Graph::new();
        let a = graph.input(1_i64).unwrap();
        let lit = graph.literal(1_i64).unwrap();
        let fire = graph.input_trigger().unwrap();

        assert!(graph.stage_input(a, 4_i64).is_ok());
        assert!(matches!(
            graph.stage_input(a, 4.0_f64),
            Err(GraphError::TypeMismatch { .. })
        ));
        assert_eq!(graph.stage_input(lit, 4_i64), Err(GraphError::NotAnInput(lit)));
        assert_eq!(graph.stage_provoke(a), Err(GraphError::NotATrigger(a)));
        assert!(graph.stage_provoke(fire).is_ok());
    }

    #[test]
    fn trigger_factories_build_triggers() {
        let mut graph = Graph::new();
        let level = graph.input(false).unwrap();
        let fire = graph.input_trigger().unwrap();
        let rising = graph.rising(level).unwrap();
        let any = graph.any_of(vec![fire, rising]).unwrap();

        assert_eq!(graph.node(any).unwrap().role(), Role::Trigger);
        assert_eq!(graph.node(any).unwrap().depth(), 2);
        assert_eq!(graph.node(any).unwrap().kind(), "Any");
    }

    #[test]
    fn value_slot_rejects_trigger_parent() {
        let mut graph = Graph::new();
        let fire = graph.input_trigger().unwrap();
        assert!(matches!(
            graph.shell::<i64>(fire),
            Err(GraphError::PortMismatch { .. })
        ));
        let a = graph.input(1_i64).unwrap();
        assert!(matches!(
            graph.counter(a),
            Err(GraphError::PortMismatch { .. })
        ));
    }
}
