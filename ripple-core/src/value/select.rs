//! Ternary mux.

use std::any::Any;

use super::leaf::{Literal, Shell};
use super::scalar::Scalar;
use super::{describe, store};
use crate::error::EvalError;
use crate::graph::{any_accessors, Behavior, EvalContext, Port, Role, Signature};

/// `if condition { then } else { otherwise }` over three parent slots.
///
/// The node remembers which branch is selected; it reports a change when its
/// output value changes, whether because the condition flipped or because
/// the selected branch produced a new value.
#[derive(Debug, Clone)]
pub struct Select<T: Scalar> {
    selected: Option<bool>,
    value: Option<T>,
}

impl<T: Scalar> Select<T> {
    pub fn new() -> Self {
        Self {
            selected: None,
            value: None,
        }
    }

    /// Whether the `then` branch is selected. `None` before priming.
    pub fn selected(&self) -> Option<bool> {
        self.selected
    }
}

impl<T: Scalar> Default for Select<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> Behavior for Select<T> {
    fn kind(&self) -> &'static str {
        "Select"
    }

    fn role(&self) -> Role {
        Role::Value
    }

    fn signature(&self) -> Signature {
        Signature::leaf()
            .single(Port::value::<bool>())
            .single(Port::value::<T>())
            .single(Port::value::<T>())
    }

    fn output(&self) -> Port {
        Port::value::<T>()
    }

    fn evaluate(&mut self, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        let condition = *ctx.value::<bool>(0)?;
        self.selected = Some(condition);
        let branch = if condition { 1 } else { 2 };
        let next = ctx.value::<T>(branch)?.clone();
        Ok(store(&mut self.value, next))
    }

    fn value_any(&self) -> Option<&dyn Any> {
        self.value.as_ref().map(|value| value as &dyn Any)
    }

    fn freeze(&self) -> Option<Box<dyn Behavior>> {
        self.value
            .clone()
            .map(|value| Box::new(Literal::new(value)) as Box<dyn Behavior>)
    }

    fn clone_without_parents(&self) -> Box<dyn Behavior> {
        Box::new(Self::new())
    }

    fn passthrough(&self) -> Option<Box<dyn Behavior>> {
        Some(Box::new(Shell::<T>::new()))
    }

    fn describe_state(&self) -> String {
        describe(&self.value)
    }

    any_accessors!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    #[test]
    fn select_follows_condition() {
        let mut graph = Graph::new();
        let cond = graph.input(true).unwrap();
        let then = graph.input(1_i64).unwrap();
        let otherwise = graph.input(2_i64).unwrap();
        let select = graph.select::<i64>(cond, then, otherwise).unwrap();
        assert_eq!(*graph.value::<i64>(select).unwrap(), 1);

        graph.stage_input(cond, false).unwrap();
        graph.evaluate(cond, &Default::default()).unwrap();
        assert!(graph.evaluate(select, &Default::default()).unwrap());
        assert_eq!(*graph.value::<i64>(select).unwrap(), 2);

        let state = graph.node(select).unwrap().behavior();
        let state = state.as_any().downcast_ref::<Select<i64>>().unwrap();
        assert_eq!(state.selected(), Some(false));
    }

    #[test]
    fn unselected_branch_change_is_not_a_change() {
        let mut graph = Graph::new();
        let cond = graph.input(true).unwrap();
        let then = graph.input(1_i64).unwrap();
        let otherwise = graph.input(2_i64).unwrap();
        let select = graph.select::<i64>(cond, then, otherwise).unwrap();

        graph.stage_input(otherwise, 9_i64).unwrap();
        graph.evaluate(otherwise, &Default::default()).unwrap();
        assert!(!graph.evaluate(select, &Default::default()).unwrap());
    }

    #[test]
    fn flip_to_equal_value_is_not_a_change() {
        let mut graph = Graph::new();
        let cond = graph.input(true).unwrap();
        let then = graph.input(4_i64).unwrap();
        let otherwise = graph.literal(4_i64).unwrap();
        let select = graph.select::<i64>(cond, then, otherwise).unwrap();

        graph.stage_input(cond, false).unwrap();
        graph.evaluate(cond, &Default::default()).unwrap();
        assert!(!graph.evaluate(select, &Default::default()).unwrap());
    }
}
