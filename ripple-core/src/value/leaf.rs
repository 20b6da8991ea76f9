//! Leaves and passthroughs.

use std::any::Any;

use super::scalar::Scalar;
use super::{describe, store};
use crate::error::EvalError;
use crate::graph::{any_accessors, Behavior, EvalContext, Port, Role, Signature};

/// Externally mutable root value.
///
/// The host stages a new value; the value is committed when the node is
/// evaluated in the next round, and reported as changed only if it differs.
#[derive(Debug, Clone)]
pub struct Input<T: Scalar> {
    value: T,
    staged: Option<T>,
}

impl<T: Scalar> Input<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            staged: None,
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    /// Stage a value for the next round. Replaces any earlier staged value.
    pub fn stage(&mut self, value: T) {
        self.staged = Some(value);
    }
}

impl<T: Scalar> Behavior for Input<T> {
    fn kind(&self) -> &'static str {
        "Input"
    }

    fn role(&self) -> Role {
        Role::Value
    }

    fn signature(&self) -> Signature {
        Signature::leaf()
    }

    fn output(&self) -> Port {
        Port::value::<T>()
    }

    fn evaluate(&mut self, _ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        match self.staged.take() {
            Some(next) if !next.same(&self.value) => {
                self.value = next;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn prime(&mut self, _ctx: &EvalContext<'_>) -> Result<(), EvalError> {
        Ok(())
    }

    fn value_any(&self) -> Option<&dyn Any> {
        Some(&self.value)
    }

    fn is_source(&self) -> bool {
        true
    }

    fn freeze(&self) -> Option<Box<dyn Behavior>> {
        Some(Box::new(Literal::new(self.value.clone())))
    }

    fn clone_without_parents(&self) -> Box<dyn Behavior> {
        Box::new(Input::new(self.value.clone()))
    }

    fn passthrough(&self) -> Option<Box<dyn Behavior>> {
        Some(Box::new(Shell::<T>::new()))
    }

    fn describe_state(&self) -> String {
        format!("{:?}", self.value)
    }

    any_accessors!();
}

/// Constant value without parents.
#[derive(Debug, Clone)]
pub struct Literal<T: Scalar> {
    value: T,
}

impl<T: Scalar> Literal<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &T {
        &self.value
    }
}

impl<T: Scalar> Behavior for Literal<T> {
    fn kind(&self) -> &'static str {
        "Literal"
    }

    fn role(&self) -> Role {
        Role::Value
    }

    fn signature(&self) -> Signature {
        Signature::leaf()
    }

    fn output(&self) -> Port {
        Port::value::<T>()
    }

    fn evaluate(&mut self, _ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        Ok(false)
    }

    fn value_any(&self) -> Option<&dyn Any> {
        Some(&self.value)
    }

    fn is_literal(&self) -> bool {
        true
    }

    fn freeze(&self) -> Option<Box<dyn Behavior>> {
        Some(Box::new(self.clone()))
    }

    fn clone_without_parents(&self) -> Box<dyn Behavior> {
        Box::new(self.clone())
    }

    fn passthrough(&self) -> Option<Box<dyn Behavior>> {
        Some(Box::new(Shell::<T>::new()))
    }

    fn describe_state(&self) -> String {
        format!("{:?}", self.value)
    }

    any_accessors!();
}

/// Transparent one-parent passthrough.
///
/// A shell gives a parent's value a node identity of its own, so that a
/// definition such as `b = a` does not alias `a`.
#[derive(Debug, Clone)]
pub struct Shell<T: Scalar> {
    value: Option<T>,
}

impl<T: Scalar> Shell<T> {
    pub fn new() -> Self {
        Self { value: None }
    }
}

impl<T: Scalar> Default for Shell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> Behavior for Shell<T> {
    fn kind(&self) -> &'static str {
        "Shell"
    }

    fn role(&self) -> Role {
        Role::Value
    }

    fn signature(&self) -> Signature {
        Signature::leaf().single(Port::value::<T>())
    }

    fn output(&self) -> Port {
        Port::value::<T>()
    }

    fn evaluate(&mut self, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        let next = ctx.value::<T>(0)?.clone();
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
        Box::new(Shell::<T>::new())
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
    use crate::graph::Graph;

    #[test]
    fn input_reports_change_only_for_new_values() {
        let mut graph = Graph::new();
        let a = graph.input(2_i64).unwrap();

        graph.stage_input(a, 2_i64).unwrap();
        assert!(!graph.evaluate(a, &Default::default()).unwrap());

        graph.stage_input(a, 5_i64).unwrap();
        assert!(graph.evaluate(a, &Default::default()).unwrap());
        assert_eq!(*graph.value::<i64>(a).unwrap(), 5);
    }

    #[test]
    fn input_tells_signed_zeros_apart() {
        let mut graph = Graph::new();
        let a = graph.input(0.0_f64).unwrap();

        graph.stage_input(a, -0.0_f64).unwrap();
        assert!(graph.evaluate(a, &Default::default()).unwrap());
        assert!(graph.value::<f64>(a).unwrap().is_sign_negative());

        let nan = graph.input(f64::NAN).unwrap();
        graph.stage_input(nan, f64::NAN).unwrap();
        assert!(!graph.evaluate(nan, &Default::default()).unwrap());
    }

    #[test]
    fn shell_has_own_identity() {
        let mut graph = Graph::new();
        let a = graph.input(2_i64).unwrap();
        let shell = graph.shell::<i64>(a).unwrap();

        assert_ne!(a, shell);
        assert_eq!(*graph.value::<i64>(shell).unwrap(), 2);
        assert_eq!(graph.describe(shell, 1).unwrap(), "Shell(2)[Input(2)]");
    }

    #[test]
    fn literal_is_frozen() {
        let mut graph = Graph::new();
        let lit = graph.literal(1.5_f64).unwrap();
        let node = graph.node(lit).unwrap();
        assert!(node.behavior().is_literal());
        assert!(!node.behavior().is_source());
        assert_eq!(graph.describe(lit, 3).unwrap(), "Literal(1.5)");
    }
}
