//! Values driven by trigger pulses.

use std::any::Any;

use crate::error::EvalError;
use crate::graph::{any_accessors, Behavior, EvalContext, Port, Role, Signature};
use crate::value::{Literal, Scalar, Shell};

/// Bool that flips every time its trigger fires.
#[derive(Debug, Clone)]
pub struct Toggle {
    initial: bool,
    value: bool,
}

impl Toggle {
    pub fn new(initial: bool) -> Self {
        Self {
            initial,
            value: initial,
        }
    }
}

impl Behavior for Toggle {
    fn kind(&self) -> &'static str {
        "Toggle"
    }

    fn role(&self) -> Role {
        Role::Value
    }

    fn signature(&self) -> Signature {
        Signature::leaf().single(Port::Trigger)
    }

    fn output(&self) -> Port {
        Port::value::<bool>()
    }

    fn evaluate(&mut self, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        if !ctx.provoked(0) {
            return Ok(false);
        }
        self.value = !self.value;
        Ok(true)
    }

    fn prime(&mut self, _ctx: &EvalContext<'_>) -> Result<(), EvalError> {
        Ok(())
    }

    fn value_any(&self) -> Option<&dyn Any> {
        Some(&self.value)
    }

    fn freeze(&self) -> Option<Box<dyn Behavior>> {
        Some(Box::new(Literal::new(self.value)))
    }

    fn clone_without_parents(&self) -> Box<dyn Behavior> {
        Box::new(Self::new(self.initial))
    }

    fn passthrough(&self) -> Option<Box<dyn Behavior>> {
        Some(Box::new(Shell::<bool>::new()))
    }

    fn describe_state(&self) -> String {
        format!("{:?}", self.value)
    }

    any_accessors!();
}

/// Number of times its trigger has fired.
#[derive(Debug, Clone, Default)]
pub struct Counter {
    count: i64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Behavior for Counter {
    fn kind(&self) -> &'static str {
        "Count"
    }

    fn role(&self) -> Role {
        Role::Value
    }

    fn signature(&self) -> Signature {
        Signature::leaf().single(Port::Trigger)
    }

    fn output(&self) -> Port {
        Port::value::<i64>()
    }

    fn evaluate(&mut self, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        if !ctx.provoked(0) {
            return Ok(false);
        }
        self.count = self.count.wrapping_add(1);
        Ok(true)
    }

    fn prime(&mut self, _ctx: &EvalContext<'_>) -> Result<(), EvalError> {
        Ok(())
    }

    fn value_any(&self) -> Option<&dyn Any> {
        Some(&self.count)
    }

    fn freeze(&self) -> Option<Box<dyn Behavior>> {
        Some(Box::new(Literal::new(self.count)))
    }

    fn clone_without_parents(&self) -> Box<dyn Behavior> {
        Box::new(Self::new())
    }

    fn passthrough(&self) -> Option<Box<dyn Behavior>> {
        Some(Box::new(Shell::<i64>::new()))
    }

    fn describe_state(&self) -> String {
        self.count.to_string()
    }

    any_accessors!();
}

/// Sample-and-hold: copies its value parent whenever the trigger fires.
///
/// Slot 0 is the sampled value, slot 1 the trigger. The first sample is
/// taken at construction.
#[derive(Debug, Clone)]
pub struct Snapshot<T: Scalar> {
    value: Option<T>,
}

impl<T: Scalar> Snapshot<T> {
    pub fn new() -> Self {
        Self { value: None }
    }
}

impl<T: Scalar> Default for Snapshot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> Behavior for Snapshot<T> {
    fn kind(&self) -> &'static str {
        "Snapshot"
    }

    fn role(&self) -> Role {
        Role::Value
    }

    fn signature(&self) -> Signature {
        Signature::leaf()
            .single(Port::value::<T>())
            .single(Port::Trigger)
    }

    fn output(&self) -> Port {
        Port::value::<T>()
    }

    fn evaluate(&mut self, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        if !ctx.provoked(1) {
            return Ok(false);
        }
        let next = ctx.value::<T>(0)?.clone();
        Ok(crate::value::store(&mut self.value, next))
    }

    fn prime(&mut self, ctx: &EvalContext<'_>) -> Result<(), EvalError> {
        self.value = Some(ctx.value::<T>(0)?.clone());
        Ok(())
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
        crate::value::describe(&self.value)
    }

    any_accessors!();
}
