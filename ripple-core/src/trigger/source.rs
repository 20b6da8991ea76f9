//! Trigger leaves.

use crate::error::EvalError;
use crate::graph::{Behavior, EvalContext, Signature};

/// Trigger provoked by the host.
#[derive(Debug, Clone, Default)]
pub struct InputTrigger {
    staged: bool,
    provoked: bool,
}

impl InputTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a pulse in the next round.
    pub fn stage(&mut self) {
        self.staged = true;
    }
}

impl Behavior for InputTrigger {
    fn kind(&self) -> &'static str {
        "InputTrigger"
    }

    fn signature(&self) -> Signature {
        Signature::leaf()
    }

    fn evaluate(&mut self, _ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        self.provoked = std::mem::take(&mut self.staged);
        Ok(self.provoked)
    }

    fn prime(&mut self, _ctx: &EvalContext<'_>) -> Result<(), EvalError> {
        Ok(())
    }

    fn is_source(&self) -> bool {
        true
    }

    fn clone_without_parents(&self) -> Box<dyn Behavior> {
        Box::new(Self::new())
    }

    trigger_hooks!();
}

/// Frozen trigger that never fires. Produced by constant folding.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstTrigger;

impl ConstTrigger {
    pub fn new() -> Self {
        Self
    }
}

impl Behavior for ConstTrigger {
    fn kind(&self) -> &'static str {
        "ConstTrigger"
    }

    fn role(&self) -> crate::graph::Role {
        crate::graph::Role::Trigger
    }

    fn output(&self) -> crate::graph::Port {
        crate::graph::Port::Trigger
    }

    fn signature(&self) -> Signature {
        Signature::leaf()
    }

    fn evaluate(&mut self, _ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        Ok(false)
    }

    fn prime(&mut self, _ctx: &EvalContext<'_>) -> Result<(), EvalError> {
        Ok(())
    }

    fn provoked(&self) -> bool {
        false
    }

    fn is_literal(&self) -> bool {
        true
    }

    fn freeze(&self) -> Option<Box<dyn Behavior>> {
        Some(Box::new(*self))
    }

    fn clone_without_parents(&self) -> Box<dyn Behavior> {
        Box::new(*self)
    }

    fn describe_state(&self) -> String {
        super::pulse(false).into()
    }

    crate::graph::any_accessors!();
}
