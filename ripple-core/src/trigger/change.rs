//! Triggers derived from value changes.

use crate::error::EvalError;
use crate::graph::{Behavior, EvalContext, Port, Signature};

/// Provoked when any parent reported a change earlier in the same round.
#[derive(Debug, Clone, Default)]
pub struct OnChange {
    provoked: bool,
}

impl OnChange {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Behavior for OnChange {
    fn kind(&self) -> &'static str {
        "OnChange"
    }

    fn signature(&self) -> Signature {
        Signature::leaf().list(Port::Any, 1)
    }

    fn evaluate(&mut self, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        self.provoked = ctx.parents().iter().any(|parent| ctx.changed(parent));
        Ok(self.provoked)
    }

    fn prime(&mut self, _ctx: &EvalContext<'_>) -> Result<(), EvalError> {
        Ok(())
    }

    fn clone_without_parents(&self) -> Box<dyn Behavior> {
        Box::new(Self::new())
    }

    trigger_hooks!();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDirection {
    /// `false` to `true`.
    Rising,

    /// `true` to `false`.
    Falling,
}

/// Edge detector over a bool parent.
#[derive(Debug, Clone)]
pub struct Edge {
    direction: EdgeDirection,
    last: Option<bool>,
    provoked: bool,
}

impl Edge {
    pub fn new(direction: EdgeDirection) -> Self {
        Self {
            direction,
            last: None,
            provoked: false,
        }
    }

    pub fn direction(&self) -> EdgeDirection {
        self.direction
    }
}

impl Behavior for Edge {
    fn kind(&self) -> &'static str {
        match self.direction {
            EdgeDirection::Rising => "Rising",
            EdgeDirection::Falling => "Falling",
        }
    }

    fn signature(&self) -> Signature {
        Signature::leaf().single(Port::value::<bool>())
    }

    fn evaluate(&mut self, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        let now = *ctx.value::<bool>(0)?;
        let before = self.last.replace(now);
        self.provoked = match self.direction {
            EdgeDirection::Rising => before == Some(false) && now,
            EdgeDirection::Falling => before == Some(true) && !now,
        };
        Ok(self.provoked)
    }

    /// Record the current level without firing.
    fn prime(&mut self, ctx: &EvalContext<'_>) -> Result<(), EvalError> {
        self.last = Some(*ctx.value::<bool>(0)?);
        Ok(())
    }

    fn clone_without_parents(&self) -> Box<dyn Behavior> {
        Box::new(Self::new(self.direction))
    }

    trigger_hooks!();
}

/// Provoked whenever its bool parent is evaluated as `true`.
#[derive(Debug, Clone, Default)]
pub struct WhenTrue {
    provoked: bool,
}

impl WhenTrue {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Behavior for WhenTrue {
    fn kind(&self) -> &'static str {
        "WhenTrue"
    }

    fn signature(&self) -> Signature {
        Signature::leaf().single(Port::value::<bool>())
    }

    fn evaluate(&mut self, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        self.provoked = *ctx.value::<bool>(0)?;
        Ok(self.provoked)
    }

    fn prime(&mut self, _ctx: &EvalContext<'_>) -> Result<(), EvalError> {
        Ok(())
    }

    fn clone_without_parents(&self) -> Box<dyn Behavior> {
        Box::new(Self::new())
    }

    trigger_hooks!();
}
