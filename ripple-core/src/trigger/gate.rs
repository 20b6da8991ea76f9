//! Trigger combinators.

use crate::error::EvalError;
use crate::graph::{Behavior, EvalContext, Port, Signature};

/// How a [`Gate`] combines the pulses of its parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRule {
    /// Every parent is provoked.
    All,

    /// At least one parent is provoked.
    Any,

    /// Exactly one parent is provoked.
    OnlyOne,

    /// An odd number of parents are provoked.
    Xor,
}

impl GateRule {
    pub fn name(self) -> &'static str {
        match self {
            GateRule::All => "All",
            GateRule::Any => "Any",
            GateRule::OnlyOne => "OnlyOne",
            GateRule::Xor => "Xor",
        }
    }

    /// Apply the rule to the provoked state of each parent.
    pub fn apply(self, pulses: impl IntoIterator<Item = bool>) -> bool {
        let mut total = 0;
        let mut count = 0;
        for provoked in pulses {
            total += 1;
            count += usize::from(provoked);
        }
        match self {
            GateRule::All => total > 0 && count == total,
            GateRule::Any => count > 0,
            GateRule::OnlyOne => count == 1,
            GateRule::Xor => count % 2 == 1,
        }
    }
}

/// Trigger over a list of trigger parents.
#[derive(Debug, Clone)]
pub struct Gate {
    rule: GateRule,
    provoked: bool,
}

impl Gate {
    pub fn new(rule: GateRule) -> Self {
        Self {
            rule,
            provoked: false,
        }
    }

    pub fn rule(&self) -> GateRule {
        self.rule
    }
}

impl Behavior for Gate {
    fn kind(&self) -> &'static str {
        self.rule.name()
    }

    fn signature(&self) -> Signature {
        Signature::leaf().list(Port::Trigger, 1)
    }

    fn evaluate(&mut self, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        self.provoked = self.rule.apply(ctx.provoked_list(0));
        Ok(self.provoked)
    }

    fn prime(&mut self, _ctx: &EvalContext<'_>) -> Result<(), EvalError> {
        Ok(())
    }

    fn clone_without_parents(&self) -> Box<dyn Behavior> {
        Box::new(Self::new(self.rule))
    }

    trigger_hooks!();
}

/// `if condition { then } else { otherwise }` over two trigger branches.
///
/// Provoked only when the currently selected branch is provoked in the same
/// round. Flipping the condition alone is not a pulse.
#[derive(Debug, Clone, Default)]
pub struct SelectTrigger {
    provoked: bool,
}

impl SelectTrigger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Behavior for SelectTrigger {
    fn kind(&self) -> &'static str {
        "SelectTrigger"
    }

    fn signature(&self) -> Signature {
        Signature::leaf()
            .single(Port::value::<bool>())
            .single(Port::Trigger)
            .single(Port::Trigger)
    }

    fn evaluate(&mut self, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        let branch = if *ctx.value::<bool>(0)? { 1 } else { 2 };
        self.provoked = ctx.provoked(branch);
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
