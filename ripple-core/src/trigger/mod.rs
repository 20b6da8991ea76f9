//! Trigger Nodes
//!
//! A trigger carries no value, only a momentary pulse. It is provoked during
//! the round in which it fires and returns to the unprovoked state when the
//! round completes. For a trigger, "changed" means "became provoked this
//! round": an unprovoked evaluation never propagates, and neither does the
//! reset.
//!
//! Construction never provokes a computed trigger. Priming only records the
//! history an edge detector needs.
//!
//! The trigger-driven value adapters ([`Toggle`], [`Counter`], [`Snapshot`])
//! also live here: they are values, but only react to pulses.

/// Implements the hooks shared by trigger kinds holding `provoked: bool`.
macro_rules! trigger_hooks {
    () => {
        fn role(&self) -> crate::graph::Role {
            crate::graph::Role::Trigger
        }

        fn output(&self) -> crate::graph::Port {
            crate::graph::Port::Trigger
        }

        fn provoked(&self) -> bool {
            self.provoked
        }

        fn reset(&mut self) {
            self.provoked = false;
        }

        fn describe_state(&self) -> String {
            crate::trigger::pulse(self.provoked).into()
        }

        crate::graph::any_accessors!();
    };
}

mod adapter;
mod change;
mod gate;
mod source;

pub use adapter::{Counter, Snapshot, Toggle};
pub use change::{Edge, EdgeDirection, OnChange, WhenTrue};
pub use gate::{Gate, GateRule, SelectTrigger};
pub use source::{ConstTrigger, InputTrigger};

/// Debug text of a pulse.
pub(crate) fn pulse(provoked: bool) -> &'static str {
    if provoked {
        "!"
    } else {
        "-"
    }
}
