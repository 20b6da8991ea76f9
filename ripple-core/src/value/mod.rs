//! Value Nodes
//!
//! Value nodes hold a typed value between rounds. They come in a few generic
//! shapes (leaves, passthroughs, fixed-arity and n-ary combinators, a mux);
//! concrete operators are just functions plugged into these shapes.
//!
//! Value types are restricted to the closed set of [`Scalar`] types and
//! opt into operator families through capability traits ([`Arithmetic`],
//! [`Bitwise`], [`Comparison`], [`FloatingPoint`], [`Text`]).

mod cast;
mod combinator;
mod leaf;
mod scalar;
mod select;

pub use cast::{cast, CastFrom};
pub use combinator::{Binary, BinaryFn, Nary, NaryOp, Ternary, TernaryFn, Unary, UnaryFn};
pub use leaf::{Input, Literal, Shell};
pub use scalar::{Arithmetic, Bitwise, Comparison, FloatingPoint, Scalar, Text};
pub use select::Select;

/// Store `next` in `slot`. Returns whether the stored value changed.
///
/// Changes are judged by [`Scalar::same`], so `-0.0` replacing `0.0` is a
/// change and a recomputed NaN is not.
pub(crate) fn store<T: Scalar>(slot: &mut Option<T>, next: T) -> bool {
    if slot.as_ref().is_some_and(|current| current.same(&next)) {
        return false;
    }
    *slot = Some(next);
    true
}

/// Debug text of an optional value, `?` before the first evaluation.
pub(crate) fn describe<T: std::fmt::Debug>(value: &Option<T>) -> String {
    match value {
        Some(value) => format!("{value:?}"),
        None => "?".into(),
    }
}
