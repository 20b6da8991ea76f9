//! Operator catalogue
//!
//! Concrete operators are plain functions (for the fixed-arity shapes) or
//! [`NaryOp`] descriptors (for the n-ary shape), generic over the capability
//! traits. Nothing here knows about nodes.

use crate::error::EvalError;
use crate::graph::NaryFlags;
use crate::value::{Arithmetic, Bitwise, Comparison, FloatingPoint, NaryOp, Scalar, Text};

const MONOID: NaryFlags = NaryFlags {
    associative: true,
    commutative: true,
    idempotent: false,
};

const SEMILATTICE: NaryFlags = NaryFlags {
    associative: true,
    commutative: true,
    idempotent: true,
};

/// Flags for arithmetic folds: floats round, so they opt out of rewriting.
fn arithmetic_flags<T: Arithmetic>() -> NaryFlags {
    if T::EXACT {
        MONOID
    } else {
        NaryFlags::default()
    }
}

pub fn sum<T: Arithmetic>() -> NaryOp<T> {
    NaryOp::new("Sum", |a: &T, b: &T| Ok(a.plus(b)))
        .with_identity(T::additive_identity())
        .with_flags(arithmetic_flags::<T>())
}

pub fn product<T: Arithmetic>() -> NaryOp<T> {
    NaryOp::new("Product", |a: &T, b: &T| Ok(a.times(b)))
        .with_identity(T::one())
        .with_flags(arithmetic_flags::<T>())
}

pub fn minimum<T: Comparison>() -> NaryOp<T> {
    NaryOp::new("Min", |a: &T, b: &T| Ok(a.lesser(b))).with_flags(SEMILATTICE)
}

pub fn maximum<T: Comparison>() -> NaryOp<T> {
    NaryOp::new("Max", |a: &T, b: &T| Ok(a.greater(b))).with_flags(SEMILATTICE)
}

pub fn bits_and<T: Bitwise>() -> NaryOp<T> {
    NaryOp::new("And", |a: &T, b: &T| Ok(a.bit_and(b)))
        .with_identity(T::all_bits())
        .with_flags(SEMILATTICE)
}

pub fn bits_or<T: Bitwise>() -> NaryOp<T> {
    NaryOp::new("Or", |a: &T, b: &T| Ok(a.bit_or(b)))
        .with_identity(T::no_bits())
        .with_flags(SEMILATTICE)
}

pub fn bits_xor<T: Bitwise>() -> NaryOp<T> {
    NaryOp::new("Xor", |a: &T, b: &T| Ok(a.bit_xor(b)))
        .with_identity(T::no_bits())
        .with_flags(MONOID)
}

/// String concatenation: associative, but order matters.
pub fn concat() -> NaryOp<String> {
    NaryOp::new("Concat", |a: &String, b: &String| Ok(a.concat(b)))
        .with_identity(String::empty())
        .with_flags(NaryFlags {
            associative: true,
            ..NaryFlags::default()
        })
}

pub fn subtract<T: Arithmetic>(a: &T, b: &T) -> Result<T, EvalError> {
    Ok(a.minus(b))
}

pub fn divide<T: Arithmetic>(a: &T, b: &T) -> Result<T, EvalError> {
    a.divide(b)
}

pub fn remainder<T: Arithmetic>(a: &T, b: &T) -> Result<T, EvalError> {
    a.remainder(b)
}

pub fn negate<T: Arithmetic>(a: &T) -> Result<T, EvalError> {
    Ok(a.negate())
}

pub fn bit_not<T: Bitwise>(a: &T) -> Result<T, EvalError> {
    Ok(a.bit_not())
}

pub fn less<T: Comparison>(a: &T, b: &T) -> Result<bool, EvalError> {
    Ok(a < b)
}

pub fn greater<T: Comparison>(a: &T, b: &T) -> Result<bool, EvalError> {
    Ok(a > b)
}

pub fn equal<T: Scalar>(a: &T, b: &T) -> Result<bool, EvalError> {
    Ok(a == b)
}

pub fn not_equal<T: Scalar>(a: &T, b: &T) -> Result<bool, EvalError> {
    Ok(a != b)
}

/// `value` limited to `[low, high]`.
pub fn clamp<T: Comparison>(value: &T, low: &T, high: &T) -> Result<T, EvalError> {
    Ok(value.greater(low).lesser(high))
}

pub fn square_root<T: FloatingPoint>(a: &T) -> Result<T, EvalError> {
    Ok(a.square_root())
}

pub fn floor<T: FloatingPoint>(a: &T) -> Result<T, EvalError> {
    Ok(a.round_down())
}

pub fn ceil<T: FloatingPoint>(a: &T) -> Result<T, EvalError> {
    Ok(a.round_up())
}

pub fn abs<T: FloatingPoint>(a: &T) -> Result<T, EvalError> {
    Ok(a.magnitude())
}

/// Number of characters.
pub fn length(text: &String) -> Result<i64, EvalError> {
    Ok(text.char_count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_folds_are_not_rewritable() {
        assert_eq!(sum::<i64>().flags, MONOID);
        assert_eq!(sum::<f64>().flags, NaryFlags::default());
        assert_eq!(product::<f32>().flags, NaryFlags::default());
        assert!(minimum::<f64>().flags.idempotent);
    }

    #[test]
    fn identities_leave_results_unchanged() {
        assert_eq!(sum::<i64>().apply([&4, &0]).unwrap(), 4);
        assert_eq!(product::<i64>().apply([&4, &1]).unwrap(), 4);
        assert_eq!(bits_and::<i64>().apply([&6, &!0]).unwrap(), 6);
        assert!(bits_or::<bool>().apply([&true, &false]).unwrap());
    }

    #[test]
    fn concat_keeps_order() {
        let parts = ["ab".to_string(), "".to_string(), "cd".to_string()];
        assert_eq!(concat().apply(parts.iter()).unwrap(), "abcd");
        assert!(!concat().flags.commutative);
    }

    #[test]
    fn clamp_limits_both_ends() {
        assert_eq!(clamp(&9_i64, &0, &5).unwrap(), 5);
        assert_eq!(clamp(&-3_i64, &0, &5).unwrap(), 0);
        assert_eq!(clamp(&2.5_f64, &0.0, &5.0).unwrap(), 2.5);
    }
}
