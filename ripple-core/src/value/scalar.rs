//! Scalar capabilities
//!
//! Each operator family is a trait implemented per concrete type. Integer
//! arithmetic wraps so that reassociating a sum never changes its result;
//! integer division by zero is an error, float division follows IEEE.

use std::fmt::Debug;

use crate::error::EvalError;

/// A type that can flow through value nodes.
pub trait Scalar: Clone + PartialEq + Debug + Send + Sync + 'static {
    /// Short type name used in diagnostics.
    fn type_name() -> &'static str;

    /// Representation equality. Unlike `==` it tells `-0.0` from `0.0`.
    fn same(&self, other: &Self) -> bool {
        self == other
    }
}

macro_rules! scalar {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(impl Scalar for $ty {
            fn type_name() -> &'static str {
                $name
            }
        })*
    };
}

scalar! {
    bool => "bool",
    i32 => "i32",
    i64 => "i64",
    String => "string",
}

macro_rules! float_scalar {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(impl Scalar for $ty {
            fn type_name() -> &'static str {
                $name
            }

            fn same(&self, other: &Self) -> bool {
                self.to_bits() == other.to_bits()
            }
        })*
    };
}

float_scalar! {
    f32 => "f32",
    f64 => "f64",
}

/// Numeric operators.
pub trait Arithmetic: Scalar {
    /// Whether addition and multiplication are exactly associative and
    /// commutative. Floats are not, because of rounding.
    const EXACT: bool;

    fn zero() -> Self;
    fn one() -> Self;

    /// The value `x` with `x + identity == x` for every `x`.
    fn additive_identity() -> Self {
        Self::zero()
    }

    fn plus(&self, rhs: &Self) -> Self;
    fn minus(&self, rhs: &Self) -> Self;
    fn times(&self, rhs: &Self) -> Self;
    fn divide(&self, rhs: &Self) -> Result<Self, EvalError>;
    fn remainder(&self, rhs: &Self) -> Result<Self, EvalError>;
    fn negate(&self) -> Self;
}

macro_rules! integer_arithmetic {
    ($($ty:ty),*) => {
        $(impl Arithmetic for $ty {
            const EXACT: bool = true;

            fn zero() -> Self {
                0
            }

            fn one() -> Self {
                1
            }

            fn plus(&self, rhs: &Self) -> Self {
                self.wrapping_add(*rhs)
            }

            fn minus(&self, rhs: &Self) -> Self {
                self.wrapping_sub(*rhs)
            }

            fn times(&self, rhs: &Self) -> Self {
                self.wrapping_mul(*rhs)
            }

            fn divide(&self, rhs: &Self) -> Result<Self, EvalError> {
                if *rhs == 0 {
                    return Err(EvalError::DivideByZero { op: "Div" });
                }
                Ok(self.wrapping_div(*rhs))
            }

            fn remainder(&self, rhs: &Self) -> Result<Self, EvalError> {
                if *rhs == 0 {
                    return Err(EvalError::DivideByZero { op: "Rem" });
                }
                Ok(self.wrapping_rem(*rhs))
            }

            fn negate(&self) -> Self {
                self.wrapping_neg()
            }
        })*
    };
}

macro_rules! float_arithmetic {
    ($($ty:ty),*) => {
        $(impl Arithmetic for $ty {
            const EXACT: bool = false;

            fn zero() -> Self {
                0.0
            }

            fn one() -> Self {
                1.0
            }

            // 0.0 would turn -0.0 into 0.0
            fn additive_identity() -> Self {
                -0.0
            }

            fn plus(&self, rhs: &Self) -> Self {
                self + rhs
            }

            fn minus(&self, rhs: &Self) -> Self {
                self - rhs
            }

            fn times(&self, rhs: &Self) -> Self {
                self * rhs
            }

            fn divide(&self, rhs: &Self) -> Result<Self, EvalError> {
                Ok(self / rhs)
            }

            fn remainder(&self, rhs: &Self) -> Result<Self, EvalError> {
                Ok(self % rhs)
            }

            fn negate(&self) -> Self {
                -self
            }
        })*
    };
}

integer_arithmetic!(i32, i64);
float_arithmetic!(f32, f64);

/// Bitwise operators; `bool` is a one-bit integer.
pub trait Bitwise: Scalar {
    fn no_bits() -> Self;
    fn all_bits() -> Self;
    fn bit_and(&self, rhs: &Self) -> Self;
    fn bit_or(&self, rhs: &Self) -> Self;
    fn bit_xor(&self, rhs: &Self) -> Self;
    fn bit_not(&self) -> Self;
}

macro_rules! bitwise {
    ($($ty:ty => $none:expr, $all:expr);* $(;)?) => {
        $(impl Bitwise for $ty {
            fn no_bits() -> Self {
                $none
            }

            fn all_bits() -> Self {
                $all
            }

            fn bit_and(&self, rhs: &Self) -> Self {
                *self & *rhs
            }

            fn bit_or(&self, rhs: &Self) -> Self {
                *self | *rhs
            }

            fn bit_xor(&self, rhs: &Self) -> Self {
                *self ^ *rhs
            }

            fn bit_not(&self) -> Self {
                !*self
            }
        })*
    };
}

bitwise! {
    bool => false, true;
    i32 => 0, !0;
    i64 => 0, !0;
}

/// Ordering operators.
pub trait Comparison: Scalar + PartialOrd {
    fn lesser(&self, rhs: &Self) -> Self {
        if rhs < self {
            rhs.clone()
        } else {
            self.clone()
        }
    }

    fn greater(&self, rhs: &Self) -> Self {
        if rhs > self {
            rhs.clone()
        } else {
            self.clone()
        }
    }
}

impl Comparison for bool {}
impl Comparison for i32 {}
impl Comparison for i64 {}
impl Comparison for String {}

// NaN-ignoring min/max keep both operations commutative.
impl Comparison for f32 {
    fn lesser(&self, rhs: &Self) -> Self {
        self.min(*rhs)
    }

    fn greater(&self, rhs: &Self) -> Self {
        self.max(*rhs)
    }
}

impl Comparison for f64 {
    fn lesser(&self, rhs: &Self) -> Self {
        self.min(*rhs)
    }

    fn greater(&self, rhs: &Self) -> Self {
        self.max(*rhs)
    }
}

/// Floating point operators.
pub trait FloatingPoint: Arithmetic + Comparison {
    fn square_root(&self) -> Self;
    fn round_down(&self) -> Self;
    fn round_up(&self) -> Self;
    fn magnitude(&self) -> Self;
}

macro_rules! floating_point {
    ($($ty:ty),*) => {
        $(impl FloatingPoint for $ty {
            fn square_root(&self) -> Self {
                self.sqrt()
            }

            fn round_down(&self) -> Self {
                self.floor()
            }

            fn round_up(&self) -> Self {
                self.ceil()
            }

            fn magnitude(&self) -> Self {
                self.abs()
            }
        })*
    };
}

floating_point!(f32, f64);

/// String operators.
pub trait Text: Scalar {
    fn empty() -> Self;
    fn concat(&self, rhs: &Self) -> Self;
    fn char_count(&self) -> i64;
}

impl Text for String {
    fn empty() -> Self {
        String::new()
    }

    fn concat(&self, rhs: &Self) -> Self {
        let mut out = String::with_capacity(self.len() + rhs.len());
        out.push_str(self);
        out.push_str(rhs);
        out
    }

    fn char_count(&self) -> i64 {
        self.chars().count() as i64
    }
}
