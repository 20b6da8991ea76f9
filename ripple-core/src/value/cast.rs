//! Casts between scalar types.

use super::scalar::Scalar;
use crate::error::EvalError;

/// Fallible conversion from another scalar type.
pub trait CastFrom<S: Scalar>: Scalar {
    fn cast_from(source: &S) -> Result<Self, EvalError>;
}

/// Unary operator form of [`CastFrom`].
pub fn cast<S: Scalar, R: CastFrom<S>>(source: &S) -> Result<R, EvalError> {
    R::cast_from(source)
}

fn failed<S: Scalar + ToString, R: Scalar>(source: &S) -> EvalError {
    EvalError::Cast {
        from: S::type_name(),
        to: R::type_name(),
        value: source.to_string(),
    }
}

macro_rules! lossless {
    ($($from:ty => $to:ty),* $(,)?) => {
        $(impl CastFrom<$from> for $to {
            fn cast_from(source: &$from) -> Result<Self, EvalError> {
                Ok(<$to>::from(*source))
            }
        })*
    };
}

lossless! {
    i32 => i64,
    i32 => f64,
    f32 => f64,
    bool => i64,
}

impl CastFrom<i64> for i32 {
    fn cast_from(source: &i64) -> Result<Self, EvalError> {
        i32::try_from(*source).map_err(|_| failed::<i64, i32>(source))
    }
}

impl CastFrom<i64> for f64 {
    fn cast_from(source: &i64) -> Result<Self, EvalError> {
        Ok(*source as f64)
    }
}

impl CastFrom<f64> for i64 {
    /// Truncates toward zero; NaN, infinities and out-of-range values fail.
    fn cast_from(source: &f64) -> Result<Self, EvalError> {
        let truncated = source.trunc();
        if truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
            Ok(truncated as i64)
        } else {
            Err(failed::<f64, i64>(source))
        }
    }
}

impl CastFrom<i64> for bool {
    fn cast_from(source: &i64) -> Result<Self, EvalError> {
        Ok(*source != 0)
    }
}

impl CastFrom<String> for i64 {
    fn cast_from(source: &String) -> Result<Self, EvalError> {
        source.trim().parse().map_err(|_| failed::<String, i64>(source))
    }
}

impl CastFrom<String> for f64 {
    fn cast_from(source: &String) -> Result<Self, EvalError> {
        source.trim().parse().map_err(|_| failed::<String, f64>(source))
    }
}

macro_rules! to_text {
    ($($from:ty),*) => {
        $(impl CastFrom<$from> for String {
            fn cast_from(source: &$from) -> Result<Self, EvalError> {
                Ok(source.to_string())
            }
        })*
    };
}

to_text!(bool, i32, i64, f64);
