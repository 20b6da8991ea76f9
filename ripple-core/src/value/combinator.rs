//! Combinator shapes
//!
//! Computed value nodes are one of four shapes. Each holds a plain function
//! pointer for its operation, so instances are cheap to clone without
//! parents when the optimizer substitutes nodes.

use std::any::{Any, TypeId};

use super::leaf::{Literal, Shell};
use super::scalar::Scalar;
use super::{describe, store};
use crate::error::EvalError;
use crate::graph::{
    any_accessors, Behavior, EvalContext, NaryFlags, NaryShape, Port, Role, Signature,
};

pub type UnaryFn<A, R> = fn(&A) -> Result<R, EvalError>;
pub type BinaryFn<A, B, R> = fn(&A, &B) -> Result<R, EvalError>;
pub type TernaryFn<A, B, C, R> = fn(&A, &B, &C) -> Result<R, EvalError>;

/// Implements the value-side hooks shared by every combinator holding
/// `value: Option<R>`.
macro_rules! value_hooks {
    ($out:ty) => {
        fn role(&self) -> Role {
            Role::Value
        }

        fn output(&self) -> Port {
            Port::value::<$out>()
        }

        fn value_any(&self) -> Option<&dyn Any> {
            self.value.as_ref().map(|value| value as &dyn Any)
        }

        fn freeze(&self) -> Option<Box<dyn Behavior>> {
            self.value
                .clone()
                .map(|value| Box::new(Literal::new(value)) as Box<dyn Behavior>)
        }

        fn passthrough(&self) -> Option<Box<dyn Behavior>> {
            Some(Box::new(Shell::<$out>::new()))
        }

        fn describe_state(&self) -> String {
            describe(&self.value)
        }

        any_accessors!();
    };
}

/// One-parent computed value.
#[derive(Debug, Clone)]
pub struct Unary<A: Scalar, R: Scalar> {
    name: &'static str,
    op: UnaryFn<A, R>,
    value: Option<R>,
}

impl<A: Scalar, R: Scalar> Unary<A, R> {
    pub fn new(name: &'static str, op: UnaryFn<A, R>) -> Self {
        Self {
            name,
            op,
            value: None,
        }
    }
}

impl<A: Scalar, R: Scalar> Behavior for Unary<A, R> {
    fn kind(&self) -> &'static str {
        self.name
    }

    fn signature(&self) -> Signature {
        Signature::leaf().single(Port::value::<A>())
    }

    fn evaluate(&mut self, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        let next = (self.op)(ctx.value::<A>(0)?)?;
        Ok(store(&mut self.value, next))
    }

    fn clone_without_parents(&self) -> Box<dyn Behavior> {
        Box::new(Self::new(self.name, self.op))
    }

    value_hooks!(R);
}

/// Two-parent computed value.
#[derive(Debug, Clone)]
pub struct Binary<A: Scalar, B: Scalar, R: Scalar> {
    name: &'static str,
    op: BinaryFn<A, B, R>,
    value: Option<R>,
}

impl<A: Scalar, B: Scalar, R: Scalar> Binary<A, B, R> {
    pub fn new(name: &'static str, op: BinaryFn<A, B, R>) -> Self {
        Self {
            name,
            op,
            value: None,
        }
    }
}

impl<A: Scalar, B: Scalar, R: Scalar> Behavior for Binary<A, B, R> {
    fn kind(&self) -> &'static str {
        self.name
    }

    fn signature(&self) -> Signature {
        Signature::leaf()
            .single(Port::value::<A>())
            .single(Port::value::<B>())
    }

    fn evaluate(&mut self, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        let next = (self.op)(ctx.value::<A>(0)?, ctx.value::<B>(1)?)?;
        Ok(store(&mut self.value, next))
    }

    fn clone_without_parents(&self) -> Box<dyn Behavior> {
        Box::new(Self::new(self.name, self.op))
    }

    value_hooks!(R);
}

/// Three-parent computed value.
#[derive(Debug, Clone)]
pub struct Ternary<A: Scalar, B: Scalar, C: Scalar, R: Scalar> {
    name: &'static str,
    op: TernaryFn<A, B, C, R>,
    value: Option<R>,
}

impl<A: Scalar, B: Scalar, C: Scalar, R: Scalar> Ternary<A, B, C, R> {
    pub fn new(name: &'static str, op: TernaryFn<A, B, C, R>) -> Self {
        Self {
            name,
            op,
            value: None,
        }
    }
}

impl<A: Scalar, B: Scalar, C: Scalar, R: Scalar> Behavior for Ternary<A, B, C, R> {
    fn kind(&self) -> &'static str {
        self.name
    }

    fn signature(&self) -> Signature {
        Signature::leaf()
            .single(Port::value::<A>())
            .single(Port::value::<B>())
            .single(Port::value::<C>())
    }

    fn evaluate(&mut self, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        let next = (self.op)(ctx.value::<A>(0)?, ctx.value::<B>(1)?, ctx.value::<C>(2)?)?;
        Ok(store(&mut self.value, next))
    }

    fn clone_without_parents(&self) -> Box<dyn Behavior> {
        Box::new(Self::new(self.name, self.op))
    }

    value_hooks!(R);
}

/// A left fold over any number of operands of one type.
#[derive(Debug, Clone)]
pub struct NaryOp<T: Scalar> {
    pub name: &'static str,
    pub fold: BinaryFn<T, T, T>,
    pub identity: Option<T>,
    pub flags: NaryFlags,
}

impl<T: Scalar> NaryOp<T> {
    pub fn new(name: &'static str, fold: BinaryFn<T, T, T>) -> Self {
        Self {
            name,
            fold,
            identity: None,
            flags: NaryFlags::default(),
        }
    }

    /// Declare the operand that leaves the result unchanged.
    pub fn with_identity(mut self, identity: T) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_flags(mut self, flags: NaryFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Fold the operands left to right. No operands yield the identity.
    pub fn apply<'a>(&self, operands: impl IntoIterator<Item = &'a T>) -> Result<T, EvalError> {
        let mut operands = operands.into_iter();
        let Some(first) = operands.next() else {
            return self
                .identity
                .clone()
                .ok_or(EvalError::EmptyOperands { op: self.name });
        };
        operands.try_fold(first.clone(), |acc, operand| (self.fold)(&acc, operand))
    }
}

/// Variable-arity computed value over one list slot.
#[derive(Debug, Clone)]
pub struct Nary<T: Scalar> {
    op: NaryOp<T>,
    value: Option<T>,
}

impl<T: Scalar> Nary<T> {
    pub fn new(op: NaryOp<T>) -> Self {
        Self { op, value: None }
    }

    pub fn op(&self) -> &NaryOp<T> {
        &self.op
    }
}

impl<T: Scalar> Behavior for Nary<T> {
    fn kind(&self) -> &'static str {
        self.op.name
    }

    fn signature(&self) -> Signature {
        Signature::leaf().list(Port::value::<T>(), 1)
    }

    fn evaluate(&mut self, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        let operands = ctx.list::<T>(0)?;
        let next = self.op.apply(operands)?;
        Ok(store(&mut self.value, next))
    }

    fn clone_without_parents(&self) -> Box<dyn Behavior> {
        Box::new(Self::new(self.op.clone()))
    }

    fn as_nary(&self) -> Option<&dyn NaryShape> {
        Some(self)
    }

    value_hooks!(T);
}

impl<T: Scalar> NaryShape for Nary<T> {
    fn op_key(&self) -> (&'static str, TypeId) {
        (self.op.name, TypeId::of::<T>())
    }

    fn flags(&self) -> NaryFlags {
        self.op.flags
    }

    fn is_identity(&self, candidate: &dyn Behavior) -> bool {
        let Some(identity) = &self.op.identity else {
            return false;
        };
        candidate.is_literal()
            && candidate
                .value_any()
                .and_then(|value| value.downcast_ref::<T>())
                .is_some_and(|value| value.same(identity))
    }

    fn fold_literals(&self, literals: &[&dyn Behavior]) -> Result<Box<dyn Behavior>, EvalError> {
        let values = literals
            .iter()
            .map(|literal| {
                literal
                    .value_any()
                    .and_then(|value| value.downcast_ref::<T>())
                    .ok_or_else(|| EvalError::TypeMismatch {
                        expected: T::type_name(),
                        found: literal.output().to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Box::new(Literal::new(self.op.apply(values)?)))
    }
}
