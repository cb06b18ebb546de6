//! Single- and double-precision floating-point operations.
//!
//! One table shape serves both precisions; each precision supplies its own
//! operation names. Everything maps straight onto host IEEE arithmetic, so
//! NaN comparisons are false, division by zero yields an infinity and
//! `log` of a non-positive number yields NaN or -inf rather than an error.

use super::{PrimCall, PrimOpHandler};
use crate::error::Result;
use crate::state::StgState;
use num_traits::Float;
use std::marker::PhantomData;
use stg_core::Atom;

/// Float operations deliberately left out; calls fall through to the
/// fallback handler.
pub const UNIMPLEMENTED_FLOAT_OPS: &[&str] = &[
    "decodeFloat_Int#",
    "expm1Float#",
    "log1pFloat#",
    "asinhFloat#",
    "acoshFloat#",
    "atanhFloat#",
];

pub const UNIMPLEMENTED_DOUBLE_OPS: &[&str] = &[
    "decodeDouble_2Int#",
    "decodeDouble_Int64#",
    "expm1Double#",
    "log1pDouble#",
    "asinhDouble#",
    "acoshDouble#",
    "atanhDouble#",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatOp {
    Greater,
    GreaterEq,
    Equal,
    NotEqual,
    Less,
    LessEq,
    Plus,
    Minus,
    Times,
    Divide,
    Negate,
    Fabs,
    ToInt,
    Exp,
    Log,
    Sqrt,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Power,
    /// Float# -> Double# or Double# -> Float#.
    Convert,
}

use FloatOp::*;

const FLOAT_TABLE: &[(&str, FloatOp)] = &[
    ("gtFloat#", Greater),
    ("geFloat#", GreaterEq),
    ("eqFloat#", Equal),
    ("neFloat#", NotEqual),
    ("ltFloat#", Less),
    ("leFloat#", LessEq),
    ("plusFloat#", Plus),
    ("minusFloat#", Minus),
    ("timesFloat#", Times),
    ("divideFloat#", Divide),
    ("negateFloat#", Negate),
    ("fabsFloat#", Fabs),
    ("float2Int#", ToInt),
    ("expFloat#", Exp),
    ("logFloat#", Log),
    ("sqrtFloat#", Sqrt),
    ("sinFloat#", Sin),
    ("cosFloat#", Cos),
    ("tanFloat#", Tan),
    ("asinFloat#", Asin),
    ("acosFloat#", Acos),
    ("atanFloat#", Atan),
    ("sinhFloat#", Sinh),
    ("coshFloat#", Cosh),
    ("tanhFloat#", Tanh),
    ("powerFloat#", Power),
    ("float2Double#", Convert),
];

const DOUBLE_TABLE: &[(&str, FloatOp)] = &[
    (">##", Greater),
    (">=##", GreaterEq),
    ("==##", Equal),
    ("/=##", NotEqual),
    ("<##", Less),
    ("<=##", LessEq),
    ("+##", Plus),
    ("-##", Minus),
    ("*##", Times),
    ("/##", Divide),
    ("negateDouble#", Negate),
    ("fabsDouble#", Fabs),
    ("double2Int#", ToInt),
    ("expDouble#", Exp),
    ("logDouble#", Log),
    ("sqrtDouble#", Sqrt),
    ("sinDouble#", Sin),
    ("cosDouble#", Cos),
    ("tanDouble#", Tan),
    ("asinDouble#", Asin),
    ("acosDouble#", Acos),
    ("atanDouble#", Atan),
    ("sinhDouble#", Sinh),
    ("coshDouble#", Cosh),
    ("tanhDouble#", Tanh),
    ("**##", Power),
    ("double2Float#", Convert),
];

/// A host float type that has an atom of its own.
pub trait FloatRepr: Float {
    const FAMILY: &'static str;
    const TABLE: &'static [(&'static str, FloatOp)];

    fn from_atom(atom: &Atom) -> Option<Self>;
    fn to_atom(self) -> Atom;
    /// The value in the other precision.
    fn convert(self) -> Atom;
}

impl FloatRepr for f32 {
    const FAMILY: &'static str = "Float";
    const TABLE: &'static [(&'static str, FloatOp)] = FLOAT_TABLE;

    fn from_atom(atom: &Atom) -> Option<Self> {
        match atom {
            Atom::Float(x) => Some(*x),
            _ => None,
        }
    }

    fn to_atom(self) -> Atom {
        Atom::Float(self)
    }

    fn convert(self) -> Atom {
        Atom::Double(f64::from(self))
    }
}

impl FloatRepr for f64 {
    const FAMILY: &'static str = "Double";
    const TABLE: &'static [(&'static str, FloatOp)] = DOUBLE_TABLE;

    fn from_atom(atom: &Atom) -> Option<Self> {
        match atom {
            Atom::Double(x) => Some(*x),
            _ => None,
        }
    }

    fn to_atom(self) -> Atom {
        Atom::Double(self)
    }

    fn convert(self) -> Atom {
        Atom::Float(self as f32)
    }
}

/// Round toward zero. Out-of-range values saturate and NaN becomes 0,
/// matching a host float-to-int cast.
fn truncate_to_int<F: Float>(x: F) -> i64 {
    if x.is_nan() {
        return 0;
    }
    x.trunc()
        .to_i64()
        .unwrap_or(if x > F::zero() { i64::MAX } else { i64::MIN })
}

#[derive(Debug, Default)]
pub struct FloatOps<F> {
    _precision: PhantomData<F>,
}

impl<F: FloatRepr> FloatOps<F> {
    pub fn new() -> Self {
        Self {
            _precision: PhantomData,
        }
    }

    fn lookup(name: &str) -> Option<FloatOp> {
        F::TABLE.iter().find(|(n, _)| *n == name).map(|(_, op)| *op)
    }

    fn compute(op: FloatOp, args: &[Atom]) -> Option<Atom> {
        let result = match (op, args) {
            (Greater | GreaterEq | Equal | NotEqual | Less | LessEq, [a, b]) => {
                let (a, b) = (F::from_atom(a)?, F::from_atom(b)?);
                Atom::from_bool(match op {
                    Greater => a > b,
                    GreaterEq => a >= b,
                    Equal => a == b,
                    NotEqual => a != b,
                    Less => a < b,
                    _ => a <= b,
                })
            }
            (Plus | Minus | Times | Divide | Power, [a, b]) => {
                let (a, b) = (F::from_atom(a)?, F::from_atom(b)?);
                let r = match op {
                    Plus => a + b,
                    Minus => a - b,
                    Times => a * b,
                    Divide => a / b,
                    _ => a.powf(b),
                };
                r.to_atom()
            }
            (ToInt, [a]) => Atom::int(truncate_to_int(F::from_atom(a)?)),
            (Convert, [a]) => F::from_atom(a)?.convert(),
            (_, [a]) => {
                let a = F::from_atom(a)?;
                let r = match op {
                    Negate => -a,
                    Fabs => a.abs(),
                    Exp => a.exp(),
                    Log => a.ln(),
                    Sqrt => a.sqrt(),
                    Sin => a.sin(),
                    Cos => a.cos(),
                    Tan => a.tan(),
                    Asin => a.asin(),
                    Acos => a.acos(),
                    Atan => a.atan(),
                    Sinh => a.sinh(),
                    Cosh => a.cosh(),
                    Tanh => a.tanh(),
                    _ => return None,
                };
                r.to_atom()
            }
            _ => return None,
        };
        Some(result)
    }
}

impl<F: FloatRepr> PrimOpHandler for FloatOps<F> {
    fn family(&self) -> &'static str {
        F::FAMILY
    }

    fn operations(&self) -> Vec<&'static str> {
        F::TABLE.iter().map(|(n, _)| *n).collect()
    }

    fn evaluate(&self, _state: &mut StgState, call: &PrimCall<'_>) -> Result<Option<Vec<Atom>>> {
        Ok(Self::lookup(call.name)
            .and_then(|op| Self::compute(op, call.args))
            .map(|atom| vec![atom]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f32_op(name: &str, args: &[Atom]) -> Option<Atom> {
        FloatOps::<f32>::compute(FloatOps::<f32>::lookup(name)?, args)
    }

    fn f64_op(name: &str, args: &[Atom]) -> Option<Atom> {
        FloatOps::<f64>::compute(FloatOps::<f64>::lookup(name)?, args)
    }

    #[test]
    fn test_float_arithmetic() {
        let r = f32_op("plusFloat#", &[Atom::Float(2.0), Atom::Float(3.0)]);
        assert_eq!(r, Some(Atom::Float(5.0)));
        let r = f32_op("divideFloat#", &[Atom::Float(1.0), Atom::Float(0.0)]);
        assert_eq!(r, Some(Atom::Float(f32::INFINITY)));
        let r = f32_op("negateFloat#", &[Atom::Float(2.5)]);
        assert_eq!(r, Some(Atom::Float(-2.5)));
    }

    #[test]
    fn test_float_comparisons() {
        let gt = |a, b| f32_op("gtFloat#", &[Atom::Float(a), Atom::Float(b)]);
        assert_eq!(gt(2.0, 3.0), Some(Atom::int(0)));
        assert_eq!(gt(3.0, 2.0), Some(Atom::int(1)));
        let eq = f32_op("eqFloat#", &[Atom::Float(f32::NAN), Atom::Float(f32::NAN)]);
        assert_eq!(eq, Some(Atom::int(0)));
        let ne = f32_op("neFloat#", &[Atom::Float(f32::NAN), Atom::Float(f32::NAN)]);
        assert_eq!(ne, Some(Atom::int(1)));
    }

    #[test]
    fn test_truncation_and_widening() {
        assert_eq!(
            f32_op("float2Int#", &[Atom::Float(-3.7)]),
            Some(Atom::int(-3))
        );
        assert_eq!(
            f32_op("float2Int#", &[Atom::Float(f32::NAN)]),
            Some(Atom::int(0))
        );
        assert_eq!(
            f32_op("float2Double#", &[Atom::Float(1.5)]),
            Some(Atom::Double(1.5))
        );
        assert_eq!(
            f64_op("double2Float#", &[Atom::Double(0.25)]),
            Some(Atom::Float(0.25))
        );
    }

    #[test]
    fn test_transcendentals_follow_ieee() {
        match f64_op("logDouble#", &[Atom::Double(-1.0)]) {
            Some(Atom::Double(x)) => assert!(x.is_nan()),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            f64_op("logDouble#", &[Atom::Double(0.0)]),
            Some(Atom::Double(f64::NEG_INFINITY))
        );
        assert_eq!(
            f64_op("**##", &[Atom::Double(2.0), Atom::Double(10.0)]),
            Some(Atom::Double(1024.0))
        );
    }

    #[test]
    fn test_each_transcendental_has_its_own_name() {
        let x = Atom::Double(0.5);
        let sin = f64_op("sinDouble#", &[x.clone()]);
        let cos = f64_op("cosDouble#", &[x.clone()]);
        let tan = f64_op("tanDouble#", &[x]);
        assert_eq!(sin, Some(Atom::Double(0.5f64.sin())));
        assert_eq!(cos, Some(Atom::Double(0.5f64.cos())));
        assert_eq!(tan, Some(Atom::Double(0.5f64.tan())));
    }

    #[test]
    fn test_gaps_are_not_claimed() {
        let float_ops = FloatOps::<f32>::new().operations();
        let double_ops = FloatOps::<f64>::new().operations();
        for gap in UNIMPLEMENTED_FLOAT_OPS {
            assert!(!float_ops.contains(gap));
        }
        for gap in UNIMPLEMENTED_DOUBLE_OPS {
            assert!(!double_ops.contains(gap));
        }
    }

    #[test]
    fn test_wrong_precision_is_declined() {
        assert_eq!(
            f32_op("plusFloat#", &[Atom::Double(1.0), Atom::Double(2.0)]),
            None
        );
        assert_eq!(f32_op("plusFloat#", &[Atom::Float(1.0)]), None);
    }
}
