//! `Int#`, `Word#` and `Char#` operations.
//!
//! Arithmetic wraps like the machine's. Comparisons answer 1 or 0.

use super::{shape_error, PrimCall, PrimOpHandler};
use crate::error::Result;
use crate::state::StgState;
use stg_core::{Atom, Literal};

const INT_OPS: &[&str] = &[
    "+#",
    "-#",
    "*#",
    "quotInt#",
    "remInt#",
    "negateInt#",
    "==#",
    "/=#",
    "<#",
    "<=#",
    ">#",
    ">=#",
    "andI#",
    "orI#",
    "xorI#",
    "notI#",
    "uncheckedIShiftL#",
    "uncheckedIShiftRA#",
    "uncheckedIShiftRL#",
    "int2Word#",
    "int2Float#",
    "int2Double#",
    "chr#",
];

const WORD_OPS: &[&str] = &[
    "plusWord#",
    "minusWord#",
    "timesWord#",
    "quotWord#",
    "remWord#",
    "and#",
    "or#",
    "xor#",
    "not#",
    "eqWord#",
    "neWord#",
    "ltWord#",
    "leWord#",
    "gtWord#",
    "geWord#",
    "uncheckedShiftL#",
    "uncheckedShiftRL#",
    "word2Int#",
    "word2Double#",
];

const CHAR_OPS: &[&str] = &[
    "ord#", "eqChar#", "neChar#", "ltChar#", "leChar#", "gtChar#", "geChar#",
];

fn int(a: &Atom) -> Option<i64> {
    a.as_int()
}

fn word(a: &Atom) -> Option<u64> {
    a.as_word()
}

fn chr(a: &Atom) -> Option<char> {
    match a {
        Atom::Literal(Literal::Char(c)) => Some(*c),
        _ => None,
    }
}

/// Shift amounts at or beyond the word size give 0 (or the sign for
/// arithmetic right shifts) instead of wrapping around.
fn shift_amount(n: i64) -> Option<u32> {
    u32::try_from(n).ok().filter(|s| *s < 64)
}

pub struct IntOps;

impl PrimOpHandler for IntOps {
    fn family(&self) -> &'static str {
        "Int"
    }

    fn operations(&self) -> Vec<&'static str> {
        INT_OPS.to_vec()
    }

    fn evaluate(&self, state: &mut StgState, call: &PrimCall<'_>) -> Result<Option<Vec<Atom>>> {
        let (a, b) = match call.args {
            [x] => match int(x) {
                Some(a) => (a, None),
                None => return Ok(None),
            },
            [x, y] => match (int(x), int(y)) {
                (Some(a), Some(b)) => (a, Some(b)),
                _ => return Ok(None),
            },
            _ => return Ok(None),
        };
        let result = match (call.name, b) {
            ("+#", Some(b)) => Atom::int(a.wrapping_add(b)),
            ("-#", Some(b)) => Atom::int(a.wrapping_sub(b)),
            ("*#", Some(b)) => Atom::int(a.wrapping_mul(b)),
            ("quotInt#" | "remInt#", Some(0)) => {
                return Err(shape_error(state, call, "division by zero"))
            }
            ("quotInt#", Some(b)) => Atom::int(a.wrapping_div(b)),
            ("remInt#", Some(b)) => Atom::int(a.wrapping_rem(b)),
            ("negateInt#", None) => Atom::int(a.wrapping_neg()),
            ("==#", Some(b)) => Atom::from_bool(a == b),
            ("/=#", Some(b)) => Atom::from_bool(a != b),
            ("<#", Some(b)) => Atom::from_bool(a < b),
            ("<=#", Some(b)) => Atom::from_bool(a <= b),
            (">#", Some(b)) => Atom::from_bool(a > b),
            (">=#", Some(b)) => Atom::from_bool(a >= b),
            ("andI#", Some(b)) => Atom::int(a & b),
            ("orI#", Some(b)) => Atom::int(a | b),
            ("xorI#", Some(b)) => Atom::int(a ^ b),
            ("notI#", None) => Atom::int(!a),
            ("uncheckedIShiftL#", Some(b)) => {
                Atom::int(shift_amount(b).map_or(0, |s| a.wrapping_shl(s)))
            }
            ("uncheckedIShiftRA#", Some(b)) => Atom::int(a >> shift_amount(b).unwrap_or(63)),
            ("uncheckedIShiftRL#", Some(b)) => {
                Atom::int(shift_amount(b).map_or(0, |s| ((a as u64) >> s) as i64))
            }
            ("int2Word#", None) => Atom::word(a as u64),
            ("int2Float#", None) => Atom::Float(a as f32),
            ("int2Double#", None) => Atom::Double(a as f64),
            ("chr#", None) => match u32::try_from(a).ok().and_then(char::from_u32) {
                Some(c) => Atom::Literal(Literal::Char(c)),
                None => {
                    let reason = format!("{} is not a code point", a);
                    return Err(shape_error(state, call, reason));
                }
            },
            _ => return Ok(None),
        };
        Ok(Some(vec![result]))
    }
}

pub struct WordOps;

impl PrimOpHandler for WordOps {
    fn family(&self) -> &'static str {
        "Word"
    }

    fn operations(&self) -> Vec<&'static str> {
        WORD_OPS.to_vec()
    }

    fn evaluate(&self, state: &mut StgState, call: &PrimCall<'_>) -> Result<Option<Vec<Atom>>> {
        let result = match (call.name, call.args) {
            ("word2Int#", [x]) => word(x).map(|a| Atom::int(a as i64)),
            ("word2Double#", [x]) => word(x).map(|a| Atom::Double(a as f64)),
            ("not#", [x]) => word(x).map(|a| Atom::word(!a)),
            ("uncheckedShiftL#" | "uncheckedShiftRL#", [x, y]) => match (word(x), int(y)) {
                (Some(a), Some(s)) => {
                    let shifted = shift_amount(s).map_or(0, |s| {
                        if call.name == "uncheckedShiftL#" {
                            a << s
                        } else {
                            a >> s
                        }
                    });
                    Some(Atom::word(shifted))
                }
                _ => None,
            },
            (name, [x, y]) => match (word(x), word(y)) {
                (Some(_), Some(0)) if name == "quotWord#" || name == "remWord#" => {
                    return Err(shape_error(state, call, "division by zero"))
                }
                (Some(a), Some(b)) => match name {
                    "plusWord#" => Some(Atom::word(a.wrapping_add(b))),
                    "minusWord#" => Some(Atom::word(a.wrapping_sub(b))),
                    "timesWord#" => Some(Atom::word(a.wrapping_mul(b))),
                    "quotWord#" => Some(Atom::word(a / b)),
                    "remWord#" => Some(Atom::word(a % b)),
                    "and#" => Some(Atom::word(a & b)),
                    "or#" => Some(Atom::word(a | b)),
                    "xor#" => Some(Atom::word(a ^ b)),
                    "eqWord#" => Some(Atom::from_bool(a == b)),
                    "neWord#" => Some(Atom::from_bool(a != b)),
                    "ltWord#" => Some(Atom::from_bool(a < b)),
                    "leWord#" => Some(Atom::from_bool(a <= b)),
                    "gtWord#" => Some(Atom::from_bool(a > b)),
                    "geWord#" => Some(Atom::from_bool(a >= b)),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        };
        Ok(result.map(|atom| vec![atom]))
    }
}

pub struct CharOps;

impl PrimOpHandler for CharOps {
    fn family(&self) -> &'static str {
        "Char"
    }

    fn operations(&self) -> Vec<&'static str> {
        CHAR_OPS.to_vec()
    }

    fn evaluate(&self, _state: &mut StgState, call: &PrimCall<'_>) -> Result<Option<Vec<Atom>>> {
        let result = match (call.name, call.args) {
            ("ord#", [x]) => chr(x).map(|c| Atom::int(c as i64)),
            (name, [x, y]) => match (chr(x), chr(y)) {
                (Some(a), Some(b)) => match name {
                    "eqChar#" => Some(Atom::from_bool(a == b)),
                    "neChar#" => Some(Atom::from_bool(a != b)),
                    "ltChar#" => Some(Atom::from_bool(a < b)),
                    "leChar#" => Some(Atom::from_bool(a <= b)),
                    "gtChar#" => Some(Atom::from_bool(a > b)),
                    "geChar#" => Some(Atom::from_bool(a >= b)),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        };
        Ok(result.map(|atom| vec![atom]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use stg_core::syntax::{PrimRep, ResultType};

    static INT: ResultType = ResultType::Single(PrimRep::Int);

    fn run(handler: &dyn PrimOpHandler, name: &str, args: &[Atom]) -> Result<Option<Vec<Atom>>> {
        let mut st = StgState::new();
        let call = PrimCall {
            name,
            args,
            result_type: &INT,
            result_tycon: None,
        };
        handler.evaluate(&mut st, &call)
    }

    #[test]
    fn test_int_arithmetic_wraps() {
        let r = run(&IntOps, "+#", &[Atom::int(i64::MAX), Atom::int(1)]).unwrap();
        assert_eq!(r, Some(vec![Atom::int(i64::MIN)]));
        let r = run(&IntOps, "quotInt#", &[Atom::int(-7), Atom::int(2)]).unwrap();
        assert_eq!(r, Some(vec![Atom::int(-3)]));
        let r = run(&IntOps, "remInt#", &[Atom::int(-7), Atom::int(2)]).unwrap();
        assert_eq!(r, Some(vec![Atom::int(-1)]));
    }

    #[test]
    fn test_int_division_by_zero() {
        let err = run(&IntOps, "quotInt#", &[Atom::int(1), Atom::int(0)]).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::PrimOpShape { .. }));
    }

    #[test]
    fn test_int_comparison_and_conversion() {
        assert_eq!(
            run(&IntOps, "<=#", &[Atom::int(2), Atom::int(2)]).unwrap(),
            Some(vec![Atom::int(1)])
        );
        assert_eq!(
            run(&IntOps, "int2Double#", &[Atom::int(3)]).unwrap(),
            Some(vec![Atom::Double(3.0)])
        );
        assert_eq!(
            run(&IntOps, "chr#", &[Atom::int(65)]).unwrap(),
            Some(vec![Atom::Literal(Literal::Char('A'))])
        );
    }

    #[test]
    fn test_oversized_shifts() {
        let args = [Atom::int(1), Atom::int(64)];
        assert_eq!(
            run(&IntOps, "uncheckedIShiftL#", &args).unwrap(),
            Some(vec![Atom::int(0)])
        );
        let args = [Atom::int(-8), Atom::int(100)];
        assert_eq!(
            run(&IntOps, "uncheckedIShiftRA#", &args).unwrap(),
            Some(vec![Atom::int(-1)])
        );
    }

    #[test]
    fn test_word_ops() {
        assert_eq!(
            run(&WordOps, "minusWord#", &[Atom::word(0), Atom::word(1)]).unwrap(),
            Some(vec![Atom::word(u64::MAX)])
        );
        assert_eq!(
            run(&WordOps, "uncheckedShiftL#", &[Atom::word(1), Atom::int(4)]).unwrap(),
            Some(vec![Atom::word(16)])
        );
    }

    #[test]
    fn test_char_ops() {
        let a = Atom::Literal(Literal::Char('a'));
        let b = Atom::Literal(Literal::Char('b'));
        assert_eq!(
            run(&CharOps, "ltChar#", &[a.clone(), b]).unwrap(),
            Some(vec![Atom::int(1)])
        );
        assert_eq!(
            run(&CharOps, "ord#", &[a]).unwrap(),
            Some(vec![Atom::int(97)])
        );
    }

    #[test]
    fn test_mismatched_shapes_are_declined() {
        assert_eq!(
            run(&IntOps, "+#", &[Atom::word(1), Atom::int(1)]).unwrap(),
            None
        );
        assert_eq!(
            run(&IntOps, "negateInt#", &[Atom::int(1), Atom::int(1)]).unwrap(),
            None
        );
    }
}
