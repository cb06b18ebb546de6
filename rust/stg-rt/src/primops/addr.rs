//! `Addr#` operations over string-literal pointers.

use super::{shape_error, PrimCall, PrimOpHandler};
use crate::error::Result;
use crate::state::StgState;
use stg_core::{Atom, Literal, StringPtr};

pub struct AddrOps;

fn offset_ptr(
    state: &StgState,
    call: &PrimCall<'_>,
    ptr: StringPtr,
    delta: i64,
) -> Result<StringPtr> {
    let offset = i64::try_from(ptr.offset)
        .ok()
        .and_then(|o| o.checked_add(delta))
        .and_then(|o| usize::try_from(o).ok());
    match offset {
        Some(offset) => Ok(StringPtr { offset, ..ptr }),
        None => {
            let reason = format!("offset {} from {} is negative", delta, ptr.offset);
            Err(shape_error(state, call, reason))
        }
    }
}

fn byte_at(state: &StgState, call: &PrimCall<'_>, ptr: StringPtr) -> Result<u8> {
    state.string_byte(ptr).ok_or_else(|| {
        shape_error(
            state,
            call,
            format!("byte {} of string literal {} is out of range", ptr.offset, ptr.id),
        )
    })
}

/// String pointers and the null address are the only `Addr#` values.
fn is_addr(atom: &Atom) -> bool {
    matches!(atom, Atom::StringPtr(_) | Atom::Literal(Literal::NullAddr))
}

impl PrimOpHandler for AddrOps {
    fn family(&self) -> &'static str {
        "Addr"
    }

    fn operations(&self) -> Vec<&'static str> {
        vec![
            "plusAddr#",
            "minusAddr#",
            "eqAddr#",
            "indexCharOffAddr#",
            "indexWord8OffAddr#",
        ]
    }

    fn evaluate(&self, state: &mut StgState, call: &PrimCall<'_>) -> Result<Option<Vec<Atom>>> {
        let result = match (call.name, call.args) {
            ("plusAddr#", [Atom::StringPtr(p), Atom::Literal(Literal::Int(n))]) => {
                Atom::StringPtr(offset_ptr(state, call, *p, *n)?)
            }
            ("minusAddr#", [Atom::StringPtr(a), Atom::StringPtr(b)]) if a.id == b.id => {
                Atom::int(a.offset as i64 - b.offset as i64)
            }
            ("eqAddr#", [a, b]) if is_addr(a) && is_addr(b) => Atom::from_bool(a == b),
            ("indexCharOffAddr#", [Atom::StringPtr(p), Atom::Literal(Literal::Int(n))]) => {
                let ptr = offset_ptr(state, call, *p, *n)?;
                Atom::Literal(Literal::Char(char::from(byte_at(state, call, ptr)?)))
            }
            ("indexWord8OffAddr#", [Atom::StringPtr(p), Atom::Literal(Literal::Int(n))]) => {
                let ptr = offset_ptr(state, call, *p, *n)?;
                Atom::word(u64::from(byte_at(state, call, ptr)?))
            }
            _ => return Ok(None),
        };
        Ok(Some(vec![result]))
    }
}
