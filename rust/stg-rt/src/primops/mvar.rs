//! `MVar#` operations.
//!
//! Only the storage side lives here. Blocking on an empty (or full) cell is
//! the scheduler's business; without one, an operation that would block is
//! a fatal `WouldBlock`.

use super::{PrimCall, PrimOpHandler};
use crate::error::{ErrorKind, Result};
use crate::state::StgState;
use stg_core::Atom;

pub struct MVarOps;

fn would_block(state: &StgState, call: &PrimCall<'_>, handle: usize) -> crate::error::StgError {
    state.error(ErrorKind::WouldBlock {
        op: call.name.to_string(),
        handle,
    })
}

impl PrimOpHandler for MVarOps {
    fn family(&self) -> &'static str {
        "MVar"
    }

    fn operations(&self) -> Vec<&'static str> {
        vec![
            "newMVar#",
            "takeMVar#",
            "putMVar#",
            "readMVar#",
            "tryTakeMVar#",
            "tryPutMVar#",
            "tryReadMVar#",
            "isEmptyMVar#",
        ]
    }

    fn evaluate(&self, state: &mut StgState, call: &PrimCall<'_>) -> Result<Option<Vec<Atom>>> {
        let result = match (call.name, call.args) {
            ("newMVar#", [Atom::Void]) => vec![Atom::MVar(state.new_mvar())],
            ("takeMVar#", [Atom::MVar(h), Atom::Void]) => match state.lookup_mvar(*h)?.clone() {
                Some(value) => {
                    state.write_mvar(*h, None)?;
                    vec![value]
                }
                None => return Err(would_block(state, call, *h)),
            },
            ("readMVar#", [Atom::MVar(h), Atom::Void]) => match state.lookup_mvar(*h)? {
                Some(value) => vec![value.clone()],
                None => return Err(would_block(state, call, *h)),
            },
            ("putMVar#", [Atom::MVar(h), value, Atom::Void]) => {
                if state.lookup_mvar(*h)?.is_some() {
                    return Err(would_block(state, call, *h));
                }
                state.write_mvar(*h, Some(value.clone()))?;
                vec![]
            }
            ("tryTakeMVar#", [Atom::MVar(h), Atom::Void]) => match state.lookup_mvar(*h)?.clone() {
                Some(value) => {
                    state.write_mvar(*h, None)?;
                    vec![Atom::int(1), value]
                }
                None => vec![Atom::int(0), Atom::Void],
            },
            ("tryReadMVar#", [Atom::MVar(h), Atom::Void]) => match state.lookup_mvar(*h)? {
                Some(value) => vec![Atom::int(1), value.clone()],
                None => vec![Atom::int(0), Atom::Void],
            },
            ("tryPutMVar#", [Atom::MVar(h), value, Atom::Void]) => {
                if state.lookup_mvar(*h)?.is_some() {
                    vec![Atom::int(0)]
                } else {
                    state.write_mvar(*h, Some(value.clone()))?;
                    vec![Atom::int(1)]
                }
            }
            ("isEmptyMVar#", [Atom::MVar(h), Atom::Void]) => {
                vec![Atom::from_bool(state.lookup_mvar(*h)?.is_none())]
            }
            _ => return Ok(None),
        };
        Ok(Some(result))
    }
}
