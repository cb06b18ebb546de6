//! Thread, weak-pointer and stable-pointer handles.
//!
//! There is no scheduler here: `myThreadId#` reports whatever thread the
//! state says is current, and weak pointers never lose their target.

use super::{PrimCall, PrimOpHandler};
use crate::error::Result;
use crate::state::StgState;
use stg_core::Atom;

pub struct ConcurrencyOps;

impl PrimOpHandler for ConcurrencyOps {
    fn family(&self) -> &'static str {
        "Concurrency"
    }

    fn operations(&self) -> Vec<&'static str> {
        vec![
            "myThreadId#",
            "mkWeakNoFinalizer#",
            "noDuplicate#",
            "makeStablePtr#",
            "deRefStablePtr#",
        ]
    }

    fn evaluate(&self, state: &mut StgState, call: &PrimCall<'_>) -> Result<Option<Vec<Atom>>> {
        let result = match (call.name, call.args) {
            ("myThreadId#", [Atom::Void]) => vec![Atom::ThreadId(state.current_thread())],
            ("mkWeakNoFinalizer#", [_key, _value, Atom::Void]) => {
                vec![Atom::WeakPointer(state.new_weak_pointer())]
            }
            ("noDuplicate#", [Atom::Void]) => vec![],
            ("makeStablePtr#", [value, Atom::Void]) => {
                vec![Atom::StablePointer(Box::new(value.clone()))]
            }
            ("deRefStablePtr#", [Atom::StablePointer(inner), Atom::Void]) => {
                vec![(**inner).clone()]
            }
            _ => return Ok(None),
        };
        Ok(Some(result))
    }
}
