//! Constructor tags: `dataToTag#` and `tagToEnum#`.

use super::{shape_error, PrimCall, PrimOpHandler};
use crate::error::Result;
use crate::state::StgState;
use stg_core::{Atom, HeapObject, Literal};

pub struct TagOps;

impl PrimOpHandler for TagOps {
    fn family(&self) -> &'static str {
        "Tags"
    }

    fn operations(&self) -> Vec<&'static str> {
        vec!["dataToTag#", "tagToEnum#"]
    }

    fn evaluate(&self, state: &mut StgState, call: &PrimCall<'_>) -> Result<Option<Vec<Atom>>> {
        match (call.name, call.args) {
            ("dataToTag#", [Atom::HeapPtr(addr)]) => {
                let (con, _) = state.read_con(*addr)?;
                Ok(Some(vec![Atom::int(i64::from(con.tag))]))
            }
            ("tagToEnum#", [Atom::Literal(Literal::Int(tag))]) => {
                let Some(tycon) = call.result_tycon else {
                    return Err(shape_error(state, call, "result type constructor unknown"));
                };
                let con = u32::try_from(*tag)
                    .ok()
                    .and_then(|t| tycon.con_by_tag(t))
                    .filter(|con| con.arity == 0)
                    .cloned()
                    .ok_or_else(|| {
                        shape_error(
                            state,
                            call,
                            format!("{} has no nullary constructor with tag {}", tycon.name, tag),
                        )
                    })?;
                let addr = state.allocate(HeapObject::Con { con, args: vec![] });
                Ok(Some(vec![Atom::HeapPtr(addr)]))
            }
            _ => Ok(None),
        }
    }
}
