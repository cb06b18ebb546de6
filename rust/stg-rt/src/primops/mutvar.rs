//! `MutVar#` operations.

use super::{PrimCall, PrimOpHandler};
use crate::error::Result;
use crate::state::StgState;
use stg_core::Atom;

pub struct MutVarOps;

impl PrimOpHandler for MutVarOps {
    fn family(&self) -> &'static str {
        "MutVar"
    }

    fn operations(&self) -> Vec<&'static str> {
        vec![
            "newMutVar#",
            "readMutVar#",
            "writeMutVar#",
            "atomicWriteMutVar#",
        ]
    }

    fn evaluate(&self, state: &mut StgState, call: &PrimCall<'_>) -> Result<Option<Vec<Atom>>> {
        match (call.name, call.args) {
            ("newMutVar#", [value, Atom::Void]) => {
                let h = state.new_mut_var(value.clone());
                Ok(Some(vec![Atom::MutVar(h)]))
            }
            ("readMutVar#", [Atom::MutVar(h), Atom::Void]) => {
                Ok(Some(vec![state.lookup_mut_var(*h)?.clone()]))
            }
            ("writeMutVar#" | "atomicWriteMutVar#", [Atom::MutVar(h), value, Atom::Void]) => {
                state.write_mut_var(*h, value.clone())?;
                Ok(Some(vec![]))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, HandleKind};
    use stg_core::syntax::{PrimRep, ResultType};
    use stg_core::Addr;

    static LIFTED: ResultType = ResultType::Single(PrimRep::Lifted);

    fn run(st: &mut StgState, name: &str, args: &[Atom]) -> Result<Option<Vec<Atom>>> {
        let call = PrimCall {
            name,
            args,
            result_type: &LIFTED,
            result_tycon: None,
        };
        MutVarOps.evaluate(st, &call)
    }

    #[test]
    fn test_new_read_write() {
        let mut st = StgState::new();
        let mv = run(&mut st, "newMutVar#", &[Atom::HeapPtr(Addr(1)), Atom::Void])
            .unwrap()
            .unwrap();
        assert_eq!(mv, vec![Atom::MutVar(0)]);

        let args = [Atom::MutVar(0), Atom::HeapPtr(Addr(2)), Atom::Void];
        let out = run(&mut st, "writeMutVar#", &args).unwrap();
        assert_eq!(out, Some(vec![]));

        let out = run(&mut st, "readMutVar#", &[Atom::MutVar(0), Atom::Void]).unwrap();
        assert_eq!(out, Some(vec![Atom::HeapPtr(Addr(2))]));
    }

    #[test]
    fn test_unknown_mutvar() {
        let mut st = StgState::new();
        let err = run(&mut st, "readMutVar#", &[Atom::MutVar(4), Atom::Void]).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::UnknownHandle {
                kind: HandleKind::MutVar,
                handle: 4
            }
        );
    }
}
