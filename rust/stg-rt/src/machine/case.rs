//! Case alternative selection.

use super::eval::scalar_literal;
use super::{Code, Driver};
use crate::error::{ErrorKind, Result};
use stg_core::syntax::{Alt, AltCon, AltType, DataCon};
use stg_core::{Atom, Id};

impl Driver<'_> {
    /// Bind the scrutinee's value and pick the first alternative that
    /// matches it. A default alternative matches anything; for an unboxed
    /// tuple its binders take the returned atoms in order.
    pub(super) fn select_alternative(
        &mut self,
        binder: &Id,
        alt_type: &AltType,
        alts: &[Alt],
        atoms: Vec<Atom>,
    ) -> Result<Code> {
        if let [value] = atoms.as_slice() {
            self.state.bind(binder.clone(), value.clone());
        }

        let needs_con = alts.iter().any(|alt| matches!(alt.con, AltCon::Data(_)));
        let scrutinee: Option<(DataCon, Vec<Atom>)> = match atoms.as_slice() {
            [Atom::HeapPtr(addr)] if needs_con => {
                let (con, fields) = self.state.read_con(*addr)?;
                Some((con.clone(), fields.to_vec()))
            }
            _ => None,
        };

        for alt in alts {
            let fields = match &alt.con {
                AltCon::Default if matches!(alt_type, AltType::MultiVal(_)) => Some(atoms.clone()),
                AltCon::Default => Some(Vec::new()),
                AltCon::Data(con) => match &scrutinee {
                    Some((found, fields)) if found == con => Some(fields.clone()),
                    _ => None,
                },
                AltCon::Lit(lit) => match (atoms.as_slice(), scalar_literal(lit)) {
                    ([value], Some(expected)) if *value == expected => Some(Vec::new()),
                    _ => None,
                },
            };
            if let Some(fields) = fields {
                for (id, atom) in alt.binders.iter().zip(fields) {
                    self.state.bind(id.clone(), atom);
                }
                return Ok(Code::Eval(alt.rhs.clone()));
            }
        }

        let shown = match &scrutinee {
            Some((con, _)) => con.to_string(),
            None => atoms
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        };
        Err(self.state.error(ErrorKind::NonExhaustiveMatch {
            binder: binder.clone(),
            scrutinee: shown,
        }))
    }
}
