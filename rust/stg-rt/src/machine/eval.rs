//! Expression evaluation and allocation.

use super::{Code, Driver};
use crate::error::Result;
use crate::primops::PrimCall;
use crate::state::StgState;
use stg_core::syntax::{Arg, Binding, Expr, Lit, Rhs};
use stg_core::{Atom, Closure, Env, HeapObject, Id, Literal, StackContinuation};
use tracing::trace;

/// The atom a literal denotes. String literals are interned.
pub(crate) fn literal_atom(state: &mut StgState, lit: &Lit) -> Atom {
    match lit {
        Lit::String(bytes) => Atom::StringPtr(state.intern_string(bytes)),
        other => scalar_literal(other).unwrap_or(Atom::Void),
    }
}

/// Literals that need no state to become atoms; `None` for strings.
pub(crate) fn scalar_literal(lit: &Lit) -> Option<Atom> {
    Some(match lit {
        Lit::Int(n) => Atom::int(*n),
        Lit::Word(n) => Atom::word(*n),
        Lit::Char(c) => Atom::Literal(Literal::Char(*c)),
        Lit::Float(x) => Atom::Float(*x),
        Lit::Double(x) => Atom::Double(*x),
        Lit::NullAddr => Atom::Literal(Literal::NullAddr),
        Lit::String(_) => return None,
    })
}

pub(crate) fn arg_atom(state: &mut StgState, arg: &Arg) -> Result<Atom> {
    match arg {
        Arg::Var(id) => state.resolve(id),
        Arg::Lit(lit) => Ok(literal_atom(state, lit)),
    }
}

pub(crate) fn arg_atoms(state: &mut StgState, args: &[Arg]) -> Result<Vec<Atom>> {
    args.iter().map(|a| arg_atom(state, a)).collect()
}

pub(crate) fn binding_pairs(binding: &Binding) -> Vec<(&Id, &Rhs)> {
    match binding {
        Binding::NonRec(id, rhs) => vec![(id, rhs)],
        Binding::Rec(pairs) => pairs.iter().map(|(id, rhs)| (id, rhs)).collect(),
    }
}

/// Build the heap object for a right-hand side in the current scope.
/// A closure captures exactly its listed free variables.
pub(crate) fn build_rhs(state: &mut StgState, name: &Id, rhs: &Rhs) -> Result<HeapObject> {
    match rhs {
        Rhs::Closure { free_vars, lambda } => {
            let mut env = Env::new();
            for fv in free_vars {
                env.bind(fv.clone(), state.resolve(fv)?);
            }
            let closure = Closure::new(name.clone(), lambda.clone(), env);
            Ok(HeapObject::Closure(closure))
        }
        Rhs::Con { con, args } => Ok(HeapObject::Con {
            con: con.clone(),
            args: arg_atoms(state, args)?,
        }),
    }
}

impl Driver<'_> {
    pub(super) fn eval(&mut self, expr: &Expr) -> Result<Code> {
        match expr {
            Expr::App { fun, args } => {
                let f = self.state.resolve(fun)?;
                let args = arg_atoms(self.state, args)?;
                if !args.is_empty() {
                    self.state.push_frame(StackContinuation::Apply(args))?;
                }
                Ok(Code::Enter(f))
            }
            Expr::Lit(lit) => Ok(Code::Return(vec![literal_atom(self.state, lit)])),
            Expr::ConApp { con, args } => {
                let args = arg_atoms(self.state, args)?;
                let addr = self.state.allocate(HeapObject::Con {
                    con: con.clone(),
                    args,
                });
                Ok(Code::Return(vec![Atom::HeapPtr(addr)]))
            }
            Expr::MultiVal { args } => Ok(Code::Return(arg_atoms(self.state, args)?)),
            Expr::OpApp {
                op,
                args,
                result_type,
                result_tycon,
            } => {
                let args = arg_atoms(self.state, args)?;
                let call = PrimCall {
                    name: op,
                    args: &args,
                    result_type,
                    result_tycon: result_tycon.as_ref(),
                };
                let result = self.primops.evaluate(self.state, &call)?;
                trace!(op = op.as_str(), results = result.len(), "primop");
                Ok(Code::Return(result))
            }
            Expr::Case {
                scrutinee,
                binder,
                alt_type,
                alts,
            } => {
                self.state.push_frame(StackContinuation::CaseOf {
                    binder: binder.clone(),
                    alt_type: alt_type.clone(),
                    alts: alts.clone(),
                })?;
                self.state.push_eval(binder.clone());
                Ok(Code::Eval(scrutinee.clone()))
            }
            Expr::Let { binding, body } => {
                self.allocate_binding(binding)?;
                Ok(Code::Eval(body.clone()))
            }
        }
    }

    /// Allocate a local binding and bind its names in the current scope.
    /// Recursive groups get their addresses before any closure is built,
    /// so every member can capture every other.
    fn allocate_binding(&mut self, binding: &Binding) -> Result<()> {
        match binding {
            Binding::NonRec(id, rhs) => {
                let object = build_rhs(self.state, id, rhs)?;
                let addr = self.state.allocate(object);
                self.state.bind(id.clone(), Atom::HeapPtr(addr));
            }
            Binding::Rec(pairs) => {
                let addrs: Vec<_> = pairs
                    .iter()
                    .map(|(id, _)| {
                        let addr = self.state.reserve();
                        self.state.bind(id.clone(), Atom::HeapPtr(addr));
                        addr
                    })
                    .collect();
                for ((id, rhs), addr) in pairs.iter().zip(addrs) {
                    let object = build_rhs(self.state, id, rhs)?;
                    self.state.store(addr, object)?;
                }
            }
        }
        Ok(())
    }
}
