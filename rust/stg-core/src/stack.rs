//! Control-stack continuations.

use crate::atom::{Addr, Atom};
use crate::env::Env;
use crate::ids::Id;
use crate::syntax::{Alt, AltType};
use std::fmt;
use std::rc::Rc;

/// Pending work to resume once the current evaluation yields a value.
#[derive(Debug, Clone)]
pub enum StackContinuation {
    /// Match the result against `alts`, binding it to `binder` first.
    CaseOf {
        binder: Id,
        alt_type: AltType,
        alts: Rc<[Alt]>,
    },
    /// Overwrite the target with the result's heap object.
    Update(Addr),
    /// Apply the resulting function to these arguments.
    Apply(Vec<Atom>),
}

impl StackContinuation {
    pub fn name(&self) -> &'static str {
        match self {
            StackContinuation::CaseOf { .. } => "CaseOf",
            StackContinuation::Update(_) => "Update",
            StackContinuation::Apply(_) => "Apply",
        }
    }
}

impl fmt::Display for StackContinuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackContinuation::CaseOf { binder, alts, .. } => {
                write!(f, "CaseOf {} ({} alts)", binder, alts.len())
            }
            StackContinuation::Update(addr) => write!(f, "Update {}", addr),
            StackContinuation::Apply(args) => write!(f, "Apply {} args", args.len()),
        }
    }
}

/// A continuation together with the scope that was active when it was
/// pushed; resuming it restores that scope.
#[derive(Debug, Clone)]
pub struct Frame {
    pub cont: StackContinuation,
    pub env: Env,
    pub eval_stack: Vec<Id>,
}
