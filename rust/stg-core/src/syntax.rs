//! The A-normal-form intermediate representation executed by the machine.
//!
//! Arguments are always atoms (variables or literals); only `Let` allocates,
//! only `Case` evaluates. Sub-expressions are reference counted so that the
//! machine can keep pending alternatives and closure bodies on its control
//! stack without copying them.

use crate::ids::Id;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Lit {
    Int(i64),
    Word(u64),
    Char(char),
    Float(f32),
    Double(f64),
    NullAddr,
    /// A C-style string literal (bytes, no implicit terminator).
    String(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Arg {
    Var(Id),
    Lit(Lit),
}

/// A data constructor. Constructors are matched by name; `tag` is the
/// constructor's 0-based position in its type, used by `dataToTag#`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataCon {
    pub name: Rc<str>,
    pub tag: u32,
    pub arity: usize,
}

impl PartialEq for DataCon {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for DataCon {}

impl fmt::Display for DataCon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TyCon {
    pub name: Rc<str>,
    pub data_cons: Vec<DataCon>,
}

impl TyCon {
    pub fn con_by_tag(&self, tag: u32) -> Option<&DataCon> {
        self.data_cons.iter().find(|dc| dc.tag == tag)
    }
}

/// Machine representation of an unboxed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimRep {
    Void,
    Lifted,
    Unlifted,
    Int,
    Word,
    Char,
    Addr,
    Float,
    Double,
}

/// Declared result shape of a primitive operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultType {
    Single(PrimRep),
    UnboxedTuple(Vec<PrimRep>),
    Poly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AltType {
    /// Scrutinee of unknown (polymorphic) type; only a default alternative.
    Poly,
    /// Unboxed tuple of the given arity.
    MultiVal(usize),
    Prim(PrimRep),
    Alg(TyCon),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AltCon {
    Data(DataCon),
    Lit(Lit),
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alt {
    pub con: AltCon,
    pub binders: Vec<Id>,
    pub rhs: Rc<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    App { fun: Id, args: Vec<Arg> },
    Lit(Lit),
    ConApp { con: DataCon, args: Vec<Arg> },
    /// Return several atoms at once (an unboxed tuple).
    MultiVal { args: Vec<Arg> },
    OpApp {
        op: String,
        args: Vec<Arg>,
        result_type: ResultType,
        result_tycon: Option<TyCon>,
    },
    Case {
        scrutinee: Rc<Expr>,
        binder: Id,
        alt_type: AltType,
        alts: Rc<[Alt]>,
    },
    Let { binding: Binding, body: Rc<Expr> },
}

/// The code and parameters of a closure, shared by every heap closure
/// allocated from the same right-hand side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lambda {
    pub params: Vec<Id>,
    pub body: Rc<Expr>,
}

impl Lambda {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Rhs {
    Closure {
        /// Variables free in `lambda`, excluding top-level binders.
        free_vars: Vec<Id>,
        lambda: Rc<Lambda>,
    },
    Con { con: DataCon, args: Vec<Arg> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Binding {
    NonRec(Id, Rhs),
    Rec(Vec<(Id, Rhs)>),
}

impl Binding {
    pub fn binders(&self) -> Vec<&Id> {
        match self {
            Binding::NonRec(id, _) => vec![id],
            Binding::Rec(pairs) => pairs.iter().map(|(id, _)| id).collect(),
        }
    }
}

/// A whole program: top-level bindings plus the binder to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub bindings: Vec<Binding>,
    pub entry: Id,
}

#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    #[error("malformed program: {0}")]
    Json(#[from] serde_json::Error),
    #[error("entry binder {0} is not bound at top level")]
    MissingEntry(String),
}

impl Program {
    /// Decode a program from its JSON serialization and check that the
    /// entry binder is defined.
    pub fn from_json(text: &str) -> Result<Self, ProgramError> {
        let program: Program = serde_json::from_str(text)?;
        let defined = program
            .bindings
            .iter()
            .flat_map(|b| b.binders())
            .any(|id| *id == program.entry);
        if !defined {
            return Err(ProgramError::MissingEntry(program.entry.key.to_string()));
        }
        Ok(program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{con_rhs, data_con, int, top};

    fn unit_program(entry: &str) -> Program {
        let box_con = data_con("I#", 0, 1);
        Program {
            bindings: vec![top("main", con_rhs(&box_con, vec![int(1)]))],
            entry: Id::new(entry, entry),
        }
    }

    #[test]
    fn test_json_program_loads() {
        let text = serde_json::to_string(&unit_program("main")).unwrap();
        let program = Program::from_json(&text).unwrap();
        assert_eq!(program, unit_program("main"));
    }

    #[test]
    fn test_entry_must_be_bound() {
        let text = serde_json::to_string(&unit_program("nope")).unwrap();
        let err = Program::from_json(&text).unwrap_err();
        assert!(matches!(
            err,
            ProgramError::MissingEntry(ref key) if key == "nope"
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            Program::from_json("{\"bindings\": 3}"),
            Err(ProgramError::Json(_))
        ));
    }
}
