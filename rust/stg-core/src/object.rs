//! Heap-resident objects.

use crate::atom::Atom;
use crate::env::Env;
use crate::ids::Id;
use crate::syntax::{DataCon, Lambda};
use std::fmt;
use std::rc::Rc;

/// A closure in one of its three runtime shapes, told apart only by
/// `missing`, the number of arguments still needed:
///
/// - `missing == 0`: a thunk, forced by entering it;
/// - `missing == lambda.arity()` with no supplied args: a function value;
/// - anything in between: a partial application.
#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
    pub name: Id,
    pub lambda: Rc<Lambda>,
    /// Free variables of `lambda` and nothing else.
    pub env: Env,
    pub args: Vec<Atom>,
    pub missing: usize,
}

impl Closure {
    pub fn new(name: Id, lambda: Rc<Lambda>, env: Env) -> Self {
        let missing = lambda.arity();
        Self {
            name,
            lambda,
            env,
            args: Vec::new(),
            missing,
        }
    }

    pub fn is_thunk(&self) -> bool {
        self.missing == 0
    }

    pub fn is_function(&self) -> bool {
        self.missing > 0 && self.args.is_empty()
    }

    pub fn is_partial_application(&self) -> bool {
        self.missing > 0 && !self.args.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HeapObject {
    /// A saturated data constructor.
    Con { con: DataCon, args: Vec<Atom> },
    Closure(Closure),
    /// Placed over a thunk while it is being forced. Keeps the replaced
    /// object for inspection; it is never re-entered.
    Blackhole(Box<HeapObject>),
}

impl HeapObject {
    pub fn describe(&self) -> &'static str {
        match self {
            HeapObject::Con { .. } => "constructor",
            HeapObject::Closure(c) if c.is_thunk() => "thunk",
            HeapObject::Closure(c) if c.is_function() => "function",
            HeapObject::Closure(_) => "partial application",
            HeapObject::Blackhole(_) => "blackhole",
        }
    }

    pub fn as_closure(&self) -> Option<&Closure> {
        match self {
            HeapObject::Closure(c) => Some(c),
            _ => None,
        }
    }
}

impl fmt::Display for HeapObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeapObject::Con { con, args } if args.is_empty() => write!(f, "{}", con),
            HeapObject::Con { con, args } => {
                write!(f, "{}", con)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                Ok(())
            }
            HeapObject::Closure(c) => write!(
                f,
                "<{} {} {}/{}>",
                self.describe(),
                c.name,
                c.args.len(),
                c.args.len() + c.missing
            ),
            HeapObject::Blackhole(prev) => write!(f, "<blackhole over {}>", prev.describe()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{id, lit_int};

    fn lambda(arity: usize) -> Rc<Lambda> {
        Rc::new(Lambda {
            params: (0..arity).map(|i| Id::local("p", i as u64)).collect(),
            body: lit_int(0),
        })
    }

    #[test]
    fn test_shapes_from_missing_count() {
        let thunk = Closure::new(id("t"), lambda(0), Env::new());
        assert!(thunk.is_thunk());

        let fun = Closure::new(id("f"), lambda(2), Env::new());
        assert!(fun.is_function());
        assert_eq!(fun.missing, 2);

        let pap = Closure {
            args: vec![Atom::int(1)],
            missing: 1,
            ..fun
        };
        assert!(pap.is_partial_application());
        assert_eq!(HeapObject::Closure(pap).describe(), "partial application");
    }

    #[test]
    fn test_blackhole_keeps_previous() {
        let thunk = HeapObject::Closure(Closure::new(id("t"), lambda(0), Env::new()));
        let hole = HeapObject::Blackhole(Box::new(thunk.clone()));
        assert_eq!(hole.describe(), "blackhole");
        assert_eq!(hole.to_string(), "<blackhole over thunk>");
    }
}
