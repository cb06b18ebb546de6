//! Binder identities.
//!
//! An [`Id`] names a bound variable. Two ids denote the same variable exactly
//! when their globally unique keys are equal; the display name is carried for
//! diagnostics only and never takes part in comparison.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Unique key of the realworld-state token.
pub const REAL_WORLD_KEY: &str = "ghc-prim_GHC.Prim.realWorld#";
/// Unique key of the explicit "no value" token.
pub const VOID_KEY: &str = "ghc-prim_GHC.Prim.void#";

#[derive(Clone, Serialize, Deserialize)]
pub struct Id {
    /// Source-level name, e.g. `go`.
    pub name: Rc<str>,
    /// Globally unique key, e.g. `main_Main.go_r1b3`.
    pub key: Rc<str>,
}

impl Id {
    pub fn new(name: impl Into<Rc<str>>, key: impl Into<Rc<str>>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
        }
    }

    /// An id whose key is derived from its name and a program-wide unique
    /// number. Handy for generated code and tests.
    pub fn local(name: &str, unique: u64) -> Self {
        Self::new(name, format!("{}_{}", name, unique))
    }

    pub fn real_world() -> Self {
        Self::new("realWorld#", REAL_WORLD_KEY)
    }

    pub fn void() -> Self {
        Self::new("void#", VOID_KEY)
    }

    /// Compiler-inserted zero-information tokens that always resolve to
    /// [`crate::atom::Atom::Void`].
    pub fn is_void_sentinel(&self) -> bool {
        &*self.key == REAL_WORLD_KEY || &*self.key == VOID_KEY
    }
}

impl PartialEq for Id {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.key, &other.key) || self.key == other.key
    }
}

impl Eq for Id {}

impl Hash for Id {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for Id {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Id {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
