//! Variable environments.
//!
//! An [`Env`] maps binder identities to atoms. The map is shared behind an
//! `Rc` and copied on write, so saving the current scope on the control
//! stack is cheap.

use crate::atom::Atom;
use crate::ids::Id;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Env {
    bindings: Rc<HashMap<Id, Atom>>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `id`, replacing any earlier binding of the same id.
    pub fn bind(&mut self, id: Id, atom: Atom) {
        Rc::make_mut(&mut self.bindings).insert(id, atom);
    }

    pub fn extend(&mut self, pairs: impl IntoIterator<Item = (Id, Atom)>) {
        let map = Rc::make_mut(&mut self.bindings);
        for (id, atom) in pairs {
            map.insert(id, atom);
        }
    }

    pub fn get(&self, id: &Id) -> Option<&Atom> {
        self.bindings.get(id)
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.bindings.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Id, &Atom)> {
        self.bindings.iter()
    }
}

impl FromIterator<(Id, Atom)> for Env {
    fn from_iter<I: IntoIterator<Item = (Id, Atom)>>(iter: I) -> Self {
        Self {
            bindings: Rc::new(iter.into_iter().collect()),
        }
    }
}
