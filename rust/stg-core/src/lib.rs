//! STG Core
//!
//! Shared data model for the graph-reduction machine: binder identities,
//! atoms, the intermediate representation, heap objects, environments and
//! control-stack continuations.

pub mod atom;
pub mod builder;
pub mod env;
pub mod ids;
pub mod object;
pub mod stack;
pub mod strings;
pub mod syntax;

pub use atom::{Addr, Atom, Literal, StringPtr};
pub use env::Env;
pub use ids::Id;
pub use object::{Closure, HeapObject};
pub use stack::{Frame, StackContinuation};
