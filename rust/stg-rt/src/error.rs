//! Runtime errors.
//!
//! Every error is fatal at this layer. An [`StgError`] pairs the kind of
//! failure with the evaluation stack of binder ids that was in progress when
//! it was raised; that trace is the only debugging aid the machine offers.

use stg_core::{Addr, Id};
use strum::{Display, EnumIter};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StgError>;

/// The auxiliary object spaces addressed by integer handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum HandleKind {
    MVar,
    Array,
    MutableArray,
    SmallArray,
    SmallMutableArray,
    MutVar,
    ByteArray,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    #[error("unbound variable: {0:?}")]
    UnboundVariable(Id),
    #[error("unknown heap address: {0}")]
    UnknownAddress(Addr),
    #[error("expected a constructor at {addr}, found a {found}")]
    NotAConstructor { addr: Addr, found: &'static str },
    #[error("expected a function, found {0}")]
    NotAFunction(String),
    #[error("unknown {kind} handle: {handle}")]
    UnknownHandle { kind: HandleKind, handle: usize },
    #[error("non-exhaustive match on {binder:?}: no alternative for {scrutinee}")]
    NonExhaustiveMatch { binder: Id, scrutinee: String },
    #[error("unknown primitive operation: {name} with {arity} argument(s)")]
    UnknownPrimOp { name: String, arity: usize },
    #[error("blackhole entered at {0}: evaluation cycle")]
    BlackholeEntered(Addr),
    #[error("update of {target} with a non-heap result: {found}")]
    InvalidUpdate { target: Addr, found: String },
    #[error("control stack overflow: depth exceeded {0}")]
    StackOverflow(usize),
    #[error("step limit exceeded: {0}")]
    StepLimitExceeded(u64),
    #[error("primitive operation {0} is claimed twice")]
    DuplicatePrimOp(String),
    #[error("primitive operation {name}: {reason}")]
    PrimOpShape { name: String, reason: String },
    #[error("{op} on MVar {handle} would block")]
    WouldBlock { op: String, handle: usize },
    #[error("no program loaded")]
    NoProgramLoaded,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}{}", render_eval_stack(.eval_stack))]
pub struct StgError {
    pub kind: ErrorKind,
    pub eval_stack: Vec<Id>,
}

impl StgError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            eval_stack: Vec::new(),
        }
    }

    /// Attach an evaluation stack. An error that already carries one keeps
    /// it: the innermost capture is the informative one.
    pub fn with_eval_stack(mut self, ids: Vec<Id>) -> Self {
        if self.eval_stack.is_empty() {
            self.eval_stack = ids;
        }
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl From<ErrorKind> for StgError {
    fn from(kind: ErrorKind) -> Self {
        StgError::new(kind)
    }
}

fn render_eval_stack(ids: &[Id]) -> String {
    if ids.is_empty() {
        return String::new();
    }
    let mut msg = String::from("\nEvaluation stack (innermost last):");
    for (i, id) in ids.iter().enumerate() {
        msg.push_str(&format!("\n  #{}: {:?}", i, id));
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_display_includes_eval_stack() {
        let err = StgError::new(ErrorKind::UnknownAddress(Addr(9)))
            .with_eval_stack(vec![Id::local("main", 1), Id::local("go", 2)]);
        let text = err.to_string();
        assert!(text.starts_with("unknown heap address: @9"));
        assert!(text.contains("#0: main_1"));
        assert!(text.contains("#1: go_2"));
    }

    #[test]
    fn test_innermost_stack_is_kept() {
        let err = StgError::new(ErrorKind::StackOverflow(3))
            .with_eval_stack(vec![Id::local("inner", 1)])
            .with_eval_stack(vec![Id::local("outer", 2)]);
        assert_eq!(err.eval_stack, vec![Id::local("inner", 1)]);
    }

    #[test]
    fn test_handle_kinds_are_named() {
        let names: Vec<String> = HandleKind::iter().map(|k| k.to_string()).collect();
        assert_eq!(names.len(), 7);
        assert!(names.contains(&"SmallMutableArray".to_string()));
        let err = ErrorKind::UnknownHandle {
            kind: HandleKind::MVar,
            handle: 3,
        };
        assert_eq!(err.to_string(), "unknown MVar handle: 3");
    }
}
