//! Primitive-operation dispatch.
//!
//! Each operation family implements [`PrimOpHandler`] and claims a set of
//! operation names. [`PrimOpChain`] routes a call to the one handler that
//! claims its name; when no handler claims it, or the claiming handler does
//! not accept the argument shapes, the call falls through to a fallback,
//! by default one that fails with `UnknownPrimOp`. A handler answers
//! `Ok(None)` for "not mine", which keeps "no handler matched" distinct from
//! "matched and computed".

mod addr;
mod array;
mod bytearray;
mod concurrency;
mod float;
mod int;
mod mutvar;
mod mvar;
mod tags;

pub use addr::AddrOps;
pub use array::ArrayOps;
pub use bytearray::ByteArrayOps;
pub use concurrency::ConcurrencyOps;
pub use float::{FloatOps, UNIMPLEMENTED_DOUBLE_OPS, UNIMPLEMENTED_FLOAT_OPS};
pub use int::{CharOps, IntOps, WordOps};
pub use mutvar::MutVarOps;
pub use mvar::MVarOps;
pub use tags::TagOps;

use crate::error::{ErrorKind, Result, StgError};
use crate::state::StgState;
use std::collections::HashMap;
use std::fmt;
use stg_core::syntax::{ResultType, TyCon};
use stg_core::Atom;
use tracing::{debug, warn};

/// One primitive-operation call: the operation's name, its already
/// evaluated arguments and its declared result shape.
#[derive(Debug, Clone, Copy)]
pub struct PrimCall<'a> {
    pub name: &'a str,
    pub args: &'a [Atom],
    pub result_type: &'a ResultType,
    pub result_tycon: Option<&'a TyCon>,
}

pub trait PrimOpHandler {
    /// Family name, for diagnostics.
    fn family(&self) -> &'static str;

    /// Every operation name this handler claims.
    fn operations(&self) -> Vec<&'static str>;

    /// Compute the result atoms, or `Ok(None)` when the arguments are not a
    /// shape this handler accepts.
    fn evaluate(&self, state: &mut StgState, call: &PrimCall<'_>) -> Result<Option<Vec<Atom>>>;
}

/// The terminal fallback: nothing matched.
pub fn unknown_primop(state: &mut StgState, call: &PrimCall<'_>) -> Result<Vec<Atom>> {
    Err(state.error(ErrorKind::UnknownPrimOp {
        name: call.name.to_string(),
        arity: call.args.len(),
    }))
}

/// Fail with a shape error for an operation whose name is unambiguous but
/// whose arguments are out of range.
pub(crate) fn shape_error(
    state: &StgState,
    call: &PrimCall<'_>,
    reason: impl Into<String>,
) -> StgError {
    state.error(ErrorKind::PrimOpShape {
        name: call.name.to_string(),
        reason: reason.into(),
    })
}

/// Checked conversion of an `Int#` index or size.
pub(crate) fn to_index(state: &StgState, call: &PrimCall<'_>, n: i64) -> Result<usize> {
    usize::try_from(n)
        .map_err(|_| shape_error(state, call, format!("negative index or size {}", n)))
}

/// `len` copies of `value`. A length the host cannot allocate is a shape
/// error rather than an abort.
pub(crate) fn filled<T: Clone>(
    state: &StgState,
    call: &PrimCall<'_>,
    value: T,
    len: usize,
) -> Result<Vec<T>> {
    let mut out = Vec::new();
    if out.try_reserve_exact(len).is_err() {
        let reason = format!("cannot allocate {} elements", len);
        return Err(shape_error(state, call, reason));
    }
    out.resize(len, value);
    Ok(out)
}

#[derive(Default)]
pub struct PrimOpChain {
    handlers: Vec<Box<dyn PrimOpHandler>>,
    by_name: HashMap<&'static str, usize>,
}

impl fmt::Debug for PrimOpChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimOpChain")
            .field(
                "families",
                &self.handlers.iter().map(|h| h.family()).collect::<Vec<_>>(),
            )
            .field("operations", &self.by_name.len())
            .finish()
    }
}

impl PrimOpChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every family this crate provides.
    pub fn standard() -> Self {
        let mut chain = Self::new();
        for handler in standard_handlers() {
            let family = handler.family();
            let registered = chain.register(handler);
            debug_assert!(registered.is_ok(), "{} overlaps: {:?}", family, registered);
            if let Err(err) = registered {
                warn!(family, %err, "primitive-operation family not registered");
            }
        }
        chain
    }

    /// Add a handler. Refuses a handler that claims a name another handler
    /// already owns, leaving the chain unchanged.
    pub fn register(&mut self, handler: Box<dyn PrimOpHandler>) -> Result<()> {
        let names = handler.operations();
        if let Some(dup) = names.iter().find(|n| self.by_name.contains_key(*n)) {
            return Err(StgError::new(ErrorKind::DuplicatePrimOp(dup.to_string())));
        }
        let index = self.handlers.len();
        for name in names {
            self.by_name.insert(name, index);
        }
        self.handlers.push(handler);
        Ok(())
    }

    /// The family claiming `name`, if any.
    pub fn claimed_by(&self, name: &str) -> Option<&'static str> {
        self.by_name.get(name).map(|&i| self.handlers[i].family())
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Run the handler claiming `call.name`, or `fallback` if none claims it
    /// or the claiming handler declines the argument shapes.
    pub fn evaluate_with<F>(
        &self,
        state: &mut StgState,
        call: &PrimCall<'_>,
        fallback: F,
    ) -> Result<Vec<Atom>>
    where
        F: FnOnce(&mut StgState, &PrimCall<'_>) -> Result<Vec<Atom>>,
    {
        if let Some(&index) = self.by_name.get(call.name) {
            let handler = &self.handlers[index];
            if let Some(result) = handler.evaluate(state, call)? {
                return Ok(result);
            }
            debug!(
                op = call.name,
                family = handler.family(),
                args = call.args.len(),
                "argument shapes declined, falling through"
            );
        }
        fallback(state, call)
    }

    pub fn evaluate(&self, state: &mut StgState, call: &PrimCall<'_>) -> Result<Vec<Atom>> {
        self.evaluate_with(state, call, unknown_primop)
    }
}

fn standard_handlers() -> Vec<Box<dyn PrimOpHandler>> {
    vec![
        Box::new(FloatOps::<f32>::new()),
        Box::new(FloatOps::<f64>::new()),
        Box::new(IntOps),
        Box::new(WordOps),
        Box::new(CharOps),
        Box::new(MutVarOps),
        Box::new(MVarOps),
        Box::new(ArrayOps::large()),
        Box::new(ArrayOps::small()),
        Box::new(ByteArrayOps),
        Box::new(AddrOps),
        Box::new(TagOps),
        Box::new(ConcurrencyOps),
    ]
}
