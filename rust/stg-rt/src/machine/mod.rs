//! The reduction machine.
//!
//! An eval/apply driver over the reified control stack in [`StgState`].
//! Each transition consumes one piece of [`Code`] and produces the next;
//! continuations are pushed as frames before control moves into a
//! sub-evaluation and popped when a value comes back. Host recursion never
//! tracks program recursion, so evaluation depth is bounded only by
//! `MachineConfig::max_stack_depth`.

mod apply;
mod case;
mod eval;

use crate::config::MachineConfig;
use crate::error::{ErrorKind, Result, StgError};
use crate::primops::PrimOpChain;
use crate::state::StgState;
use std::fmt;
use std::rc::Rc;
use stg_core::syntax::{Expr, Program};
use stg_core::{Atom, Env, HeapObject, Id};
use tracing::{debug, trace};

/// What the machine does next.
#[derive(Debug, Clone)]
pub enum Code {
    /// Evaluate an expression in the current scope.
    Eval(Rc<Expr>),
    /// Evaluate an atom to weak head normal form.
    Enter(Atom),
    /// Hand values to the topmost continuation.
    Return(Vec<Atom>),
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Code::Eval(expr) => match expr.as_ref() {
                Expr::App { fun, .. } => write!(f, "eval app {}", fun),
                Expr::Lit(_) => write!(f, "eval literal"),
                Expr::ConApp { con, .. } => write!(f, "eval con {}", con),
                Expr::MultiVal { args } => write!(f, "eval multi-value/{}", args.len()),
                Expr::OpApp { op, .. } => write!(f, "eval op {}", op),
                Expr::Case { binder, .. } => write!(f, "eval case {}", binder),
                Expr::Let { .. } => write!(f, "eval let"),
            },
            Code::Enter(atom) => write!(f, "enter {}", atom),
            Code::Return(atoms) => write!(f, "return {} value(s)", atoms.len()),
        }
    }
}

pub struct Machine {
    state: StgState,
    primops: PrimOpChain,
    config: MachineConfig,
    entry: Option<Id>,
    steps: u64,
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("stats", &self.state.stats())
            .field("primops", &self.primops)
            .field("config", &self.config)
            .field("entry", &self.entry)
            .field("steps", &self.steps)
            .finish()
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(MachineConfig::default())
    }
}

impl Machine {
    pub fn new(config: MachineConfig) -> Self {
        Self::with_primops(config, PrimOpChain::standard())
    }

    pub fn with_primops(config: MachineConfig, primops: PrimOpChain) -> Self {
        Self {
            state: StgState::with_config(&config),
            primops,
            config,
            entry: None,
            steps: 0,
        }
    }

    pub fn state(&self) -> &StgState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut StgState {
        &mut self.state
    }

    pub fn primops_mut(&mut self) -> &mut PrimOpChain {
        &mut self.primops
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Transitions taken by the most recent top-level run.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Allocate every top-level binding into the static environment and
    /// remember the program's entry binder.
    ///
    /// Addresses for all binders are handed out before any right-hand side
    /// is built, so top-level bindings may refer to each other in any order.
    pub fn load(&mut self, program: &Program) -> Result<()> {
        let mut pending = Vec::new();
        for binding in &program.bindings {
            for (id, rhs) in eval::binding_pairs(binding) {
                let addr = self.state.reserve();
                self.state.bind_static(id.clone(), Atom::HeapPtr(addr));
                pending.push((addr, id, rhs));
            }
        }
        let count = pending.len();
        for (addr, id, rhs) in pending {
            let object = self
                .state
                .with_env(id, Env::new(), |state| eval::build_rhs(state, id, rhs))?;
            self.state.store(addr, object)?;
        }
        debug!(bindings = count, entry = %program.entry, "program loaded");
        self.entry = Some(program.entry.clone());
        Ok(())
    }

    /// Run the loaded program's entry binder to weak head normal form.
    pub fn run_entry(&mut self) -> Result<Vec<Atom>> {
        let entry = self
            .entry
            .clone()
            .ok_or_else(|| StgError::new(ErrorKind::NoProgramLoaded))?;
        let atom = self.state.resolve(&entry)?;
        self.run_scoped(&entry, Env::new(), Code::Enter(atom))
    }

    /// Load `program` and run its entry.
    pub fn run_program(&mut self, program: &Program) -> Result<Vec<Atom>> {
        self.load(program)?;
        self.run_entry()
    }

    /// Evaluate `expr` under `env` in a scope named `name`. The caller's
    /// scope is restored afterwards, whether or not evaluation succeeds.
    pub fn eval(&mut self, name: &Id, env: Env, expr: Rc<Expr>) -> Result<Vec<Atom>> {
        self.run_scoped(name, env, Code::Eval(expr))
    }

    /// Evaluate an atom to weak head normal form: thunks are forced and
    /// updated, everything else comes back unchanged.
    pub fn force(&mut self, atom: Atom) -> Result<Atom> {
        let name = Id::new("force", "<force>");
        let env = self.state.env().clone();
        let mut atoms = self.run_scoped(&name, env, Code::Enter(atom))?;
        match atoms.len() {
            1 => Ok(atoms.remove(0)),
            n => Err(self.state.error(ErrorKind::PrimOpShape {
                name: "force".to_string(),
                reason: format!("expected one value, got {}", n),
            })),
        }
    }

    fn run_scoped(&mut self, name: &Id, env: Env, code: Code) -> Result<Vec<Atom>> {
        let base = self.state.stack_depth();
        if base == 0 {
            self.steps = 0;
        }
        let primops = &self.primops;
        let max_steps = self.config.max_steps;
        let steps = &mut self.steps;
        self.state.with_env(name, env, |state| {
            Driver {
                state,
                primops,
                max_steps,
                steps,
            }
            .run(base, code)
        })
    }

    /// Render an atom for display, showing heap objects one level deep.
    pub fn render(&self, atom: &Atom) -> String {
        match atom {
            Atom::HeapPtr(addr) => match self.state.read_heap(*addr) {
                Ok(HeapObject::Con { con, args }) if args.is_empty() => con.to_string(),
                Ok(HeapObject::Con { con, args }) => {
                    let fields: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                    format!("({} {})", con, fields.join(" "))
                }
                Ok(obj) => match obj.as_closure() {
                    Some(c) => format!("<{} {}>", obj.describe(), c.name),
                    None => format!("<{}>", obj.describe()),
                },
                Err(_) => format!("<dangling {}>", addr),
            },
            other => other.to_string(),
        }
    }
}

/// One run of the transition loop, borrowing the machine's parts.
pub(crate) struct Driver<'m> {
    pub(crate) state: &'m mut StgState,
    pub(crate) primops: &'m PrimOpChain,
    pub(crate) max_steps: Option<u64>,
    pub(crate) steps: &'m mut u64,
}

impl Driver<'_> {
    /// Run until a value returns with the control stack back at `base`.
    /// On failure, frames pushed by this run are discarded.
    pub(crate) fn run(&mut self, base: usize, code: Code) -> Result<Vec<Atom>> {
        let result = self.run_until(base, code);
        if result.is_err() {
            self.state.truncate_stack(base);
        }
        result
    }

    fn run_until(&mut self, base: usize, mut code: Code) -> Result<Vec<Atom>> {
        loop {
            *self.steps = self.steps.saturating_add(1);
            if let Some(max) = self.max_steps {
                if *self.steps > max {
                    return Err(self.state.error(ErrorKind::StepLimitExceeded(max)));
                }
            }
            trace!(step = *self.steps, depth = self.state.stack_depth(), "{}", code);

            code = match code {
                Code::Eval(expr) => self.eval(&expr)?,
                Code::Enter(atom) => self.enter(atom)?,
                Code::Return(atoms) => {
                    if self.state.stack_depth() <= base {
                        return Ok(atoms);
                    }
                    match self.state.pop_frame() {
                        Some(frame) => self.resume(frame, atoms)?,
                        None => return Ok(atoms),
                    }
                }
            };
        }
    }
}
