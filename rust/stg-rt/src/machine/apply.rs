//! Entering heap objects, thunk updates and function application.

use super::{Code, Driver};
use crate::error::{ErrorKind, Result};
use stg_core::{Addr, Atom, Closure, Frame, HeapObject, StackContinuation};
use tracing::{debug, warn};

impl Driver<'_> {
    /// Evaluate an atom to weak head normal form.
    ///
    /// Constructors, functions and partial applications are values already.
    /// A thunk is blackholed, an update frame is pushed for it, and its body
    /// runs in its captured scope. Reaching a blackhole means the thunk
    /// needs its own value.
    pub(super) fn enter(&mut self, atom: Atom) -> Result<Code> {
        let Atom::HeapPtr(addr) = atom else {
            return Ok(Code::Return(vec![atom]));
        };
        let thunk = match self.state.read_heap(addr)? {
            HeapObject::Blackhole(_) => {
                warn!(addr = %addr, "blackhole entered");
                return Err(self.state.error(ErrorKind::BlackholeEntered(addr)));
            }
            HeapObject::Closure(c) if c.is_thunk() => c.clone(),
            HeapObject::Con { .. } | HeapObject::Closure(_) => {
                return Ok(Code::Return(vec![atom]));
            }
        };
        debug!(addr = %addr, thunk = %thunk.name, "forcing thunk");
        self.state.store(
            addr,
            HeapObject::Blackhole(Box::new(HeapObject::Closure(thunk.clone()))),
        )?;
        self.state.push_frame(StackContinuation::Update(addr))?;
        self.state.enter_scope(&thunk.name, thunk.env);
        Ok(Code::Eval(thunk.lambda.body.clone()))
    }

    /// Resume the continuation of a popped frame with returned values.
    pub(super) fn resume(&mut self, frame: Frame, atoms: Vec<Atom>) -> Result<Code> {
        let Frame {
            cont,
            env,
            eval_stack,
        } = frame;
        self.state.restore_scope(env, eval_stack);
        match cont {
            StackContinuation::Update(target) => self.update(target, atoms),
            StackContinuation::Apply(args) => match atoms.as_slice() {
                [Atom::HeapPtr(addr)] => self.apply(*addr, args),
                other => {
                    let found = render_atoms(other);
                    Err(self.state.error(ErrorKind::NotAFunction(found)))
                }
            },
            StackContinuation::CaseOf {
                binder,
                alt_type,
                alts,
            } => self.select_alternative(&binder, &alt_type, &alts, atoms),
        }
    }

    /// Overwrite the thunk at `target` with the object its evaluation
    /// produced, then pass the value on.
    fn update(&mut self, target: Addr, atoms: Vec<Atom>) -> Result<Code> {
        let [Atom::HeapPtr(result)] = atoms.as_slice() else {
            return Err(self.state.error(ErrorKind::InvalidUpdate {
                target,
                found: render_atoms(&atoms),
            }));
        };
        let object = self.state.read_heap(*result)?.clone();
        debug!(addr = %target, value = %object, "updating thunk");
        self.state.store(target, object)?;
        Ok(Code::Return(atoms))
    }

    /// Apply the function or partial application at `addr` to `args`.
    ///
    /// Too few arguments build a new partial application. Exactly enough
    /// enter the body. Too many enter the body with the arguments it needs
    /// and leave the rest in an `Apply` frame for the result.
    pub(super) fn apply(&mut self, addr: Addr, mut args: Vec<Atom>) -> Result<Code> {
        let closure = match self.state.read_heap(addr)? {
            HeapObject::Closure(c) if c.missing > 0 => c.clone(),
            other => {
                let found = format!("{} at {}", other.describe(), addr);
                return Err(self.state.error(ErrorKind::NotAFunction(found)));
            }
        };
        if args.len() < closure.missing {
            let missing = closure.missing - args.len();
            let mut pap = closure;
            pap.args.append(&mut args);
            pap.missing = missing;
            let pap_addr = self.state.allocate(HeapObject::Closure(pap));
            return Ok(Code::Return(vec![Atom::HeapPtr(pap_addr)]));
        }
        let extra = args.split_off(closure.missing);
        if !extra.is_empty() {
            self.state.push_frame(StackContinuation::Apply(extra))?;
        }
        Ok(self.enter_body(closure, args))
    }

    /// Enter a saturated closure: its captured environment plus every
    /// parameter bound to the supplied arguments.
    fn enter_body(&mut self, closure: Closure, args: Vec<Atom>) -> Code {
        let Closure {
            name,
            lambda,
            mut env,
            args: supplied,
            ..
        } = closure;
        let values = supplied.into_iter().chain(args);
        env.extend(lambda.params.iter().cloned().zip(values));
        self.state.enter_scope(&name, env);
        Code::Eval(lambda.body.clone())
    }
}

fn render_atoms(atoms: &[Atom]) -> String {
    let parts: Vec<String> = atoms.iter().map(|a| a.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primops::PrimOpChain;
    use crate::state::StgState;
    use std::rc::Rc;
    use stg_core::builder::{id, var_expr};
    use stg_core::syntax::Lambda;
    use stg_core::Env;

    fn two_arg_function(st: &mut StgState) -> Addr {
        let lambda = Rc::new(Lambda {
            params: vec![id("a"), id("b")],
            body: var_expr("a"),
        });
        let f = Closure::new(id("f"), lambda, Env::new());
        st.allocate(HeapObject::Closure(f))
    }

    fn with_driver<T>(st: &mut StgState, f: impl FnOnce(&mut Driver<'_>) -> T) -> T {
        let chain = PrimOpChain::new();
        let mut steps = 0;
        let mut driver = Driver {
            state: st,
            primops: &chain,
            max_steps: None,
            steps: &mut steps,
        };
        f(&mut driver)
    }

    #[test]
    fn test_under_application_builds_partial_application() {
        let mut st = StgState::new();
        let f = two_arg_function(&mut st);
        let code = with_driver(&mut st, |d| d.apply(f, vec![Atom::int(1)]).unwrap());
        let Code::Return(atoms) = code else {
            panic!("expected a return");
        };
        let pap = atoms[0].as_heap_ptr().unwrap();
        let c = st.read_heap(pap).unwrap().as_closure().unwrap();
        assert_eq!(c.missing, 1);
        assert_eq!(c.args, vec![Atom::int(1)]);
        assert!(c.is_partial_application());
        // The original function is untouched.
        assert_eq!(st.read_heap(f).unwrap().as_closure().unwrap().missing, 2);
    }

    #[test]
    fn test_over_application_pushes_remaining_args() {
        let mut st = StgState::new();
        let f = two_arg_function(&mut st);
        let args = vec![Atom::int(1), Atom::int(2), Atom::int(3)];
        let code = with_driver(&mut st, |d| d.apply(f, args).unwrap());
        assert!(matches!(code, Code::Eval(_)));
        match &st.peek_frame().unwrap().cont {
            StackContinuation::Apply(rest) => assert_eq!(rest, &vec![Atom::int(3)]),
            other => panic!("unexpected frame {}", other),
        }
        assert_eq!(st.env().get(&id("a")), Some(&Atom::int(1)));
        assert_eq!(st.env().get(&id("b")), Some(&Atom::int(2)));
        assert_eq!(st.eval_stack(), &[id("f")]);
    }

    #[test]
    fn test_entering_blackhole_fails() {
        let mut st = StgState::new();
        let a = st.allocate(HeapObject::Blackhole(Box::new(HeapObject::Con {
            con: stg_core::builder::data_con("Unit", 0, 0),
            args: vec![],
        })));
        let err = with_driver(&mut st, |d| d.enter(Atom::HeapPtr(a)).unwrap_err());
        assert_eq!(err.kind, ErrorKind::BlackholeEntered(a));
    }

    #[test]
    fn test_update_requires_heap_result() {
        let mut st = StgState::new();
        let t = st.reserve();
        let err = with_driver(&mut st, |d| d.update(t, vec![Atom::int(1)]).unwrap_err());
        assert!(matches!(err.kind, ErrorKind::InvalidUpdate { .. }));
    }
}
