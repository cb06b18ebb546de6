//! Global interpreter state.
//!
//! One [`StgState`] holds everything a run mutates: the heap and its address
//! counter, the current and static environments, the diagnostic evaluation
//! stack, the control stack, the string-literal table, and the auxiliary
//! object spaces addressed by integer handles. It is created empty, threaded
//! by `&mut` through every transition, and dropped when the run ends.

use crate::config::MachineConfig;
use crate::error::{ErrorKind, HandleKind, Result, StgError};
use std::collections::HashMap;
use stg_core::strings::StringTable;
use stg_core::syntax::DataCon;
use stg_core::{Addr, Atom, Env, Frame, HeapObject, Id, StackContinuation, StringPtr};
use tracing::trace;

/// One auxiliary object space. Handles are indices, private to the space.
#[derive(Debug)]
struct AuxSpace<T> {
    kind: HandleKind,
    cells: Vec<T>,
}

impl<T> AuxSpace<T> {
    fn new(kind: HandleKind) -> Self {
        Self {
            kind,
            cells: Vec::new(),
        }
    }

    fn alloc(&mut self, value: T) -> usize {
        self.cells.push(value);
        self.cells.len() - 1
    }

    fn unknown(&self, handle: usize) -> ErrorKind {
        ErrorKind::UnknownHandle {
            kind: self.kind,
            handle,
        }
    }
}

/// The four boxed-array spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayKind {
    Array,
    MutableArray,
    SmallArray,
    SmallMutableArray,
}

impl ArrayKind {
    pub fn handle_kind(self) -> HandleKind {
        match self {
            ArrayKind::Array => HandleKind::Array,
            ArrayKind::MutableArray => HandleKind::MutableArray,
            ArrayKind::SmallArray => HandleKind::SmallArray,
            ArrayKind::SmallMutableArray => HandleKind::SmallMutableArray,
        }
    }
}

/// Storage behind a `ByteArray#` handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteArrayData {
    pub bytes: Vec<u8>,
    pub pinned: bool,
}

/// Sizes of the heap and every auxiliary space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateStats {
    pub heap_objects: usize,
    pub next_addr: usize,
    pub stack_depth: usize,
    pub mvars: usize,
    pub arrays: usize,
    pub mutable_arrays: usize,
    pub small_arrays: usize,
    pub small_mutable_arrays: usize,
    pub mutvars: usize,
    pub byte_arrays: usize,
}

fn raise(eval_stack: &[Id], kind: ErrorKind) -> StgError {
    StgError::new(kind).with_eval_stack(eval_stack.to_vec())
}

#[derive(Debug)]
pub struct StgState {
    heap: HashMap<Addr, HeapObject>,
    next_addr: usize,
    env: Env,
    static_env: Env,
    eval_stack: Vec<Id>,
    eval_stack_limit: usize,
    stack: Vec<Frame>,
    max_stack_depth: usize,
    strings: StringTable,
    mvars: AuxSpace<Option<Atom>>,
    arrays: AuxSpace<Vec<Atom>>,
    mutable_arrays: AuxSpace<Vec<Atom>>,
    small_arrays: AuxSpace<Vec<Atom>>,
    small_mutable_arrays: AuxSpace<Vec<Atom>>,
    mutvars: AuxSpace<Atom>,
    byte_arrays: AuxSpace<ByteArrayData>,
    next_weak_pointer: usize,
    current_thread: usize,
}

impl Default for StgState {
    fn default() -> Self {
        Self::new()
    }
}

impl StgState {
    pub fn new() -> Self {
        Self::with_config(&MachineConfig::default())
    }

    pub fn with_config(config: &MachineConfig) -> Self {
        Self {
            heap: HashMap::new(),
            next_addr: 0,
            env: Env::new(),
            static_env: Env::new(),
            eval_stack: Vec::new(),
            eval_stack_limit: config.eval_stack_limit,
            stack: Vec::new(),
            max_stack_depth: config.max_stack_depth,
            strings: StringTable::new(),
            mvars: AuxSpace::new(HandleKind::MVar),
            arrays: AuxSpace::new(ArrayKind::Array.handle_kind()),
            mutable_arrays: AuxSpace::new(ArrayKind::MutableArray.handle_kind()),
            small_arrays: AuxSpace::new(ArrayKind::SmallArray.handle_kind()),
            small_mutable_arrays: AuxSpace::new(ArrayKind::SmallMutableArray.handle_kind()),
            mutvars: AuxSpace::new(HandleKind::MutVar),
            byte_arrays: AuxSpace::new(HandleKind::ByteArray),
            next_weak_pointer: 0,
            // Thread 0 is the main thread.
            current_thread: 0,
        }
    }

    // --- Failure reporting ---

    /// Build a fatal error carrying the current evaluation stack.
    pub fn error(&self, kind: ErrorKind) -> StgError {
        raise(&self.eval_stack, kind)
    }

    pub fn eval_stack(&self) -> &[Id] {
        &self.eval_stack
    }

    /// Record `id` as in progress. The oldest entries are dropped beyond the
    /// configured limit.
    pub fn push_eval(&mut self, id: Id) {
        if self.eval_stack_limit == 0 {
            return;
        }
        if self.eval_stack.len() >= self.eval_stack_limit {
            self.eval_stack.remove(0);
        }
        self.eval_stack.push(id);
    }

    // --- Heap & addressing ---

    pub fn allocate(&mut self, object: HeapObject) -> Addr {
        let addr = self.reserve();
        trace!(addr = %addr, kind = object.describe(), "allocate");
        self.heap.insert(addr, object);
        addr
    }

    /// Hand out a fresh address without filling it. Used for recursive
    /// bindings, whose closures must capture each other's addresses.
    pub fn reserve(&mut self) -> Addr {
        let addr = Addr(self.next_addr);
        self.next_addr += 1;
        addr
    }

    /// Overwrite a slot. The address must have been handed out before.
    pub fn store(&mut self, addr: Addr, object: HeapObject) -> Result<()> {
        if addr.0 >= self.next_addr {
            return Err(self.error(ErrorKind::UnknownAddress(addr)));
        }
        trace!(addr = %addr, kind = object.describe(), "store");
        self.heap.insert(addr, object);
        Ok(())
    }

    pub fn read_heap(&self, addr: Addr) -> Result<&HeapObject> {
        self.heap
            .get(&addr)
            .ok_or_else(|| self.error(ErrorKind::UnknownAddress(addr)))
    }

    pub fn read_con(&self, addr: Addr) -> Result<(&DataCon, &[Atom])> {
        match self.read_heap(addr)? {
            HeapObject::Con { con, args } => Ok((con, args)),
            other => Err(self.error(ErrorKind::NotAConstructor {
                addr,
                found: other.describe(),
            })),
        }
    }

    // --- Environments ---

    /// Bind in the current environment; the last write for an id wins.
    pub fn bind(&mut self, id: Id, atom: Atom) {
        self.env.bind(id, atom);
    }

    pub fn bind_static(&mut self, id: Id, atom: Atom) {
        self.static_env.bind(id, atom);
    }

    /// Look a binder up in the current environment, then among the top-level
    /// binders. The realworld and void tokens resolve to `Void` without
    /// consulting either.
    pub fn resolve(&self, id: &Id) -> Result<Atom> {
        if id.is_void_sentinel() {
            return Ok(Atom::Void);
        }
        self.env
            .get(id)
            .or_else(|| self.static_env.get(id))
            .cloned()
            .ok_or_else(|| self.error(ErrorKind::UnboundVariable(id.clone())))
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Replace the current scope with a closure's: its environment and a
    /// singleton evaluation stack naming it.
    pub fn enter_scope(&mut self, name: &Id, env: Env) {
        self.env = env;
        self.eval_stack.clear();
        self.push_eval(name.clone());
    }

    /// Run `f` in the scope of `name` with environment `env`, restoring the
    /// previous scope on every exit path.
    pub fn with_env<T>(
        &mut self,
        name: &Id,
        env: Env,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let saved_env = std::mem::replace(&mut self.env, env);
        let saved_eval = std::mem::take(&mut self.eval_stack);
        self.push_eval(name.clone());
        let result = f(self);
        self.env = saved_env;
        self.eval_stack = saved_eval;
        result
    }

    // --- Control stack ---

    /// Push a continuation that will resume in the current scope.
    pub fn push_frame(&mut self, cont: StackContinuation) -> Result<()> {
        if self.stack.len() >= self.max_stack_depth {
            return Err(self.error(ErrorKind::StackOverflow(self.max_stack_depth)));
        }
        self.stack.push(Frame {
            cont,
            env: self.env.clone(),
            eval_stack: self.eval_stack.clone(),
        });
        Ok(())
    }

    pub fn pop_frame(&mut self) -> Option<Frame> {
        self.stack.pop()
    }

    pub fn peek_frame(&self) -> Option<&Frame> {
        self.stack.last()
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Reinstate the scope saved with a popped frame.
    pub fn restore_scope(&mut self, env: Env, eval_stack: Vec<Id>) {
        self.env = env;
        self.eval_stack = eval_stack;
    }

    /// Drop every frame above `depth`. Used to unwind a failed nested run.
    pub fn truncate_stack(&mut self, depth: usize) {
        self.stack.truncate(depth);
    }

    // --- String literals ---

    pub fn intern_string(&mut self, bytes: &[u8]) -> StringPtr {
        self.strings.intern(bytes)
    }

    pub fn string_byte(&self, ptr: StringPtr) -> Option<u8> {
        self.strings.byte_at(ptr)
    }

    // --- Mutable variables ---

    pub fn new_mut_var(&mut self, value: Atom) -> usize {
        self.mutvars.alloc(value)
    }

    pub fn lookup_mut_var(&self, handle: usize) -> Result<&Atom> {
        self.mutvars
            .cells
            .get(handle)
            .ok_or_else(|| self.error(self.mutvars.unknown(handle)))
    }

    pub fn write_mut_var(&mut self, handle: usize, value: Atom) -> Result<()> {
        let kind = self.mutvars.unknown(handle);
        let cell = self
            .mutvars
            .cells
            .get_mut(handle)
            .ok_or_else(|| raise(&self.eval_stack, kind))?;
        *cell = value;
        Ok(())
    }

    // --- Synchronization variables ---

    /// A fresh, empty MVar.
    pub fn new_mvar(&mut self) -> usize {
        self.mvars.alloc(None)
    }

    pub fn lookup_mvar(&self, handle: usize) -> Result<&Option<Atom>> {
        self.mvars
            .cells
            .get(handle)
            .ok_or_else(|| self.error(self.mvars.unknown(handle)))
    }

    pub fn write_mvar(&mut self, handle: usize, value: Option<Atom>) -> Result<()> {
        let kind = self.mvars.unknown(handle);
        let cell = self
            .mvars
            .cells
            .get_mut(handle)
            .ok_or_else(|| raise(&self.eval_stack, kind))?;
        *cell = value;
        Ok(())
    }

    // --- Arrays ---

    fn array_space(&self, kind: ArrayKind) -> &AuxSpace<Vec<Atom>> {
        match kind {
            ArrayKind::Array => &self.arrays,
            ArrayKind::MutableArray => &self.mutable_arrays,
            ArrayKind::SmallArray => &self.small_arrays,
            ArrayKind::SmallMutableArray => &self.small_mutable_arrays,
        }
    }

    fn array_space_mut(&mut self, kind: ArrayKind) -> &mut AuxSpace<Vec<Atom>> {
        match kind {
            ArrayKind::Array => &mut self.arrays,
            ArrayKind::MutableArray => &mut self.mutable_arrays,
            ArrayKind::SmallArray => &mut self.small_arrays,
            ArrayKind::SmallMutableArray => &mut self.small_mutable_arrays,
        }
    }

    pub fn new_array_of(&mut self, kind: ArrayKind, elements: Vec<Atom>) -> usize {
        self.array_space_mut(kind).alloc(elements)
    }

    pub fn lookup_array_of(&self, kind: ArrayKind, handle: usize) -> Result<&[Atom]> {
        let space = self.array_space(kind);
        space
            .cells
            .get(handle)
            .map(|v| v.as_slice())
            .ok_or_else(|| self.error(space.unknown(handle)))
    }

    pub fn array_of_mut(&mut self, kind: ArrayKind, handle: usize) -> Result<&mut Vec<Atom>> {
        let space = self.array_space(kind);
        if handle >= space.cells.len() {
            return Err(self.error(space.unknown(handle)));
        }
        Ok(&mut self.array_space_mut(kind).cells[handle])
    }

    pub fn lookup_array(&self, handle: usize) -> Result<&[Atom]> {
        self.lookup_array_of(ArrayKind::Array, handle)
    }

    pub fn lookup_mutable_array(&self, handle: usize) -> Result<&[Atom]> {
        self.lookup_array_of(ArrayKind::MutableArray, handle)
    }

    pub fn lookup_small_array(&self, handle: usize) -> Result<&[Atom]> {
        self.lookup_array_of(ArrayKind::SmallArray, handle)
    }

    // --- Byte arrays ---

    pub fn new_byte_array(&mut self, bytes: Vec<u8>, pinned: bool) -> usize {
        self.byte_arrays.alloc(ByteArrayData { bytes, pinned })
    }

    pub fn lookup_byte_array(&self, handle: usize) -> Result<&ByteArrayData> {
        self.byte_arrays
            .cells
            .get(handle)
            .ok_or_else(|| self.error(self.byte_arrays.unknown(handle)))
    }

    pub fn byte_array_mut(&mut self, handle: usize) -> Result<&mut ByteArrayData> {
        let kind = self.byte_arrays.unknown(handle);
        self.byte_arrays
            .cells
            .get_mut(handle)
            .ok_or_else(|| raise(&self.eval_stack, kind))
    }

    // --- Concurrency handles ---

    pub fn new_weak_pointer(&mut self) -> usize {
        let h = self.next_weak_pointer;
        self.next_weak_pointer += 1;
        h
    }

    pub fn current_thread(&self) -> usize {
        self.current_thread
    }

    /// Called by a scheduler when it switches logical threads.
    pub fn set_current_thread(&mut self, thread: usize) {
        self.current_thread = thread;
    }

    // --- Diagnostics ---

    pub fn stats(&self) -> StateStats {
        StateStats {
            heap_objects: self.heap.len(),
            next_addr: self.next_addr,
            stack_depth: self.stack.len(),
            mvars: self.mvars.cells.len(),
            arrays: self.arrays.cells.len(),
            mutable_arrays: self.mutable_arrays.cells.len(),
            small_arrays: self.small_arrays.cells.len(),
            small_mutable_arrays: self.small_mutable_arrays.cells.len(),
            mutvars: self.mutvars.cells.len(),
            byte_arrays: self.byte_arrays.cells.len(),
        }
    }
}
