//! Activation records of the call stack.

use hashbrown::HashMap;
use spirv_asm::Id;

use crate::interpreter::Register;

/// One frame: the registers of an activation plus what is needed to unwind
/// it. The simulator keeps a dedicated global frame (constants and pipeline
/// variables) below a LIFO stack of function frames.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// Id of the function this frame runs, `None` for the global frame.
    pub function: Option<Id>,
    /// Where execution resumes when the frame pops; `None` for the
    /// entry-point frame, whose pop finishes the invocation.
    pub return_addr: Option<usize>,
    /// Caller-side result id an `OpReturnValue` writes into.
    pub return_id: Id,
    /// Heap bump position at frame entry; popping truncates back to it.
    pub heap_mark: usize,
    regs: HashMap<Id, Register>,
}

impl Frame {
    /// The global frame.
    pub fn global() -> Self {
        Frame::default()
    }

    /// A function frame.
    pub fn new(function: Id, return_addr: Option<usize>, return_id: Id, heap_mark: usize) -> Self {
        Frame {
            function: Some(function),
            return_addr,
            return_id,
            heap_mark,
            regs: HashMap::new(),
        }
    }

    /// Look up a register bound in this frame.
    pub fn register(&self, id: Id) -> Option<&Register> {
        self.regs.get(&id)
    }

    /// Mutable lookup.
    pub fn register_mut(&mut self, id: Id) -> Option<&mut Register> {
        self.regs.get_mut(&id)
    }

    /// Bind a register, replacing any previous binding of its id.
    pub fn insert(&mut self, reg: Register) {
        self.regs.insert(reg.id, reg);
    }

    /// Number of registers bound in this frame.
    pub fn register_count(&self) -> usize {
        self.regs.len()
    }
}
