//! The simulator: per-invocation registers, heap, call stack and
//! single-step execution against an immutable [`Module`].

use hashbrown::HashMap;
use tracing::{debug, trace};

use spirv_asm::{Id, Op, OpView, StorageClass};

use crate::call::Frame;
use crate::error::{ExecResult, Trap};
use crate::module::{Access, Function, Initializer, Module, Type, TypeKind, Variable};
use crate::state::ExecuteState;

mod alu;
mod bit;
mod composite;
mod convert;
mod executor;
mod ext;
mod flow;
mod glsl;
mod logic;
mod memory;
mod registers;

pub use memory::Heap;
pub use registers::Register;

use executor::operand;
use ext::ExtSet;

/// A resolved interface slot the host plugs data into or reads back from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimPointer {
    /// Pointee type id of the slot.
    pub type_id: Id,
    /// Byte offset of the slot in the heap.
    pub offset: u32,
}

/// One shader invocation in flight.
///
/// Owns every piece of mutable state; the module behind it can back any
/// number of simulators concurrently. A latched [`Trap`] (or a finished
/// invocation) turns [`step`](Simulator::step) into a no-op.
#[derive(Debug, Clone)]
pub struct Simulator<'m> {
    module: &'m Module,
    pc: usize,
    finished: bool,
    error: Option<Trap>,
    heap: Heap,
    global: Frame,
    frames: Vec<Frame>,
    intf_pointers: HashMap<(StorageClass, Access), SimPointer>,
    ext_sets: HashMap<Id, ExtSet>,
}

impl<'m> Simulator<'m> {
    /// Prepare an invocation of the module's `entry_point`-th entry point:
    /// bind extended-instruction sets, materialize constants as global
    /// registers, allocate pipeline variables (applying constant
    /// initializers), publish interface pointers, and push the entry frame.
    pub fn new(module: &'m Module, entry_point: usize) -> Result<Self, Trap> {
        let ep = module
            .entry_points()
            .get(entry_point)
            .ok_or(Trap::NoSuchEntryPoint(entry_point))?;

        let mut sim = Simulator {
            module,
            pc: module.binary().first_op(),
            finished: false,
            error: None,
            heap: Heap::new(),
            global: Frame::global(),
            frames: Vec::new(),
            intf_pointers: HashMap::new(),
            ext_sets: HashMap::new(),
        };

        for (id, name) in module.ext_imports() {
            match name {
                "GLSL.std.450" => {
                    sim.ext_sets.insert(id, ExtSet::GlslStd450);
                }
                other => return Err(Trap::UnsupportedExtension(other.to_string())),
            }
        }

        // Constants become registers in the global frame. Ids are sorted so
        // the heap layout below comes out identical from run to run.
        let mut constant_ids: Vec<Id> = module.constants().map(|(id, _)| id).collect();
        constant_ids.sort_unstable();
        for id in constant_ids {
            let constant = module.constant_by_id(id).expect("listed above");
            sim.global.insert(Register::from_bytes(
                id,
                constant.type_id,
                constant.bytes.clone(),
            ));
        }

        let mut variable_ids: Vec<Id> = module.variables().map(|v| v.id).collect();
        variable_ids.sort_unstable();
        for id in variable_ids {
            let var = module.variable_by_id(id).expect("listed above");
            if var.storage_class == StorageClass::Function {
                continue;
            }
            let offset = sim.allocate_variable(var)?;
            sim.add_interface_pointers(var, offset)?;
        }

        let function = module
            .function_by_id(ep.function)
            .ok_or(Trap::UnknownFunction(ep.function))?;
        sim.call_function(function, 0, &[], None)?;
        sim.pc = function.first_body;

        debug!(entry = %ep.name, pc = sim.pc, "simulator initialized");
        Ok(sim)
    }

    /// The module this invocation runs.
    pub fn module(&self) -> &'m Module {
        self.module
    }

    /// Word address of the instruction the next step executes.
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Whether the entry point has returned.
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// The latched fault, if any. Set once; never cleared.
    pub fn error(&self) -> Option<&Trap> {
        self.error.as_ref()
    }

    /// The heap, for host-side inspection.
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Look up an interface slot published at init.
    pub fn interface_pointer(&self, kind: StorageClass, access: Access) -> Option<&SimPointer> {
        self.intf_pointers.get(&(kind, access))
    }

    /// Copy host bytes into an interface slot.
    pub fn associate_data(
        &mut self,
        kind: StorageClass,
        access: Access,
        data: &[u8],
    ) -> ExecResult<()> {
        let ptr = *self
            .intf_pointers
            .get(&(kind, access))
            .ok_or(Trap::MissingBinding { kind, access })?;
        let cap = self.ty(ptr.type_id)?.byte_size();
        if data.len() > cap {
            return Err(Trap::DataTooLarge {
                len: data.len(),
                cap,
            });
        }
        self.heap.write(ptr.offset as usize, data)
    }

    /// Read the current bytes of an interface slot.
    pub fn interface_data(&self, kind: StorageClass, access: Access) -> ExecResult<&[u8]> {
        let ptr = self
            .intf_pointers
            .get(&(kind, access))
            .ok_or(Trap::MissingBinding { kind, access })?;
        let size = self.ty(ptr.type_id)?.byte_size();
        self.heap.read(ptr.offset as usize, size)
    }

    /// Register lookup: current frame first, then the global frame.
    pub fn register_by_id(&self, id: Id) -> Option<&Register> {
        self.frames
            .last()
            .and_then(|frame| frame.register(id))
            .or_else(|| self.global.register(id))
    }

    /// Render a register for host debugging.
    pub fn register_to_string(&self, id: Id) -> Option<String> {
        let reg = self.register_by_id(id)?;
        let ty = self.module.type_by_id(reg.type_id)?;
        Some(reg.render(ty))
    }

    /// Execute exactly one instruction. A no-op once the invocation is
    /// finished or a fault is latched.
    pub fn step(&mut self) {
        if self.finished || self.error.is_some() {
            return;
        }
        match self.execute_current() {
            Ok(ExecuteState::Proceed) => match self.module.binary().next_addr(self.pc) {
                Ok(next) => self.pc = next,
                Err(err) => self.error = Some(err.into()),
            },
            Ok(ExecuteState::Jump(target)) => {
                if self.module.binary().check_jump(target) {
                    self.pc = target;
                } else {
                    self.error = Some(Trap::JumpOutOfRange(target));
                }
            }
            Ok(ExecuteState::Finished) => self.finished = true,
            Err(trap) => {
                debug!(%trap, pc = self.pc, "fault latched");
                self.error = Some(trap);
            }
        }
    }

    /// Step until the invocation finishes or a fault latches.
    pub fn run(&mut self) {
        while !self.finished && self.error.is_none() {
            self.step();
        }
    }

    // ---- shared engine plumbing ----

    fn ty(&self, id: Id) -> ExecResult<&'m Type> {
        self.module.type_by_id(id).ok_or(Trap::UnknownType(id))
    }

    fn reg(&self, id: Id) -> ExecResult<&Register> {
        self.register_by_id(id).ok_or(Trap::UnknownId(id))
    }

    fn current_frame_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().unwrap_or(&mut self.global)
    }

    fn put(&mut self, reg: Register) {
        self.current_frame_mut().insert(reg);
    }

    /// Decode the `(result-type, result-id)` prefix shared by most
    /// value-producing instructions.
    fn result_slot(&self, op: &OpView<'_>) -> ExecResult<ResultSlot<'m>> {
        let type_id = operand(op, 0)?;
        let id = operand(op, 1)?;
        Ok(ResultSlot {
            id,
            ty: self.ty(type_id)?,
        })
    }

    /// Allocate a variable's pointee on the heap, apply its constant
    /// initializer, and bind its pointer register in the current frame.
    fn allocate_variable(&mut self, var: &Variable) -> ExecResult<u32> {
        let ptr_ty = self.ty(var.type_id)?;
        let TypeKind::Pointer { pointee, .. } = ptr_ty.kind else {
            return Err(Trap::TypeMismatch(Op::Variable));
        };
        let size = self.ty(pointee)?.byte_size();

        let offset = self.heap.alloc(size);
        if let Some(Initializer::Constant(init)) = var.initializer {
            if let Some(constant) = self.module.constant_by_id(init) {
                let len = constant.bytes.len().min(size);
                self.heap.write(offset as usize, &constant.bytes[..len])?;
            }
        }

        let mut reg = Register::zeroed(var.id, ptr_ty);
        reg.set_u32(0, offset);
        self.put(reg);
        trace!(id = var.id, offset, size, "variable allocated");
        Ok(offset)
    }

    fn add_interface_pointers(&mut self, var: &Variable, offset: u32) -> ExecResult<()> {
        let ptr_ty = self.ty(var.type_id)?;
        let TypeKind::Pointer { pointee, .. } = ptr_ty.kind else {
            return Err(Trap::TypeMismatch(Op::Variable));
        };

        if let Some(access) = var.access {
            self.intf_pointers.insert(
                (var.storage_class, access),
                SimPointer {
                    type_id: pointee,
                    offset,
                },
            );
        }

        if let TypeKind::Structure { members } = &self.ty(pointee)?.kind {
            let mut member_offset = 0u32;
            for (index, &member) in members.iter().enumerate() {
                let member_size = self.ty(member)?.byte_size() as u32;
                if let Some(Some(access)) = var.member_access.get(index) {
                    self.intf_pointers.insert(
                        (var.storage_class, *access),
                        SimPointer {
                            type_id: member,
                            offset: offset + member_offset,
                        },
                    );
                }
                member_offset += member_size;
            }
        }
        Ok(())
    }

    /// Push a frame for `function` and make it current: arguments are cloned
    /// out of the caller's frame first, locals allocated after.
    fn call_function(
        &mut self,
        function: &Function,
        result_id: Id,
        args: &[Id],
        return_addr: Option<usize>,
    ) -> ExecResult<()> {
        if args.len() != function.params.len() {
            return Err(Trap::Malformed("call argument count mismatch"));
        }

        let mut frame = Frame::new(function.id, return_addr, result_id, self.heap.free_start());
        for (&param, &arg) in function.params.iter().zip(args) {
            let src = self.reg(arg)?;
            frame.insert(src.clone_as(param));
        }
        self.frames.push(frame);

        for &local in &function.locals {
            let var = self
                .module
                .variable_by_id(local)
                .ok_or(Trap::UnknownId(local))?;
            self.allocate_variable(var)?;
        }
        Ok(())
    }
}

/// The `(result-id, result-type)` destination of a value-producing
/// instruction.
pub(crate) struct ResultSlot<'m> {
    pub id: Id,
    pub ty: &'m Type,
}

impl<'m> ResultSlot<'m> {
    /// A zeroed register shaped for this slot.
    pub fn zeroed(&self) -> Register {
        Register::zeroed(self.id, self.ty)
    }
}
