//! The simulator's byte-addressable heap.
//!
//! A single linear buffer with a bump pointer. Pipeline variables are
//! allocated at init and live for the whole run; `Function`-class variables
//! stack on top and are reclaimed in LIFO order when their frame pops, by
//! truncating back to the frame's low-water mark.

use educe::Educe;

use spirv_asm::{Op, OpView};

use crate::consts::HEAP_ALIGN;
use crate::error::{ExecResult, Trap};
use crate::module::TypeKind;
use crate::state::ExecuteState;
use crate::util::fmt_truncated_hex;

use super::executor::operand_id;
use super::{Register, Simulator};

/// Linear heap with bump allocation.
#[derive(Clone, Default, Educe)]
#[educe(Debug)]
pub struct Heap {
    #[educe(Debug(method(fmt_truncated_hex)))]
    bytes: Vec<u8>,
    free_start: usize,
}

impl Heap {
    /// An empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate `size` bytes of zeroed storage, rounded up to
    /// [`HEAP_ALIGN`], and return its offset.
    pub fn alloc(&mut self, size: usize) -> u32 {
        let aligned = (size + HEAP_ALIGN - 1) & !(HEAP_ALIGN - 1);
        let offset = self.free_start;
        self.free_start += aligned;
        self.bytes.resize(self.free_start, 0);
        offset as u32
    }

    /// Current bump position; a frame records this as its low-water mark.
    pub fn free_start(&self) -> usize {
        self.free_start
    }

    /// Total allocated bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether nothing has been allocated.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Release everything allocated past `mark`.
    pub fn truncate(&mut self, mark: usize) {
        self.bytes.truncate(mark);
        self.free_start = mark;
    }

    /// Borrow `len` bytes at `offset`.
    pub fn read(&self, offset: usize, len: usize) -> ExecResult<&[u8]> {
        self.bytes
            .get(offset..offset + len)
            .ok_or(Trap::HeapOutOfRange {
                offset,
                len,
                heap: self.bytes.len(),
            })
    }

    /// Copy `data` into the heap at `offset`.
    pub fn write(&mut self, offset: usize, data: &[u8]) -> ExecResult<()> {
        let heap = self.bytes.len();
        self.bytes
            .get_mut(offset..offset + data.len())
            .ok_or(Trap::HeapOutOfRange {
                offset,
                len: data.len(),
                heap,
            })?
            .copy_from_slice(data);
        Ok(())
    }
}

impl<'m> Simulator<'m> {
    /// Pointer to register: a type-sized copy out of the heap.
    pub(super) fn op_load(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        let pointer = self.reg(operand_id(&op, 2)?)?;
        let TypeKind::Pointer { pointee, .. } = self.ty(pointer.type_id)?.kind else {
            return Err(Trap::TypeMismatch(Op::Load));
        };
        if pointee != slot.ty.id {
            return Err(Trap::TypeMismatch(Op::Load));
        }
        let offset = pointer.u32(0) as usize;
        let bytes = self.heap.read(offset, slot.ty.byte_size())?.to_vec();
        self.put(Register::from_bytes(slot.id, slot.ty.id, bytes));
        Ok(ExecuteState::Proceed)
    }

    /// Register to pointer: a type-sized copy into the heap.
    pub(super) fn op_store(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let pointer = self.reg(operand_id(&op, 0)?)?;
        let object = self.reg(operand_id(&op, 1)?)?;
        let TypeKind::Pointer { pointee, .. } = self.ty(pointer.type_id)?.kind else {
            return Err(Trap::TypeMismatch(Op::Store));
        };
        if object.type_id != pointee {
            return Err(Trap::TypeMismatch(Op::Store));
        }
        let offset = pointer.u32(0) as usize;
        let data = object.bytes().to_vec();
        self.heap.write(offset, &data)?;
        Ok(ExecuteState::Proceed)
    }

    /// Derive a pointer by walking indices down the base's pointee.
    /// Index ids resolve through the constant table first, then through the
    /// register file for dynamically computed indices.
    pub(super) fn op_access_chain(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        let TypeKind::Pointer {
            pointee: result_pointee,
            ..
        } = slot.ty.kind
        else {
            return Err(Trap::TypeMismatch(Op::AccessChain));
        };

        let base = self.reg(operand_id(&op, 2)?)?;
        let TypeKind::Pointer { pointee, .. } = self.ty(base.type_id)?.kind else {
            return Err(Trap::TypeMismatch(Op::AccessChain));
        };
        let base_offset = base.u32(0) as usize;

        let mut indices = Vec::with_capacity(op.operands().len() - 3);
        for &index_id in &op.operands()[3..] {
            let value = match self.module.constant_by_id(index_id) {
                Some(constant) => constant
                    .u32()
                    .ok_or(Trap::Malformed("access index constant has no value"))?,
                None => self.reg(index_id)?.u32(0),
            };
            indices.push(value);
        }

        let walk_ty = self.ty(pointee)?;
        let (extra, leaf) = self.aggregate_offset(walk_ty, &indices, Op::AccessChain)?;
        if leaf.id != result_pointee {
            return Err(Trap::TypeMismatch(Op::AccessChain));
        }

        let mut res = slot.zeroed();
        res.set_u32(0, (base_offset + extra) as u32);
        self.put(res);
        Ok(ExecuteState::Proceed)
    }
}
