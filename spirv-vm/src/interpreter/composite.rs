//! Composite instructions: vector shuffles and aggregate assembly,
//! extraction and insertion.

use spirv_asm::{Op, OpView};

use crate::error::{ExecResult, Trap};
use crate::module::{Type, TypeKind};
use crate::state::ExecuteState;

use super::executor::operand_id;
use super::{Register, Simulator};

/// Lane index that leaves a shuffled destination lane undefined.
const SHUFFLE_UNDEF: u32 = 0xffff_ffff;

impl<'m> Simulator<'m> {
    /// Byte offset reached by walking literal `indices` down an aggregate,
    /// and the type arrived at. Structure steps sum the sizes of the
    /// preceding members; array/vector/matrix steps multiply the element
    /// size.
    pub(super) fn aggregate_offset(
        &self,
        ty: &'m Type,
        indices: &[u32],
        kind: Op,
    ) -> ExecResult<(usize, &'m Type)> {
        let mut cur = ty;
        let mut offset = 0usize;

        for &index in indices {
            match &cur.kind {
                TypeKind::Structure { members } => {
                    let member = *members
                        .get(index as usize)
                        .ok_or(Trap::Malformed("aggregate index out of range"))?;
                    for &earlier in &members[..index as usize] {
                        offset += self.ty(earlier)?.byte_size();
                    }
                    cur = self.ty(member)?;
                }
                TypeKind::Array { elem } => {
                    if index >= cur.count {
                        return Err(Trap::Malformed("aggregate index out of range"));
                    }
                    offset += cur.element_size as usize * index as usize;
                    cur = self.ty(*elem)?;
                }
                TypeKind::Vector { base } => {
                    if index >= cur.count {
                        return Err(Trap::Malformed("aggregate index out of range"));
                    }
                    offset += cur.element_size as usize * index as usize;
                    cur = self.ty(*base)?;
                }
                TypeKind::Matrix { col, .. } => {
                    offset += cur.element_size as usize * index as usize;
                    cur = self.ty(*col)?;
                }
                _ => return Err(Trap::TypeMismatch(kind)),
            }
        }
        Ok((offset, cur))
    }

    pub(super) fn op_vector_extract_dynamic(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        if !slot.ty.is_scalar() {
            return Err(Trap::TypeMismatch(Op::VectorExtractDynamic));
        }
        let v = self.reg(operand_id(&op, 2)?)?;
        let index = self.reg(operand_id(&op, 3)?)?.u32(0) as usize;
        if index >= v.lanes() {
            return Err(Trap::Malformed("vector index out of range"));
        }
        let mut res = slot.zeroed();
        res.set_u32(0, v.u32(index));
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    pub(super) fn op_vector_insert_dynamic(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        let v = self.reg(operand_id(&op, 2)?)?;
        let component = self.reg(operand_id(&op, 3)?)?.u32(0);
        let index = self.reg(operand_id(&op, 4)?)?.u32(0) as usize;
        if v.lanes() != slot.ty.lanes() || index >= v.lanes() {
            return Err(Trap::Malformed("vector index out of range"));
        }
        let mut res = Register::from_bytes(slot.id, slot.ty.id, v.bytes().to_vec());
        res.set_u32(index, component);
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    pub(super) fn op_vector_shuffle(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        let v1 = self.reg(operand_id(&op, 2)?)?;
        let v2 = self.reg(operand_id(&op, 3)?)?;
        let components = &op.operands()[4..];
        if components.len() != slot.ty.lanes() {
            return Err(Trap::TypeMismatch(Op::VectorShuffle));
        }

        let mut res = slot.zeroed();
        for (lane, &pick) in components.iter().enumerate() {
            if pick == SHUFFLE_UNDEF {
                // no source; the lane stays undefined (zero)
                continue;
            }
            let pick = pick as usize;
            let value = if pick >= v1.lanes() {
                let from_v2 = pick - v1.lanes();
                if from_v2 >= v2.lanes() {
                    return Err(Trap::Malformed("shuffle index out of range"));
                }
                v2.u32(from_v2)
            } else {
                v1.u32(pick)
            };
            res.set_u32(lane, value);
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    pub(super) fn op_composite_construct(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        let constituents = &op.operands()[2..];

        match &slot.ty.kind {
            TypeKind::Structure { members } => {
                if members.len() != constituents.len() {
                    return Err(Trap::TypeMismatch(Op::CompositeConstruct));
                }
                let mut bytes = Vec::with_capacity(slot.ty.byte_size());
                for &id in constituents {
                    bytes.extend_from_slice(self.reg(id)?.bytes());
                }
                if bytes.len() != slot.ty.byte_size() {
                    return Err(Trap::TypeMismatch(Op::CompositeConstruct));
                }
                self.put(Register::from_bytes(slot.id, slot.ty.id, bytes));
            }
            TypeKind::Array { .. } | TypeKind::Matrix { .. } => {
                let mut bytes = Vec::with_capacity(slot.ty.byte_size());
                for &id in constituents {
                    bytes.extend_from_slice(self.reg(id)?.bytes());
                }
                if bytes.len() != slot.ty.byte_size() {
                    return Err(Trap::TypeMismatch(Op::CompositeConstruct));
                }
                self.put(Register::from_bytes(slot.id, slot.ty.id, bytes));
            }
            TypeKind::Vector { .. } => {
                // scalars and contiguous sub-vectors mix freely, but the
                // declared lane count must come out exactly
                let mut res = slot.zeroed();
                let mut lane = 0usize;
                for &id in constituents {
                    let part = self.reg(id)?;
                    for part_lane in 0..part.lanes() {
                        if lane >= res.lanes() {
                            return Err(Trap::TypeMismatch(Op::CompositeConstruct));
                        }
                        res.set_u32(lane, part.u32(part_lane));
                        lane += 1;
                    }
                }
                if lane != res.lanes() {
                    return Err(Trap::TypeMismatch(Op::CompositeConstruct));
                }
                self.put(res);
            }
            _ => return Err(Trap::TypeMismatch(Op::CompositeConstruct)),
        }
        Ok(ExecuteState::Proceed)
    }

    pub(super) fn op_composite_extract(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        let composite = self.reg(operand_id(&op, 2)?)?;
        let composite_ty = self.ty(composite.type_id)?;
        let (offset, leaf) =
            self.aggregate_offset(composite_ty, &op.operands()[3..], Op::CompositeExtract)?;

        let size = slot.ty.byte_size();
        if leaf.byte_size() != size || offset + size > composite.bytes().len() {
            return Err(Trap::TypeMismatch(Op::CompositeExtract));
        }
        let bytes = composite.bytes()[offset..offset + size].to_vec();
        self.put(Register::from_bytes(slot.id, slot.ty.id, bytes));
        Ok(ExecuteState::Proceed)
    }

    pub(super) fn op_composite_insert(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        let object = self.reg(operand_id(&op, 2)?)?;
        let composite = self.reg(operand_id(&op, 3)?)?;
        if composite.type_id != slot.ty.id {
            return Err(Trap::TypeMismatch(Op::CompositeInsert));
        }
        let composite_ty = self.ty(composite.type_id)?;
        let (offset, leaf) =
            self.aggregate_offset(composite_ty, &op.operands()[4..], Op::CompositeInsert)?;

        let size = object.bytes().len();
        if leaf.byte_size() != size || offset + size > composite.bytes().len() {
            return Err(Trap::TypeMismatch(Op::CompositeInsert));
        }
        let mut bytes = composite.bytes().to_vec();
        bytes[offset..offset + size].copy_from_slice(object.bytes());
        self.put(Register::from_bytes(slot.id, slot.ty.id, bytes));
        Ok(ExecuteState::Proceed)
    }

    pub(super) fn op_copy_object(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        let src = self.reg(operand_id(&op, 2)?)?;
        if src.type_id != slot.ty.id {
            return Err(Trap::TypeMismatch(Op::CopyObject));
        }
        let copy = Register::from_bytes(slot.id, slot.ty.id, src.bytes().to_vec());
        self.put(copy);
        Ok(ExecuteState::Proceed)
    }

    pub(super) fn op_transpose(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        let m = self.reg(operand_id(&op, 2)?)?;
        let (rows, cols) = self
            .ty(m.type_id)?
            .matrix_dims()
            .ok_or(Trap::TypeMismatch(Op::Transpose))?;
        if slot.ty.matrix_dims() != Some((cols, rows)) {
            return Err(Trap::TypeMismatch(Op::Transpose));
        }

        let mut res = slot.zeroed();
        for row in 0..rows {
            for col in 0..cols {
                // source lane (col, row) lands at (row, col) in a
                // cols-rows-tall result
                res.set_u32(row * cols + col, m.u32(col * rows + row));
            }
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }
}
