//! Bit-manipulation instructions.

use spirv_asm::{Op, OpView};

use crate::error::{ExecResult, Trap};
use crate::state::ExecuteState;

use super::executor::operand_id;
use super::Simulator;

/// Mask covering `count` bits starting at `offset`, safe for the full
/// `[0, 32]` range of both operands.
pub(super) fn field_mask(offset: u32, count: u32) -> u32 {
    if offset >= 32 || count == 0 {
        return 0;
    }
    let field = if count >= 32 {
        u32::MAX
    } else {
        (1u32 << count) - 1
    };
    field << offset
}

/// Sign-extend the low `width` bits of `value`.
pub(super) fn sign_extend(value: u32, width: u32) -> u32 {
    if width == 0 || width >= 32 {
        return value;
    }
    let shift = 32 - width;
    (((value << shift) as i32) >> shift) as u32
}

impl<'m> Simulator<'m> {
    pub(super) fn bit_unop(
        &mut self,
        op: OpView<'m>,
        kind: Op,
        f: impl Fn(u32) -> u32,
    ) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        if !slot.ty.is_int() {
            return Err(Trap::TypeMismatch(kind));
        }
        let a = self.reg(operand_id(&op, 2)?)?;
        let n = slot.ty.lanes();
        if a.lanes() != n {
            return Err(Trap::TypeMismatch(kind));
        }
        let mut res = slot.zeroed();
        for lane in 0..n {
            res.set_u32(lane, f(a.u32(lane)));
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    pub(super) fn bit_binop(
        &mut self,
        op: OpView<'m>,
        kind: Op,
        f: impl Fn(u32, u32) -> u32,
    ) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        if !slot.ty.is_int() {
            return Err(Trap::TypeMismatch(kind));
        }
        let a = self.reg(operand_id(&op, 2)?)?;
        let b = self.reg(operand_id(&op, 3)?)?;
        let n = slot.ty.lanes();
        if a.lanes() != n || b.lanes() != n {
            return Err(Trap::TypeMismatch(kind));
        }
        let mut res = slot.zeroed();
        for lane in 0..n {
            res.set_u32(lane, f(a.u32(lane), b.u32(lane)));
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    /// Bits of Insert within the field, bits of Base outside it.
    pub(super) fn op_bit_field_insert(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        let base = self.reg(operand_id(&op, 2)?)?;
        let insert = self.reg(operand_id(&op, 3)?)?;
        let offset = self.reg(operand_id(&op, 4)?)?.u32(0);
        let count = self.reg(operand_id(&op, 5)?)?.u32(0);

        let mask = field_mask(offset, count);
        let n = slot.ty.lanes();
        if base.lanes() != n || insert.lanes() != n {
            return Err(Trap::TypeMismatch(Op::BitFieldInsert));
        }
        let mut res = slot.zeroed();
        for lane in 0..n {
            res.set_u32(lane, (base.u32(lane) & !mask) | (insert.u32(lane) & mask));
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    pub(super) fn op_bit_field_s_extract(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        self.bit_field_extract(op, true)
    }

    pub(super) fn op_bit_field_u_extract(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        self.bit_field_extract(op, false)
    }

    fn bit_field_extract(&mut self, op: OpView<'m>, signed: bool) -> ExecResult<ExecuteState> {
        let kind = if signed {
            Op::BitFieldSExtract
        } else {
            Op::BitFieldUExtract
        };
        let slot = self.result_slot(&op)?;
        let base = self.reg(operand_id(&op, 2)?)?;
        let offset = self.reg(operand_id(&op, 3)?)?.u32(0);
        let count = self.reg(operand_id(&op, 4)?)?.u32(0);

        let mask = field_mask(offset, count);
        let n = slot.ty.lanes();
        if base.lanes() != n {
            return Err(Trap::TypeMismatch(kind));
        }
        let mut res = slot.zeroed();
        for lane in 0..n {
            let mut value = (base.u32(lane) & mask).wrapping_shr(offset);
            if signed {
                value = sign_extend(value, count);
            }
            res.set_u32(lane, value);
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }
}
