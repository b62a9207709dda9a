//! Conversion instructions.
//!
//! Everything the engine runs is 32 bits wide, so the width-changing
//! conversions (`UConvert`/`SConvert`/`FConvert`) degenerate to bit copies;
//! the float-to-integer family truncates toward zero and clamps to the
//! destination range, which is exactly what Rust's saturating `as` casts do.

use spirv_asm::{Op, OpView};

use crate::error::{ExecResult, Trap};
use crate::module::Type;
use crate::state::ExecuteState;

use super::executor::operand_id;
use super::Simulator;

impl<'m> Simulator<'m> {
    pub(super) fn op_convert_f_to_u(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        self.convert(op, Op::ConvertFToU, Type::is_float, Type::is_unsigned_int, |reg, out, lane| {
            out.set_u32(lane, reg.f32(lane) as u32)
        })
    }

    pub(super) fn op_convert_f_to_s(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        self.convert(op, Op::ConvertFToS, Type::is_float, Type::is_signed_int, |reg, out, lane| {
            out.set_i32(lane, reg.f32(lane) as i32)
        })
    }

    pub(super) fn op_convert_s_to_f(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        self.convert(op, Op::ConvertSToF, Type::is_signed_int, Type::is_float, |reg, out, lane| {
            out.set_f32(lane, reg.i32(lane) as f32)
        })
    }

    pub(super) fn op_convert_u_to_f(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        self.convert(op, Op::ConvertUToF, Type::is_unsigned_int, Type::is_float, |reg, out, lane| {
            out.set_f32(lane, reg.u32(lane) as f32)
        })
    }

    pub(super) fn op_u_convert(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        self.convert(op, Op::UConvert, Type::is_unsigned_int, Type::is_unsigned_int, |reg, out, lane| {
            out.set_u32(lane, reg.u32(lane))
        })
    }

    pub(super) fn op_s_convert(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        self.convert(op, Op::SConvert, Type::is_signed_int, Type::is_signed_int, |reg, out, lane| {
            out.set_i32(lane, reg.i32(lane))
        })
    }

    pub(super) fn op_f_convert(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        self.convert(op, Op::FConvert, Type::is_float, Type::is_float, |reg, out, lane| {
            out.set_f32(lane, reg.f32(lane))
        })
    }

    pub(super) fn op_sat_convert_s_to_u(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        self.convert(op, Op::SatConvertSToU, Type::is_signed_int, Type::is_unsigned_int, |reg, out, lane| {
            out.set_u32(lane, reg.i32(lane).max(0) as u32)
        })
    }

    pub(super) fn op_sat_convert_u_to_s(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        self.convert(op, Op::SatConvertUToS, Type::is_unsigned_int, Type::is_signed_int, |reg, out, lane| {
            out.set_i32(lane, reg.u32(lane).min(i32::MAX as u32) as i32)
        })
    }

    pub(super) fn op_convert_ptr_to_u(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        self.convert(op, Op::ConvertPtrToU, Type::is_pointer, Type::is_unsigned_int, |reg, out, lane| {
            out.set_u32(lane, reg.u32(lane))
        })
    }

    pub(super) fn op_convert_u_to_ptr(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        self.convert(op, Op::ConvertUToPtr, Type::is_unsigned_int, Type::is_pointer, |reg, out, lane| {
            out.set_u32(lane, reg.u32(lane))
        })
    }

    fn convert(
        &mut self,
        op: OpView<'m>,
        kind: Op,
        src_ok: impl Fn(&Type) -> bool,
        dst_ok: impl Fn(&Type) -> bool,
        f: impl Fn(&super::Register, &mut super::Register, usize),
    ) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        if !dst_ok(slot.ty) {
            return Err(Trap::TypeMismatch(kind));
        }
        let a = self.reg(operand_id(&op, 2)?)?;
        if !src_ok(self.ty(a.type_id)?) {
            return Err(Trap::TypeMismatch(kind));
        }
        let n = slot.ty.lanes();
        if a.lanes() != n {
            return Err(Trap::TypeMismatch(kind));
        }
        let mut res = slot.zeroed();
        for lane in 0..n {
            f(a, &mut res, lane);
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }
}
