//! Relational and logical instructions.
//!
//! Ordered float comparisons hold when neither operand is NaN and the
//! predicate holds; unordered ones when either operand is NaN or the
//! predicate holds. Boolean lanes are stored as 0/1.

use spirv_asm::{Op, OpView};

use crate::error::{ExecResult, Trap};
use crate::state::ExecuteState;

use super::executor::operand_id;
use super::Simulator;

impl<'m> Simulator<'m> {
    /// Reduce a boolean vector to a scalar with `any` semantics.
    pub(super) fn op_any(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        self.bool_reduce(op, Op::Any, false, |acc, lane| acc || lane)
    }

    /// Reduce a boolean vector to a scalar with `all` semantics.
    pub(super) fn op_all(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        self.bool_reduce(op, Op::All, true, |acc, lane| acc && lane)
    }

    fn bool_reduce(
        &mut self,
        op: OpView<'m>,
        kind: Op,
        seed: bool,
        f: impl Fn(bool, bool) -> bool,
    ) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        if !slot.ty.is_bool() || slot.ty.lanes() != 1 {
            return Err(Trap::TypeMismatch(kind));
        }
        let v = self.reg(operand_id(&op, 2)?)?;
        if !self.ty(v.type_id)?.is_bool() {
            return Err(Trap::TypeMismatch(kind));
        }
        let mut acc = seed;
        for lane in 0..v.lanes() {
            acc = f(acc, v.bool(lane));
        }
        let mut res = slot.zeroed();
        res.set_bool(0, acc);
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    /// Unary float classification producing booleans.
    pub(super) fn float_pred(
        &mut self,
        op: OpView<'m>,
        kind: Op,
        f: impl Fn(f32) -> bool,
    ) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        if !slot.ty.is_bool() {
            return Err(Trap::TypeMismatch(kind));
        }
        let a = self.reg(operand_id(&op, 2)?)?;
        if !self.ty(a.type_id)?.is_float() {
            return Err(Trap::TypeMismatch(kind));
        }
        let n = slot.ty.lanes();
        if a.lanes() != n {
            return Err(Trap::TypeMismatch(kind));
        }
        let mut res = slot.zeroed();
        for lane in 0..n {
            res.set_bool(lane, f(a.f32(lane)));
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    /// Float comparison with the ordered/unordered NaN rule.
    pub(super) fn float_cmp(
        &mut self,
        op: OpView<'m>,
        kind: Op,
        ordered: bool,
        pred: impl Fn(f32, f32) -> bool,
    ) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        if !slot.ty.is_bool() {
            return Err(Trap::TypeMismatch(kind));
        }
        let a = self.reg(operand_id(&op, 2)?)?;
        let b = self.reg(operand_id(&op, 3)?)?;
        if !self.ty(a.type_id)?.is_float() || !self.ty(b.type_id)?.is_float() {
            return Err(Trap::TypeMismatch(kind));
        }
        let n = slot.ty.lanes();
        if a.lanes() != n || b.lanes() != n {
            return Err(Trap::TypeMismatch(kind));
        }
        let mut res = slot.zeroed();
        for lane in 0..n {
            let (x, y) = (a.f32(lane), b.f32(lane));
            let unordered = x.is_nan() || y.is_nan();
            let value = if ordered {
                !unordered && pred(x, y)
            } else {
                unordered || pred(x, y)
            };
            res.set_bool(lane, value);
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    /// Integer comparison on the raw (unsigned) lane view; equality is
    /// signedness-agnostic and the U-flavored orderings use it directly.
    pub(super) fn int_cmp(
        &mut self,
        op: OpView<'m>,
        kind: Op,
        pred: impl Fn(u32, u32) -> bool,
    ) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        if !slot.ty.is_bool() {
            return Err(Trap::TypeMismatch(kind));
        }
        let a = self.reg(operand_id(&op, 2)?)?;
        let b = self.reg(operand_id(&op, 3)?)?;
        if !self.ty(a.type_id)?.is_int() || !self.ty(b.type_id)?.is_int() {
            return Err(Trap::TypeMismatch(kind));
        }
        let n = slot.ty.lanes();
        if a.lanes() != n || b.lanes() != n {
            return Err(Trap::TypeMismatch(kind));
        }
        let mut res = slot.zeroed();
        for lane in 0..n {
            res.set_bool(lane, pred(a.u32(lane), b.u32(lane)));
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    /// Signed integer ordering.
    pub(super) fn sint_cmp(
        &mut self,
        op: OpView<'m>,
        kind: Op,
        pred: impl Fn(i32, i32) -> bool,
    ) -> ExecResult<ExecuteState> {
        self.int_cmp(op, kind, move |a, b| pred(a as i32, b as i32))
    }

    /// Lane-wise boolean connective.
    pub(super) fn bool_binop(
        &mut self,
        op: OpView<'m>,
        kind: Op,
        f: impl Fn(bool, bool) -> bool,
    ) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        if !slot.ty.is_bool() {
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
            res.set_bool(lane, f(a.bool(lane), b.bool(lane)));
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    pub(super) fn op_logical_not(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        if !slot.ty.is_bool() {
            return Err(Trap::TypeMismatch(Op::LogicalNot));
        }
        let a = self.reg(operand_id(&op, 2)?)?;
        let n = slot.ty.lanes();
        if a.lanes() != n {
            return Err(Trap::TypeMismatch(Op::LogicalNot));
        }
        let mut res = slot.zeroed();
        for lane in 0..n {
            res.set_bool(lane, !a.bool(lane));
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    /// Per-lane pick: a scalar condition selects whole objects, a vector
    /// condition selects lane by lane.
    pub(super) fn op_select(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        let cond = self.reg(operand_id(&op, 2)?)?;
        let a = self.reg(operand_id(&op, 3)?)?;
        let b = self.reg(operand_id(&op, 4)?)?;
        let n = slot.ty.lanes();
        if a.lanes() != n || b.lanes() != n || cond.lanes() == 0 {
            return Err(Trap::TypeMismatch(Op::Select));
        }
        let cond_is_vector = cond.lanes() > 1;
        if cond_is_vector && cond.lanes() != n {
            return Err(Trap::TypeMismatch(Op::Select));
        }
        let mut res = slot.zeroed();
        for lane in 0..n {
            let pick = cond.bool(if cond_is_vector { lane } else { 0 });
            res.set_u32(lane, if pick { a.u32(lane) } else { b.u32(lane) });
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }
}
