//! Arithmetic instructions: lane-wise integer and float operations plus the
//! linear-algebra products.
//!
//! Matrix lanes are stored column-major: lane `col * rows + row`. The
//! `ColMajor` decoration only tags the external layout and never changes
//! this ordering.

use spirv_asm::{Op, OpView};

use crate::error::{ExecResult, Trap};
use crate::state::ExecuteState;

use super::executor::operand_id;
use super::Simulator;

/// Signed modulo; the sign of a non-zero result follows the divisor.
pub(super) fn smod(a: i32, b: i32) -> i32 {
    let r = a.wrapping_rem(b);
    if r != 0 && (r < 0) != (b < 0) {
        r.wrapping_add(b)
    } else {
        r
    }
}

/// Float remainder; the sign of a non-zero result follows the dividend.
pub(super) fn frem(a: f32, b: f32) -> f32 {
    a % b
}

/// Float modulo; the sign of a non-zero result follows the divisor.
pub(super) fn fmod(a: f32, b: f32) -> f32 {
    a - b * (a / b).floor()
}

impl<'m> Simulator<'m> {
    pub(super) fn op_s_negate(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        if !slot.ty.is_int() {
            return Err(Trap::TypeMismatch(Op::SNegate));
        }
        let a = self.reg(operand_id(&op, 2)?)?;
        let n = slot.ty.lanes();
        if a.lanes() != n {
            return Err(Trap::TypeMismatch(Op::SNegate));
        }
        let mut res = slot.zeroed();
        for lane in 0..n {
            res.set_i32(lane, a.i32(lane).wrapping_neg());
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    pub(super) fn op_f_negate(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        self.float_unop(op, Op::FNegate, |x| -x)
    }

    pub(super) fn float_unop(
        &mut self,
        op: OpView<'m>,
        kind: Op,
        f: impl Fn(f32) -> f32,
    ) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        if !slot.ty.is_float() {
            return Err(Trap::TypeMismatch(kind));
        }
        let a = self.reg(operand_id(&op, 2)?)?;
        let n = slot.ty.lanes();
        if a.lanes() != n {
            return Err(Trap::TypeMismatch(kind));
        }
        let mut res = slot.zeroed();
        for lane in 0..n {
            res.set_f32(lane, f(a.f32(lane)));
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    pub(super) fn float_binop(
        &mut self,
        op: OpView<'m>,
        kind: Op,
        f: impl Fn(f32, f32) -> f32,
    ) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        if !slot.ty.is_float() {
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
            res.set_f32(lane, f(a.f32(lane), b.f32(lane)));
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    /// `IAdd`/`ISub`/`IMul` work on either signedness; two's complement
    /// wrapping makes the signed and unsigned lane results identical.
    pub(super) fn int_binop(
        &mut self,
        op: OpView<'m>,
        kind: Op,
        f: impl Fn(i32, i32) -> i32,
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
            res.set_i32(lane, f(a.i32(lane), b.i32(lane)));
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    pub(super) fn uint_divop(
        &mut self,
        op: OpView<'m>,
        kind: Op,
        f: impl Fn(u32, u32) -> Option<u32>,
    ) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        if !slot.ty.is_unsigned_int() {
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
            let value = f(a.u32(lane), b.u32(lane)).ok_or(Trap::DivisionByZero(kind))?;
            res.set_u32(lane, value);
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    pub(super) fn sint_divop(
        &mut self,
        op: OpView<'m>,
        kind: Op,
        f: impl Fn(i32, i32) -> Option<i32>,
    ) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        if !slot.ty.is_signed_int() {
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
            let value = f(a.i32(lane), b.i32(lane)).ok_or(Trap::DivisionByZero(kind))?;
            res.set_i32(lane, value);
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    /// `VectorTimesScalar`/`MatrixTimesScalar`: every lane of the first
    /// operand scaled by the scalar's only lane.
    pub(super) fn scale_op(&mut self, op: OpView<'m>, kind: Op) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        if !slot.ty.is_float() {
            return Err(Trap::TypeMismatch(kind));
        }
        let a = self.reg(operand_id(&op, 2)?)?;
        let s = self.reg(operand_id(&op, 3)?)?;
        let n = slot.ty.lanes();
        if a.lanes() != n || s.lanes() == 0 {
            return Err(Trap::TypeMismatch(kind));
        }
        let scalar = s.f32(0);
        let mut res = slot.zeroed();
        for lane in 0..n {
            res.set_f32(lane, a.f32(lane) * scalar);
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    /// Row vector times matrix: `res[col] = Σ_row v[row] * m[col][row]`.
    pub(super) fn op_vector_times_matrix(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        let v = self.reg(operand_id(&op, 2)?)?;
        let m = self.reg(operand_id(&op, 3)?)?;
        let (rows, cols) = self
            .ty(m.type_id)?
            .matrix_dims()
            .ok_or(Trap::TypeMismatch(Op::VectorTimesMatrix))?;
        if v.lanes() != rows || slot.ty.lanes() != cols {
            return Err(Trap::TypeMismatch(Op::VectorTimesMatrix));
        }
        let mut res = slot.zeroed();
        for col in 0..cols {
            let mut acc = 0.0f32;
            for row in 0..rows {
                acc += v.f32(row) * m.f32(col * rows + row);
            }
            res.set_f32(col, acc);
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    /// Matrix times column vector: `res[row] = Σ_col m[col][row] * v[col]`.
    pub(super) fn op_matrix_times_vector(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        let m = self.reg(operand_id(&op, 2)?)?;
        let v = self.reg(operand_id(&op, 3)?)?;
        let (rows, cols) = self
            .ty(m.type_id)?
            .matrix_dims()
            .ok_or(Trap::TypeMismatch(Op::MatrixTimesVector))?;
        if v.lanes() != cols || slot.ty.lanes() != rows {
            return Err(Trap::TypeMismatch(Op::MatrixTimesVector));
        }
        let mut res = slot.zeroed();
        for row in 0..rows {
            let mut acc = 0.0f32;
            for col in 0..cols {
                acc += m.f32(col * rows + row) * v.f32(col);
            }
            res.set_f32(row, acc);
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    pub(super) fn op_matrix_times_matrix(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        let m1 = self.reg(operand_id(&op, 2)?)?;
        let m2 = self.reg(operand_id(&op, 3)?)?;
        let (r1, c1) = self
            .ty(m1.type_id)?
            .matrix_dims()
            .ok_or(Trap::TypeMismatch(Op::MatrixTimesMatrix))?;
        let (r2, c2) = self
            .ty(m2.type_id)?
            .matrix_dims()
            .ok_or(Trap::TypeMismatch(Op::MatrixTimesMatrix))?;
        if c1 != r2 || slot.ty.matrix_dims() != Some((r1, c2)) {
            return Err(Trap::TypeMismatch(Op::MatrixTimesMatrix));
        }
        let mut res = slot.zeroed();
        for i in 0..r1 {
            for j in 0..c2 {
                let mut acc = 0.0f32;
                for k in 0..c1 {
                    acc += m1.f32(k * r1 + i) * m2.f32(j * r2 + k);
                }
                res.set_f32(j * r1 + i, acc);
            }
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    pub(super) fn op_outer_product(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        let v1 = self.reg(operand_id(&op, 2)?)?;
        let v2 = self.reg(operand_id(&op, 3)?)?;
        let rows = v1.lanes();
        let cols = v2.lanes();
        if slot.ty.lanes() != rows * cols {
            return Err(Trap::TypeMismatch(Op::OuterProduct));
        }
        let mut res = slot.zeroed();
        for row in 0..rows {
            for col in 0..cols {
                res.set_f32(col * rows + row, v1.f32(row) * v2.f32(col));
            }
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    pub(super) fn op_dot(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        if !slot.ty.is_float() || slot.ty.lanes() != 1 {
            return Err(Trap::TypeMismatch(Op::Dot));
        }
        let v1 = self.reg(operand_id(&op, 2)?)?;
        let v2 = self.reg(operand_id(&op, 3)?)?;
        if v1.lanes() != v2.lanes() {
            return Err(Trap::TypeMismatch(Op::Dot));
        }
        let mut acc = 0.0f32;
        for lane in 0..v1.lanes() {
            acc += v1.f32(lane) * v2.f32(lane);
        }
        let mut res = slot.zeroed();
        res.set_f32(0, acc);
        self.put(res);
        Ok(ExecuteState::Proceed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(7, 3, 1)]
    #[case(-7, 3, -1)]
    #[case(7, -3, 1)]
    #[case(-7, -3, -1)]
    #[case(8, -3, 2)]
    fn srem_takes_the_dividend_sign(#[case] a: i32, #[case] b: i32, #[case] expect: i32) {
        assert_eq!(a.wrapping_rem(b), expect);
    }

    #[rstest]
    #[case(7, 3, 1)]
    #[case(-7, 3, 2)]
    #[case(7, -3, -2)]
    #[case(-7, -3, -1)]
    #[case(8, -3, -1)]
    fn smod_takes_the_divisor_sign(#[case] a: i32, #[case] b: i32, #[case] expect: i32) {
        assert_eq!(smod(a, b), expect);
    }

    #[test]
    fn smod_of_int_min_does_not_overflow() {
        assert_eq!(smod(i32::MIN, -1), 0);
        assert_eq!(smod(i32::MIN, 3), smod(i32::MIN % 3 + 3, 3));
    }

    #[rstest]
    #[case(7.5, 2.0, 1.5)]
    #[case(-7.5, 2.0, -1.5)]
    #[case(7.5, -2.0, 1.5)]
    #[case(-7.5, -2.0, -1.5)]
    #[case(3.5, 1.0, 0.5)]
    fn frem_takes_the_dividend_sign(#[case] a: f32, #[case] b: f32, #[case] expect: f32) {
        assert_eq!(frem(a, b), expect);
    }

    #[rstest]
    #[case(7.5, 2.0, 1.5)]
    #[case(-7.5, 2.0, 0.5)]
    #[case(7.5, -2.0, -0.5)]
    #[case(-7.5, -2.0, -1.5)]
    #[case(3.5, -1.0, -0.5)]
    fn fmod_takes_the_divisor_sign(#[case] a: f32, #[case] b: f32, #[case] expect: f32) {
        assert_eq!(fmod(a, b), expect);
    }
}
