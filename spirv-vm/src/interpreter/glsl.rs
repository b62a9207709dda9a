//! GLSL.std.450 kernels.
//!
//! Lane-wise 32-bit float kernels (signed-integer ones where the
//! instruction says so), plus the vector geometry trio. Instruction indices
//! with no kernel here fault with the index in the message.

use spirv_asm::{GlslOp, Op, OpView};

use crate::error::{ExecResult, Trap};
use crate::state::ExecuteState;

use super::executor::{operand, operand_id};
use super::Simulator;

fn fsign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

impl<'m> Simulator<'m> {
    pub(super) fn glsl_ext_inst(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let raw = operand(&op, 3)?;
        let inst = GlslOp::try_from(raw).map_err(|_| Trap::UnsupportedExtOp(raw))?;

        match inst {
            // basic math
            GlslOp::Round => self.glsl_unary(op, f32::round),
            GlslOp::RoundEven => self.glsl_unary(op, f32::round_ties_even),
            GlslOp::Trunc => self.glsl_unary(op, f32::trunc),
            GlslOp::FAbs => self.glsl_unary(op, f32::abs),
            GlslOp::SAbs => self.glsl_unary_int(op, i32::wrapping_abs),
            GlslOp::FSign => self.glsl_unary(op, fsign),
            GlslOp::SSign => self.glsl_unary_int(op, i32::signum),
            GlslOp::Floor => self.glsl_unary(op, f32::floor),
            GlslOp::Ceil => self.glsl_unary(op, f32::ceil),
            GlslOp::Fract => self.glsl_unary(op, |x| x - x.floor()),

            // trigonometry
            GlslOp::Radians => self.glsl_unary(op, f32::to_radians),
            GlslOp::Degrees => self.glsl_unary(op, f32::to_degrees),
            GlslOp::Sin => self.glsl_unary(op, f32::sin),
            GlslOp::Cos => self.glsl_unary(op, f32::cos),
            GlslOp::Tan => self.glsl_unary(op, f32::tan),
            GlslOp::Asin => self.glsl_unary(op, f32::asin),
            GlslOp::Acos => self.glsl_unary(op, f32::acos),
            GlslOp::Atan => self.glsl_unary(op, f32::atan),
            GlslOp::Sinh => self.glsl_unary(op, f32::sinh),
            GlslOp::Cosh => self.glsl_unary(op, f32::cosh),
            GlslOp::Tanh => self.glsl_unary(op, f32::tanh),
            GlslOp::Asinh => self.glsl_unary(op, f32::asinh),
            GlslOp::Acosh => self.glsl_unary(op, f32::acosh),
            GlslOp::Atanh => self.glsl_unary(op, f32::atanh),
            GlslOp::Atan2 => self.glsl_binary(op, f32::atan2),

            // exponential and power
            GlslOp::Pow => self.glsl_binary(op, f32::powf),
            GlslOp::Exp => self.glsl_unary(op, f32::exp),
            GlslOp::Log => self.glsl_unary(op, f32::ln),
            GlslOp::Exp2 => self.glsl_unary(op, f32::exp2),
            GlslOp::Log2 => self.glsl_unary(op, f32::log2),
            GlslOp::Sqrt => self.glsl_unary(op, f32::sqrt),
            GlslOp::InverseSqrt => self.glsl_unary(op, |x| 1.0 / x.sqrt()),

            // geometry
            GlslOp::Length => self.glsl_length(op),
            GlslOp::Distance => self.glsl_distance(op),
            GlslOp::Normalize => self.glsl_normalize(op),

            _ => Err(Trap::UnsupportedExtOp(raw)),
        }
    }

    fn glsl_unary(&mut self, op: OpView<'m>, f: impl Fn(f32) -> f32) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        if !slot.ty.is_float() {
            return Err(Trap::TypeMismatch(Op::ExtInst));
        }
        let a = self.reg(operand_id(&op, 4)?)?;
        let n = slot.ty.lanes();
        if a.lanes() != n {
            return Err(Trap::TypeMismatch(Op::ExtInst));
        }
        let mut res = slot.zeroed();
        for lane in 0..n {
            res.set_f32(lane, f(a.f32(lane)));
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    fn glsl_unary_int(
        &mut self,
        op: OpView<'m>,
        f: impl Fn(i32) -> i32,
    ) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        if !slot.ty.is_signed_int() {
            return Err(Trap::TypeMismatch(Op::ExtInst));
        }
        let a = self.reg(operand_id(&op, 4)?)?;
        let n = slot.ty.lanes();
        if a.lanes() != n {
            return Err(Trap::TypeMismatch(Op::ExtInst));
        }
        let mut res = slot.zeroed();
        for lane in 0..n {
            res.set_i32(lane, f(a.i32(lane)));
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    fn glsl_binary(
        &mut self,
        op: OpView<'m>,
        f: impl Fn(f32, f32) -> f32,
    ) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        if !slot.ty.is_float() {
            return Err(Trap::TypeMismatch(Op::ExtInst));
        }
        let a = self.reg(operand_id(&op, 4)?)?;
        let b = self.reg(operand_id(&op, 5)?)?;
        let n = slot.ty.lanes();
        if a.lanes() != n || b.lanes() != n {
            return Err(Trap::TypeMismatch(Op::ExtInst));
        }
        let mut res = slot.zeroed();
        for lane in 0..n {
            res.set_f32(lane, f(a.f32(lane), b.f32(lane)));
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    fn glsl_length(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        if !slot.ty.is_float() || slot.ty.lanes() != 1 {
            return Err(Trap::TypeMismatch(Op::ExtInst));
        }
        let v = self.reg(operand_id(&op, 4)?)?;
        let mut acc = 0.0f32;
        for lane in 0..v.lanes() {
            acc += v.f32(lane) * v.f32(lane);
        }
        let mut res = slot.zeroed();
        res.set_f32(0, acc.sqrt());
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    fn glsl_distance(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        if !slot.ty.is_float() || slot.ty.lanes() != 1 {
            return Err(Trap::TypeMismatch(Op::ExtInst));
        }
        let p0 = self.reg(operand_id(&op, 4)?)?;
        let p1 = self.reg(operand_id(&op, 5)?)?;
        if p0.lanes() != p1.lanes() {
            return Err(Trap::TypeMismatch(Op::ExtInst));
        }
        let mut acc = 0.0f32;
        for lane in 0..p0.lanes() {
            let diff = p0.f32(lane) - p1.f32(lane);
            acc += diff * diff;
        }
        let mut res = slot.zeroed();
        res.set_f32(0, acc.sqrt());
        self.put(res);
        Ok(ExecuteState::Proceed)
    }

    fn glsl_normalize(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let slot = self.result_slot(&op)?;
        if !slot.ty.is_float() {
            return Err(Trap::TypeMismatch(Op::ExtInst));
        }
        let v = self.reg(operand_id(&op, 4)?)?;
        let n = slot.ty.lanes();
        if v.lanes() != n {
            return Err(Trap::TypeMismatch(Op::ExtInst));
        }
        let mut acc = 0.0f32;
        for lane in 0..n {
            acc += v.f32(lane) * v.f32(lane);
        }
        let len = acc.sqrt();
        let mut res = slot.zeroed();
        for lane in 0..n {
            res.set_f32(lane, v.f32(lane) / len);
        }
        self.put(res);
        Ok(ExecuteState::Proceed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(2.5, 2.0; "halfway rounds to even down")]
    #[test_case(3.5, 4.0; "halfway rounds to even up")]
    #[test_case(-2.5, -2.0; "negative halfway rounds to even")]
    #[test_case(2.3, 2.0; "below halfway")]
    #[test_case(2.7, 3.0; "above halfway")]
    fn round_even(x: f32, expect: f32) {
        assert_eq!(f32::round_ties_even(x), expect);
    }

    #[test]
    fn fsign_covers_zero() {
        assert_eq!(fsign(7.25), 1.0);
        assert_eq!(fsign(-0.1), -1.0);
        assert_eq!(fsign(0.0), 0.0);
        assert_eq!(fsign(-0.0), 0.0);
    }
}
