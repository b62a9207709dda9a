//! Instruction fetch and dispatch.

use tracing::trace;

use spirv_asm::{Id, Op, OpView};

use crate::error::{ExecResult, Trap};
use crate::state::ExecuteState;

use super::{alu, Simulator};

/// Fetch an operand word or fault.
pub(crate) fn operand(op: &OpView<'_>, index: usize) -> ExecResult<u32> {
    op.operand(index).ok_or(Trap::Malformed("missing instruction operand"))
}

/// Fetch an operand that names an id.
pub(crate) fn operand_id(op: &OpView<'_>, index: usize) -> ExecResult<Id> {
    operand(op, index)
}

impl<'m> Simulator<'m> {
    /// Decode and execute the instruction under the cursor.
    pub(crate) fn execute_current(&mut self) -> ExecResult<ExecuteState> {
        let op = self.module.binary().op_at(self.pc)?;
        let kind = op.op().ok_or(Trap::UnknownOpcode(op.kind_raw()))?;
        trace!(pc = self.pc, op = %kind, "execute");

        match kind {
            // execution no-ops
            Op::Nop
            | Op::Label
            | Op::LoopMerge
            | Op::SelectionMerge
            | Op::Unreachable
            | Op::LifetimeStart
            | Op::LifetimeStop => Ok(ExecuteState::Proceed),

            // extended instructions
            Op::ExtInst => self.op_ext_inst(op),

            // memory
            Op::Load => self.op_load(op),
            Op::Store => self.op_store(op),
            Op::AccessChain => self.op_access_chain(op),

            // functions
            Op::FunctionCall => self.op_function_call(op),
            Op::Return => self.op_return(),
            Op::ReturnValue => self.op_return_value(op),

            // conversions
            Op::ConvertFToU => self.op_convert_f_to_u(op),
            Op::ConvertFToS => self.op_convert_f_to_s(op),
            Op::ConvertSToF => self.op_convert_s_to_f(op),
            Op::ConvertUToF => self.op_convert_u_to_f(op),
            Op::UConvert => self.op_u_convert(op),
            Op::SConvert => self.op_s_convert(op),
            Op::FConvert => self.op_f_convert(op),
            Op::ConvertPtrToU => self.op_convert_ptr_to_u(op),
            Op::SatConvertSToU => self.op_sat_convert_s_to_u(op),
            Op::SatConvertUToS => self.op_sat_convert_u_to_s(op),
            Op::ConvertUToPtr => self.op_convert_u_to_ptr(op),

            // composites
            Op::VectorExtractDynamic => self.op_vector_extract_dynamic(op),
            Op::VectorInsertDynamic => self.op_vector_insert_dynamic(op),
            Op::VectorShuffle => self.op_vector_shuffle(op),
            Op::CompositeConstruct => self.op_composite_construct(op),
            Op::CompositeExtract => self.op_composite_extract(op),
            Op::CompositeInsert => self.op_composite_insert(op),
            Op::CopyObject => self.op_copy_object(op),
            Op::Transpose => self.op_transpose(op),

            // arithmetic
            Op::SNegate => self.op_s_negate(op),
            Op::FNegate => self.op_f_negate(op),
            Op::IAdd => self.int_binop(op, kind, i32::wrapping_add),
            Op::ISub => self.int_binop(op, kind, i32::wrapping_sub),
            Op::IMul => self.int_binop(op, kind, i32::wrapping_mul),
            Op::FAdd => self.float_binop(op, kind, |a, b| a + b),
            Op::FSub => self.float_binop(op, kind, |a, b| a - b),
            Op::FMul => self.float_binop(op, kind, |a, b| a * b),
            Op::FDiv => self.float_binop(op, kind, |a, b| a / b),
            Op::UDiv => self.uint_divop(op, kind, u32::checked_div),
            Op::SDiv => self.sint_divop(op, kind, |a, b| (b != 0).then(|| a.wrapping_div(b))),
            Op::UMod => self.uint_divop(op, kind, u32::checked_rem),
            Op::SRem => self.sint_divop(op, kind, |a, b| (b != 0).then(|| a.wrapping_rem(b))),
            Op::SMod => self.sint_divop(op, kind, |a, b| (b != 0).then(|| alu::smod(a, b))),
            Op::FRem => self.float_binop(op, kind, alu::frem),
            Op::FMod => self.float_binop(op, kind, alu::fmod),
            Op::VectorTimesScalar => self.scale_op(op, kind),
            Op::MatrixTimesScalar => self.scale_op(op, kind),
            Op::VectorTimesMatrix => self.op_vector_times_matrix(op),
            Op::MatrixTimesVector => self.op_matrix_times_vector(op),
            Op::MatrixTimesMatrix => self.op_matrix_times_matrix(op),
            Op::OuterProduct => self.op_outer_product(op),
            Op::Dot => self.op_dot(op),

            // bit manipulation
            Op::ShiftRightLogical => self.bit_binop(op, kind, u32::wrapping_shr),
            Op::ShiftRightArithmetic => {
                self.bit_binop(op, kind, |a, s| (a as i32).wrapping_shr(s) as u32)
            }
            Op::ShiftLeftLogical => self.bit_binop(op, kind, u32::wrapping_shl),
            Op::BitwiseOr => self.bit_binop(op, kind, |a, b| a | b),
            Op::BitwiseXor => self.bit_binop(op, kind, |a, b| a ^ b),
            Op::BitwiseAnd => self.bit_binop(op, kind, |a, b| a & b),
            Op::Not => self.bit_unop(op, kind, |a| !a),
            Op::BitFieldInsert => self.op_bit_field_insert(op),
            Op::BitFieldSExtract => self.op_bit_field_s_extract(op),
            Op::BitFieldUExtract => self.op_bit_field_u_extract(op),
            Op::BitReverse => self.bit_unop(op, kind, u32::reverse_bits),
            Op::BitCount => self.bit_unop(op, kind, u32::count_ones),

            // relational and logical
            Op::Any => self.op_any(op),
            Op::All => self.op_all(op),
            Op::IsNan => self.float_pred(op, kind, f32::is_nan),
            Op::IsInf => self.float_pred(op, kind, f32::is_infinite),
            Op::IsFinite => self.float_pred(op, kind, f32::is_finite),
            Op::IsNormal => self.float_pred(op, kind, f32::is_normal),
            Op::SignBitSet => self.float_pred(op, kind, f32::is_sign_negative),
            Op::LessOrGreater => self.float_cmp(op, kind, true, |a, b| a != b),
            Op::Ordered => self.float_cmp(op, kind, true, |_, _| true),
            Op::Unordered => self.float_cmp(op, kind, false, |_, _| false),
            Op::LogicalEqual => self.bool_binop(op, kind, |a, b| a == b),
            Op::LogicalNotEqual => self.bool_binop(op, kind, |a, b| a != b),
            Op::LogicalOr => self.bool_binop(op, kind, |a, b| a || b),
            Op::LogicalAnd => self.bool_binop(op, kind, |a, b| a && b),
            Op::LogicalNot => self.op_logical_not(op),
            Op::Select => self.op_select(op),
            Op::IEqual => self.int_cmp(op, kind, |a, b| a == b),
            Op::INotEqual => self.int_cmp(op, kind, |a, b| a != b),
            Op::UGreaterThan => self.int_cmp(op, kind, |a, b| a > b),
            Op::UGreaterThanEqual => self.int_cmp(op, kind, |a, b| a >= b),
            Op::ULessThan => self.int_cmp(op, kind, |a, b| a < b),
            Op::ULessThanEqual => self.int_cmp(op, kind, |a, b| a <= b),
            Op::SGreaterThan => self.sint_cmp(op, kind, |a, b| a > b),
            Op::SGreaterThanEqual => self.sint_cmp(op, kind, |a, b| a >= b),
            Op::SLessThan => self.sint_cmp(op, kind, |a, b| a < b),
            Op::SLessThanEqual => self.sint_cmp(op, kind, |a, b| a <= b),
            Op::FOrdEqual => self.float_cmp(op, kind, true, |a, b| a == b),
            Op::FUnordEqual => self.float_cmp(op, kind, false, |a, b| a == b),
            Op::FOrdNotEqual => self.float_cmp(op, kind, true, |a, b| a != b),
            Op::FUnordNotEqual => self.float_cmp(op, kind, false, |a, b| a != b),
            Op::FOrdLessThan => self.float_cmp(op, kind, true, |a, b| a < b),
            Op::FUnordLessThan => self.float_cmp(op, kind, false, |a, b| a < b),
            Op::FOrdGreaterThan => self.float_cmp(op, kind, true, |a, b| a > b),
            Op::FUnordGreaterThan => self.float_cmp(op, kind, false, |a, b| a > b),
            Op::FOrdLessThanEqual => self.float_cmp(op, kind, true, |a, b| a <= b),
            Op::FUnordLessThanEqual => self.float_cmp(op, kind, false, |a, b| a <= b),
            Op::FOrdGreaterThanEqual => self.float_cmp(op, kind, true, |a, b| a >= b),
            Op::FUnordGreaterThanEqual => self.float_cmp(op, kind, false, |a, b| a >= b),

            // control flow
            Op::Branch => self.op_branch(op),
            Op::BranchConditional => self.op_branch_conditional(op),
            Op::Switch => self.op_switch(op),

            other => Err(Trap::UnsupportedOpcode(other)),
        }
    }
}
