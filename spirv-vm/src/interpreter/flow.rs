//! Control flow: branches, switches, calls and returns.
//!
//! Branch targets are label addresses resolved through the module's label
//! map. Frame pushes and pops go through the frame stack only; nothing
//! caches a frame pointer across them.

use spirv_asm::{Id, OpView};

use crate::error::{ExecResult, Trap};
use crate::state::ExecuteState;

use super::executor::{operand, operand_id};
use super::Simulator;

impl<'m> Simulator<'m> {
    fn label_target(&self, label: Id) -> ExecResult<ExecuteState> {
        let addr = self
            .module
            .label_addr(label)
            .ok_or(Trap::UnknownLabel(label))?;
        Ok(ExecuteState::Jump(addr))
    }

    pub(super) fn op_branch(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        self.label_target(operand(&op, 0)?)
    }

    /// The condition register's first lane picks the label.
    pub(super) fn op_branch_conditional(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let cond = self.reg(operand_id(&op, 0)?)?;
        let label = if cond.bool(0) {
            operand(&op, 1)?
        } else {
            operand(&op, 2)?
        };
        self.label_target(label)
    }

    /// Linear scan of `(literal, label)` pairs; the default label is taken
    /// when no literal matches the selector's first lane.
    pub(super) fn op_switch(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let selector = self.reg(operand_id(&op, 0)?)?.u32(0);
        let mut target = operand(&op, 1)?;
        for pair in op.operands()[2..].chunks_exact(2) {
            if pair[0] == selector {
                target = pair[1];
                break;
            }
        }
        self.label_target(target)
    }

    pub(super) fn op_function_call(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let result_id = operand_id(&op, 1)?;
        let function_id = operand_id(&op, 2)?;
        let function = self
            .module
            .function_by_id(function_id)
            .ok_or(Trap::UnknownFunction(function_id))?;

        // Resume past the call once the callee returns.
        let return_addr = self.module.binary().next_addr(self.pc)?;
        let args = op.operands()[3..].to_vec();
        self.call_function(function, result_id, &args, Some(return_addr))?;
        Ok(ExecuteState::Jump(function.first_body))
    }

    /// Pop the current frame, reclaim its heap range, resume in the caller.
    /// Returning from the entry-point frame finishes the invocation; its
    /// frame stays in place so the host can still inspect registers.
    pub(super) fn op_return(&mut self) -> ExecResult<ExecuteState> {
        if self.frames.len() <= 1 {
            return Ok(ExecuteState::Finished);
        }
        let frame = self.frames.pop().expect("checked non-empty");
        self.heap.truncate(frame.heap_mark);
        let return_addr = frame
            .return_addr
            .ok_or(Trap::Malformed("return without a return address"))?;
        Ok(ExecuteState::Jump(return_addr))
    }

    /// Clone the returned register into the caller's frame under the
    /// caller-supplied result id, then return.
    pub(super) fn op_return_value(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let value = self.reg(operand_id(&op, 0)?)?;
        if self.frames.len() > 1 {
            let result_id = self.frames.last().expect("checked non-empty").return_id;
            let cloned = value.clone_as(result_id);
            let caller = self.frames.len() - 2;
            self.frames[caller].insert(cloned);
        }
        self.op_return()
    }
}
