//! Extended-instruction dispatch.
//!
//! `OpExtInstImport` ids are bound to implementations at simulator init;
//! `OpExtInst` forwards to the bound set.

use spirv_asm::OpView;

use crate::error::{ExecResult, Trap};
use crate::state::ExecuteState;

use super::executor::operand_id;
use super::Simulator;

/// An extended-instruction set the engine can execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ExtSet {
    /// The GLSL.std.450 standard library.
    GlslStd450,
}

impl<'m> Simulator<'m> {
    pub(super) fn op_ext_inst(&mut self, op: OpView<'m>) -> ExecResult<ExecuteState> {
        let set_id = operand_id(&op, 2)?;
        match self.ext_sets.get(&set_id) {
            Some(ExtSet::GlslStd450) => self.glsl_ext_inst(op),
            None => Err(Trap::UnknownId(set_id)),
        }
    }
}
