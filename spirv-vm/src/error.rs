//! Error taxonomy of the simulator.
//!
//! Runtime faults are [`Trap`]s. Handlers propagate them with `?`; the
//! simulator facade latches the first one and refuses to step further, so a
//! host only ever observes the earliest fault of a run.

use spirv_asm::{BinaryError, Id, Op, StorageClass};

use crate::module::Access;

/// Result of an internal execution step.
pub type ExecResult<T> = Result<T, Trap>;

/// A runtime fault. Latched once per simulator; see [`crate::interpreter::Simulator::error`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Trap {
    /// The instruction kind is recognized but has no implementation.
    #[error("unsupported opcode [{0}]")]
    UnsupportedOpcode(Op),
    /// The raw instruction kind is not part of the instruction set at all.
    #[error("unknown opcode kind [{0}]")]
    UnknownOpcode(u16),
    /// The module imports an extended instruction set the engine cannot bind.
    #[error("unsupported extension [{0}]")]
    UnsupportedExtension(String),
    /// `OpExtInst` named a GLSL.std.450 instruction with no implementation.
    #[error("unsupported GLSL.std.450 instruction [{0}]")]
    UnsupportedExtOp(u32),
    /// Operand or result types do not fit the named instruction.
    #[error("type mismatch in {0}")]
    TypeMismatch(Op),
    /// `associate_data` was called for an interface slot the module never
    /// published.
    #[error("no interface pointer for {kind:?} {access:?}")]
    MissingBinding {
        /// Storage class the host asked for.
        kind: StorageClass,
        /// Access descriptor the host asked for.
        access: Access,
    },
    /// Host data does not fit the destination interface slot.
    #[error("{len} bytes do not fit an interface slot of {cap} bytes")]
    DataTooLarge {
        /// Bytes offered by the host.
        len: usize,
        /// Capacity of the slot.
        cap: usize,
    },
    /// The module has no entry point at the requested index.
    #[error("no entry point at index {0}")]
    NoSuchEntryPoint(usize),
    /// No register, constant or variable is bound to this id.
    #[error("unknown id [%{0}]")]
    UnknownId(Id),
    /// `OpFunctionCall` named an id the function table does not contain.
    #[error("unknown function [%{0}]")]
    UnknownFunction(Id),
    /// A branch named a label id with no `OpLabel` in the module.
    #[error("unknown label [%{0}]")]
    UnknownLabel(Id),
    /// An instruction referenced a type id the module never defined.
    #[error("unknown type [%{0}]")]
    UnknownType(Id),
    /// Integer division or remainder with a zero divisor.
    #[error("division by zero in {0}")]
    DivisionByZero(Op),
    /// A branch target fell outside the instruction stream.
    #[error("branch target (word {0}) outside the instruction stream")]
    JumpOutOfRange(usize),
    /// Heap access outside the allocated range.
    #[error("heap access of {len} bytes at offset {offset} exceeds {heap} allocated bytes")]
    HeapOutOfRange {
        /// First byte of the access.
        offset: usize,
        /// Length of the access.
        len: usize,
        /// Allocated heap size.
        heap: usize,
    },
    /// The instruction itself is malformed (missing operands, bad index, ...).
    #[error("malformed instruction: {0}")]
    Malformed(&'static str),
    /// The word stream broke under the cursor.
    #[error(transparent)]
    Binary(#[from] BinaryError),
}

/// Why a binary could not be turned into a module.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadError {
    /// The raw words were rejected before any decoding.
    #[error(transparent)]
    Binary(#[from] BinaryError),
    /// An entry point's function id has no `OpFunction`.
    #[error("entry point [%{0}] does not name a function")]
    UnresolvedEntryPoint(Id),
    /// A type kept referencing ids that never became available.
    #[error("type [%{0}] references ids that are never defined")]
    UnresolvedType(Id),
    /// A constant kept referencing ids that never became available.
    #[error("constant [%{0}] references ids that are never defined")]
    UnresolvedConstant(Id),
    /// `OpTypeArray` named a length that is not an integer constant.
    #[error("array type [%{0}] length is not an integer constant")]
    BadArrayLength(Id),
    /// An `OpVariable` result type is not a pointer.
    #[error("variable [%{0}] is not pointer-typed")]
    NonPointerVariable(Id),
    /// A function body ended without `OpFunctionEnd`.
    #[error("function [%{0}] has no end")]
    UnterminatedFunction(Id),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_culprit() {
        assert_eq!(
            Trap::UnsupportedOpcode(Op::Kill).to_string(),
            "unsupported opcode [OpKill]"
        );
        assert_eq!(Trap::UnknownId(33).to_string(), "unknown id [%33]");
        assert_eq!(
            Trap::UnsupportedExtension("OpenCL.std".into()).to_string(),
            "unsupported extension [OpenCL.std]"
        );
        assert_eq!(
            LoadError::UnresolvedEntryPoint(4).to_string(),
            "entry point [%4] does not name a function"
        );
    }
}
