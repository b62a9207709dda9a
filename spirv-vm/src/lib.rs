//! Software simulator for SPIR-V shader binaries.
//!
//! A [`module::Module`] decodes a binary into its type graph, constants,
//! variables, functions and entry points; an [`interpreter::Simulator`]
//! executes one shader invocation against it, one instruction per step, with
//! registers, a byte-addressable heap and a call stack the host can inspect
//! at any point.
//!
//! The module graph is immutable after loading and may back any number of
//! simulators; all per-invocation state lives inside the simulator.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(unused_must_use)]

pub mod call;
pub mod consts;
pub mod error;
pub mod interpreter;
pub mod module;
pub mod state;

mod util;

// Re-export the instruction-level crate the way hosts consume it.
#[doc(no_inline)]
pub use spirv_asm;

pub mod prelude {
    //! Everything a host needs to load and drive a shader.

    #[doc(no_inline)]
    pub use spirv_asm::{
        Assembler, Binary, BinaryError, BuiltIn, ExecutionModel, GlslOp, Id, Op, StorageClass,
    };

    pub use crate::error::{LoadError, Trap};
    pub use crate::interpreter::{SimPointer, Simulator};
    pub use crate::module::{Access, Module};
    pub use crate::state::ExecuteState;
}
