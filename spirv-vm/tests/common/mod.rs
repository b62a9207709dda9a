//! Shared program-building fixtures for the scenario tests.
//!
//! Tests assemble small modules with a fixed id convention:
//! `2` void, `3` void-function type, `4` the `main` function, `5` its
//! label, `10..` float types, `20..` signed-integer types, `30..`
//! unsigned-integer types, `80..` booleans, `40..` pipeline variables.

#![allow(dead_code)]

use spirv_asm::{Assembler, Binary, Decoration, Op, StorageClass};
use spirv_vm::module::Module;
use spirv_vm::prelude::Simulator;

pub const ID_GLSL: u32 = 1;
pub const ID_VOID: u32 = 2;
pub const ID_FN_VOID: u32 = 3;
pub const ID_MAIN: u32 = 4;
pub const ID_MAIN_LABEL: u32 = 5;

pub const ID_F32: u32 = 10;
pub const ID_VEC4F: u32 = 11;
pub const ID_MAT4F: u32 = 12;
pub const ID_PTR_IN_F32: u32 = 13;
pub const ID_PTR_IN_VEC4F: u32 = 14;
pub const ID_PTR_OUT_F32: u32 = 15;
pub const ID_PTR_OUT_VEC4F: u32 = 16;
pub const ID_PTR_FN_F32: u32 = 17;

pub const ID_I32: u32 = 20;
pub const ID_VEC4I: u32 = 21;
pub const ID_U32: u32 = 30;
pub const ID_VEC4U: u32 = 31;

pub const ID_BOOL: u32 = 80;
pub const ID_VEC4B: u32 = 81;

pub struct ProgramBuilder {
    pub asm: Assembler,
}

impl ProgramBuilder {
    /// Header, capability, memory model and a `main` vertex entry point.
    pub fn new() -> Self {
        let mut asm = Assembler::new(1, 0);
        asm.op(Op::Capability, &[1]); // Shader
        asm.op(Op::MemoryModel, &[0, 0]); // Logical / Simple
        asm.op_str_extra(Op::EntryPoint, &[0, ID_MAIN], "main", &[]);
        ProgramBuilder { asm }
    }

    /// Same, with the GLSL.std.450 set imported as id 1.
    pub fn with_glsl() -> Self {
        let mut builder = ProgramBuilder::new();
        // imports belong before the entry point, but the loader indexes by
        // kind, so appending here keeps the fixtures simple
        builder.asm.op_str(Op::ExtInstImport, &[ID_GLSL], "GLSL.std.450");
        builder
    }

    pub fn decorate_location(&mut self, target: u32, location: u32) -> &mut Self {
        self.asm
            .op(Op::Decorate, &[target, Decoration::Location as u32, location]);
        self
    }

    pub fn decorate_member_location(&mut self, ty: u32, member: u32, location: u32) -> &mut Self {
        self.asm.op(
            Op::MemberDecorate,
            &[ty, member, Decoration::Location as u32, location],
        );
        self
    }

    /// Float scalar/vector/matrix types and the Input/Output/Function
    /// pointers to them.
    pub fn float_types(&mut self) -> &mut Self {
        self.asm.op(Op::TypeFloat, &[ID_F32, 32]);
        self.asm.op(Op::TypeVector, &[ID_VEC4F, ID_F32, 4]);
        self.asm.op(Op::TypeMatrix, &[ID_MAT4F, ID_VEC4F, 4]);
        self.asm.op(
            Op::TypePointer,
            &[ID_PTR_IN_F32, StorageClass::Input as u32, ID_F32],
        );
        self.asm.op(
            Op::TypePointer,
            &[ID_PTR_IN_VEC4F, StorageClass::Input as u32, ID_VEC4F],
        );
        self.asm.op(
            Op::TypePointer,
            &[ID_PTR_OUT_F32, StorageClass::Output as u32, ID_F32],
        );
        self.asm.op(
            Op::TypePointer,
            &[ID_PTR_OUT_VEC4F, StorageClass::Output as u32, ID_VEC4F],
        );
        self.asm.op(
            Op::TypePointer,
            &[ID_PTR_FN_F32, StorageClass::Function as u32, ID_F32],
        );
        self
    }

    pub fn int_types(&mut self) -> &mut Self {
        self.asm.op(Op::TypeInt, &[ID_I32, 32, 1]);
        self.asm.op(Op::TypeVector, &[ID_VEC4I, ID_I32, 4]);
        self.asm.op(Op::TypeInt, &[ID_U32, 32, 0]);
        self.asm.op(Op::TypeVector, &[ID_VEC4U, ID_U32, 4]);
        self
    }

    pub fn bool_types(&mut self) -> &mut Self {
        self.asm.op(Op::TypeBool, &[ID_BOOL]);
        self.asm.op(Op::TypeVector, &[ID_VEC4B, ID_BOOL, 4]);
        self
    }

    pub fn float_constant(&mut self, id: u32, value: f32) -> &mut Self {
        self.asm.op(Op::Constant, &[ID_F32, id, value.to_bits()]);
        self
    }

    pub fn int_constant(&mut self, id: u32, value: i32) -> &mut Self {
        self.asm.op(Op::Constant, &[ID_I32, id, value as u32]);
        self
    }

    pub fn uint_constant(&mut self, id: u32, value: u32) -> &mut Self {
        self.asm.op(Op::Constant, &[ID_U32, id, value]);
        self
    }

    /// Four scalar float constants plus the composite vector built of them.
    pub fn vec4f_constant(&mut self, id: u32, scalar_base: u32, v: [f32; 4]) -> &mut Self {
        for (i, x) in v.iter().enumerate() {
            self.float_constant(scalar_base + i as u32, *x);
        }
        self.asm.op(
            Op::ConstantComposite,
            &[
                ID_VEC4F,
                id,
                scalar_base,
                scalar_base + 1,
                scalar_base + 2,
                scalar_base + 3,
            ],
        );
        self
    }

    pub fn vec4i_constant(&mut self, id: u32, scalar_base: u32, v: [i32; 4]) -> &mut Self {
        for (i, x) in v.iter().enumerate() {
            self.int_constant(scalar_base + i as u32, *x);
        }
        self.asm.op(
            Op::ConstantComposite,
            &[
                ID_VEC4I,
                id,
                scalar_base,
                scalar_base + 1,
                scalar_base + 2,
                scalar_base + 3,
            ],
        );
        self
    }

    pub fn variable(&mut self, ptr_type: u32, id: u32, storage: StorageClass) -> &mut Self {
        self.asm.op(Op::Variable, &[ptr_type, id, storage as u32]);
        self
    }

    /// `OpFunction`(void) + the first label of `main`.
    pub fn begin_main(&mut self) -> &mut Self {
        self.asm.op(Op::TypeVoid, &[ID_VOID]);
        self.asm.op(Op::TypeFunction, &[ID_FN_VOID, ID_VOID]);
        self.asm
            .op(Op::Function, &[ID_VOID, ID_MAIN, 0, ID_FN_VOID]);
        self.asm.op(Op::Label, &[ID_MAIN_LABEL]);
        self
    }

    pub fn op(&mut self, op: Op, operands: &[u32]) -> &mut Self {
        self.asm.op(op, operands);
        self
    }

    pub fn end_main(&mut self) -> &mut Self {
        self.asm.op(Op::Return, &[]);
        self.asm.op(Op::FunctionEnd, &[]);
        self
    }

    pub fn build(self) -> Module {
        Module::load(Binary::from_words(self.asm.into_words()).expect("valid words"))
            .expect("module loads")
    }
}

/// Little-endian bytes of four floats, as a host would bind them.
pub fn vec4f_bytes(v: [f32; 4]) -> Vec<u8> {
    v.iter().flat_map(|x| x.to_le_bytes()).collect()
}

/// Step until completion, insisting no fault latched on the way.
pub fn run_to_end(sim: &mut Simulator<'_>) {
    while !sim.finished() {
        sim.step();
        if let Some(trap) = sim.error() {
            panic!("unexpected fault: {trap}");
        }
    }
}

pub fn assert_f32_near(actual: f32, expect: f32) {
    assert!(
        (actual - expect).abs() <= 1e-5 * expect.abs().max(1.0),
        "expected {expect}, got {actual}"
    );
}

/// Assert a register's four float lanes within 1e-5.
pub fn assert_reg_vec4f(sim: &Simulator<'_>, id: u32, expect: [f32; 4]) {
    let reg = sim.register_by_id(id).unwrap_or_else(|| panic!("no register %{id}"));
    for (lane, want) in expect.iter().enumerate() {
        assert_f32_near(reg.f32(lane), *want);
    }
}

/// Assert a register's four signed lanes exactly.
pub fn assert_reg_vec4i(sim: &Simulator<'_>, id: u32, expect: [i32; 4]) {
    let reg = sim.register_by_id(id).unwrap_or_else(|| panic!("no register %{id}"));
    for (lane, want) in expect.iter().enumerate() {
        assert_eq!(reg.i32(lane), *want, "lane {lane}");
    }
}
