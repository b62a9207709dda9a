//! Function calls, returns, branches and switches.

mod common;

use common::*;
use spirv_asm::{Op, StorageClass};
use spirv_vm::prelude::*;

const ID_FN_F32_F32: u32 = 18;
const ID_FN_F32: u32 = 19;
const ID_SQUARE: u32 = 6;
const ID_LOCAL_SUM: u32 = 7;

/// The call scenario: `main` stores to an output, calls `f(x) = x * x`,
/// calls a function with a mutated local, then reads the output back.
#[test]
fn function_calls_and_locals() {
    let mut p = ProgramBuilder::new();
    p.decorate_location(42, 0);
    p.float_types();
    p.float_constant(70, 33.7);
    p.float_constant(71, 5.5);
    p.variable(ID_PTR_OUT_F32, 42, StorageClass::Output);
    p.op(Op::TypeFunction, &[ID_FN_F32_F32, ID_F32, ID_F32]);
    p.op(Op::TypeFunction, &[ID_FN_F32, ID_F32]);
    p.begin_main()
        .op(Op::Store, &[42, 70])
        .op(Op::FunctionCall, &[ID_F32, 100, ID_SQUARE, 71])
        .op(Op::FunctionCall, &[ID_F32, 101, ID_LOCAL_SUM])
        .op(Op::Load, &[ID_F32, 102, 42])
        .end_main();

    // f(x) = x * x
    p.op(Op::Function, &[ID_F32, ID_SQUARE, 0, ID_FN_F32_F32])
        .op(Op::FunctionParameter, &[ID_F32, 8])
        .op(Op::Label, &[9])
        .op(Op::FMul, &[ID_F32, 110, 8, 8])
        .op(Op::ReturnValue, &[110])
        .op(Op::FunctionEnd, &[]);

    // g() = { local = 5.5; local = local + 5.5; return local * 5.5; }
    p.op(Op::Function, &[ID_F32, ID_LOCAL_SUM, 0, ID_FN_F32])
        .op(Op::Label, &[20])
        .op(Op::Variable, &[ID_PTR_FN_F32, 21, StorageClass::Function as u32])
        .op(Op::Store, &[21, 71])
        .op(Op::Load, &[ID_F32, 120, 21])
        .op(Op::FAdd, &[ID_F32, 121, 120, 71])
        .op(Op::Store, &[21, 121])
        .op(Op::Load, &[ID_F32, 122, 21])
        .op(Op::FMul, &[ID_F32, 123, 122, 71])
        .op(Op::ReturnValue, &[123])
        .op(Op::FunctionEnd, &[]);

    let module = p.build();

    // the prologue scan found the parameter and the local
    let square = module.function_by_id(ID_SQUARE).unwrap();
    assert_eq!(square.params, vec![8]);
    assert!(square.locals.is_empty());
    let local_sum = module.function_by_id(ID_LOCAL_SUM).unwrap();
    assert_eq!(local_sum.locals, vec![21]);

    let mut sim = Simulator::new(&module, 0).unwrap();
    let heap_mark = sim.heap().free_start();
    run_to_end(&mut sim);

    assert_f32_near(sim.register_by_id(100).unwrap().f32(0), 30.25);
    assert_f32_near(sim.register_by_id(101).unwrap().f32(0), 60.5);
    assert_f32_near(sim.register_by_id(102).unwrap().f32(0), 33.7);

    // the callee's local was reclaimed at frame pop
    assert_eq!(sim.heap().free_start(), heap_mark);

    // and the output slot still holds what main stored
    let out = sim
        .interface_data(StorageClass::Output, Access::Location(0))
        .unwrap();
    assert_f32_near(f32::from_le_bytes([out[0], out[1], out[2], out[3]]), 33.7);
}

#[test]
fn conditional_branch_picks_the_true_label() {
    let mut p = ProgramBuilder::new();
    p.decorate_location(42, 0);
    p.float_types();
    p.bool_types();
    p.op(Op::ConstantTrue, &[ID_BOOL, 82]);
    p.float_constant(70, 1.0);
    p.float_constant(71, 2.0);
    p.variable(ID_PTR_OUT_F32, 42, StorageClass::Output);
    p.begin_main()
        .op(Op::BranchConditional, &[82, 90, 91])
        .op(Op::Label, &[90])
        .op(Op::Store, &[42, 70])
        .op(Op::Branch, &[92])
        .op(Op::Label, &[91])
        .op(Op::Store, &[42, 71])
        .op(Op::Branch, &[92])
        .op(Op::Label, &[92])
        .end_main();
    let module = p.build();

    let mut sim = Simulator::new(&module, 0).unwrap();
    run_to_end(&mut sim);

    let out = sim
        .interface_data(StorageClass::Output, Access::Location(0))
        .unwrap();
    assert_eq!(f32::from_le_bytes([out[0], out[1], out[2], out[3]]), 1.0);
}

#[test]
fn switch_matches_a_case_and_falls_back_to_default() {
    for (selector, expect) in [(2i32, 20.0f32), (7, 99.0)] {
        let mut p = ProgramBuilder::new();
        p.decorate_location(42, 0);
        p.float_types();
        p.int_types();
        p.int_constant(60, selector);
        p.float_constant(70, 10.0);
        p.float_constant(71, 20.0);
        p.float_constant(72, 99.0);
        p.variable(ID_PTR_OUT_F32, 42, StorageClass::Output);
        p.begin_main()
            .op(Op::Switch, &[60, 93, 1, 90, 2, 91])
            .op(Op::Label, &[90])
            .op(Op::Store, &[42, 70])
            .op(Op::Branch, &[92])
            .op(Op::Label, &[91])
            .op(Op::Store, &[42, 71])
            .op(Op::Branch, &[92])
            .op(Op::Label, &[93])
            .op(Op::Store, &[42, 72])
            .op(Op::Branch, &[92])
            .op(Op::Label, &[92])
            .end_main();
        let module = p.build();

        let mut sim = Simulator::new(&module, 0).unwrap();
        run_to_end(&mut sim);

        let out = sim
            .interface_data(StorageClass::Output, Access::Location(0))
            .unwrap();
        assert_eq!(
            f32::from_le_bytes([out[0], out[1], out[2], out[3]]),
            expect,
            "selector {selector}"
        );
    }
}

#[test]
fn unsupported_opcode_latches_and_disables_stepping() {
    let mut p = ProgramBuilder::new();
    p.float_types();
    p.begin_main().op(Op::Kill, &[]).end_main();
    let module = p.build();

    let mut sim = Simulator::new(&module, 0).unwrap();
    sim.step();
    assert_eq!(sim.error(), Some(&Trap::UnsupportedOpcode(Op::Kill)));
    assert!(!sim.finished());

    let pc = sim.pc();
    sim.step();
    sim.step();
    assert_eq!(sim.pc(), pc);
    assert!(!sim.finished());
}

/// Merge/lifetime markers execute as no-ops.
#[test]
fn structured_control_markers_are_no_ops() {
    let mut p = ProgramBuilder::new();
    p.float_types();
    p.vec4f_constant(60, 61, [1.0, 2.0, 3.0, 4.0]);
    p.begin_main()
        .op(Op::SelectionMerge, &[92, 0])
        .op(Op::Nop, &[])
        .op(Op::Label, &[92])
        .op(Op::FAdd, &[ID_VEC4F, 100, 60, 60])
        .end_main();
    let module = p.build();

    let mut sim = Simulator::new(&module, 0).unwrap();
    run_to_end(&mut sim);
    assert_reg_vec4f(&sim, 100, [2.0, 4.0, 6.0, 8.0]);
}
