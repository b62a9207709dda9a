//! Aggregate construction, extraction, insertion and shuffles.

mod common;

use common::*;
use spirv_asm::Op;
use spirv_vm::prelude::*;

const ID_STRUCT: u32 = 50;

/// `{ f0, f1, v0: vec4, v1: vec4 }` built from constants, then picked apart.
#[test]
fn structure_construct_extract_insert() {
    let mut p = ProgramBuilder::new();
    p.float_types();
    p.op(Op::TypeStruct, &[ID_STRUCT, ID_F32, ID_F32, ID_VEC4F, ID_VEC4F]);
    p.float_constant(58, 5.0);
    p.float_constant(59, 3.0);
    p.vec4f_constant(60, 61, [1.0, 2.0, 3.0, 4.0]);
    p.vec4f_constant(65, 66, [3.5, 6.6, 8.0, 11.0]);
    p.begin_main()
        .op(Op::CompositeConstruct, &[ID_STRUCT, 100, 58, 59, 60, 65])
        // .v0[3]
        .op(Op::CompositeExtract, &[ID_F32, 101, 100, 2, 3])
        // 5.0 into .v1[2]
        .op(Op::CompositeInsert, &[ID_STRUCT, 102, 58, 100, 3, 2])
        .op(Op::CompositeExtract, &[ID_VEC4F, 103, 102, 3])
        // untouched sibling member of the copy
        .op(Op::CompositeExtract, &[ID_VEC4F, 104, 102, 2])
        .op(Op::CompositeExtract, &[ID_F32, 105, 100, 0])
        .op(Op::CompositeExtract, &[ID_F32, 106, 100, 1])
        .end_main();
    let module = p.build();

    let mut sim = Simulator::new(&module, 0).unwrap();
    run_to_end(&mut sim);

    assert_f32_near(sim.register_by_id(101).unwrap().f32(0), 4.0);
    assert_reg_vec4f(&sim, 103, [3.5, 6.6, 5.0, 11.0]);
    assert_reg_vec4f(&sim, 104, [1.0, 2.0, 3.0, 4.0]);
    assert_f32_near(sim.register_by_id(105).unwrap().f32(0), 5.0);
    assert_f32_near(sim.register_by_id(106).unwrap().f32(0), 3.0);

    // the aggregate is 2 scalars + 2 vec4s
    assert_eq!(sim.register_by_id(100).unwrap().bytes().len(), 40);
}

/// Every leaf written by a construct comes back out unchanged.
#[test]
fn composite_round_trip() {
    let mut p = ProgramBuilder::new();
    p.float_types();
    p.vec4f_constant(60, 61, [0.25, -1.5, 42.0, 0.0]);
    p.begin_main()
        .op(Op::CompositeConstruct, &[ID_VEC4F, 100, 61, 62, 63, 64])
        .op(Op::CompositeExtract, &[ID_F32, 101, 100, 0])
        .op(Op::CompositeExtract, &[ID_F32, 102, 100, 1])
        .op(Op::CompositeExtract, &[ID_F32, 103, 100, 2])
        .op(Op::CompositeExtract, &[ID_F32, 104, 100, 3])
        .end_main();
    let module = p.build();

    let mut sim = Simulator::new(&module, 0).unwrap();
    run_to_end(&mut sim);

    for (reg, expect) in [(101, 0.25f32), (102, -1.5), (103, 42.0), (104, 0.0)] {
        assert_eq!(sim.register_by_id(reg).unwrap().f32(0), expect);
    }
}

/// A vector constructor accepts sub-vectors and scalars mixed, as long as
/// the declared lane count comes out exactly.
#[test]
fn vector_construct_from_subvector() {
    let mut p = ProgramBuilder::new();
    p.float_types();
    p.op(Op::TypeVector, &[90, ID_F32, 2]);
    p.float_constant(58, 7.0);
    p.float_constant(59, 9.0);
    p.op(Op::ConstantComposite, &[90, 91, 58, 59]);
    p.begin_main()
        .op(Op::CompositeConstruct, &[ID_VEC4F, 100, 91, 58, 59])
        .end_main();
    let module = p.build();

    let mut sim = Simulator::new(&module, 0).unwrap();
    run_to_end(&mut sim);
    assert_reg_vec4f(&sim, 100, [7.0, 9.0, 7.0, 9.0]);
}

#[test]
fn vector_shuffle_boundaries() {
    let mut p = ProgramBuilder::new();
    p.float_types();
    p.vec4f_constant(60, 61, [1.0, 2.0, 3.0, 4.0]);
    p.vec4f_constant(65, 66, [5.0, 6.0, 7.0, 8.0]);
    p.begin_main()
        // 0xffffffff leaves the lane undefined; >= 4 picks from vector 2
        .op(
            Op::VectorShuffle,
            &[ID_VEC4F, 100, 60, 65, 0xffff_ffff, 5, 2, 7],
        )
        .end_main();
    let module = p.build();

    let mut sim = Simulator::new(&module, 0).unwrap();
    run_to_end(&mut sim);

    let reg = sim.register_by_id(100).unwrap();
    // an undefined lane of a fresh register reads back as zero
    assert_eq!(reg.f32(0), 0.0);
    assert_eq!(reg.f32(1), 6.0);
    assert_eq!(reg.f32(2), 3.0);
    assert_eq!(reg.f32(3), 8.0);
}

#[test]
fn dynamic_vector_extract_and_insert() {
    let mut p = ProgramBuilder::new();
    p.float_types();
    p.int_types();
    p.vec4f_constant(60, 61, [1.0, 2.0, 3.0, 4.0]);
    p.float_constant(58, 50.0);
    p.int_constant(70, 2);
    p.begin_main()
        .op(Op::VectorExtractDynamic, &[ID_F32, 100, 60, 70])
        .op(Op::VectorInsertDynamic, &[ID_VEC4F, 101, 60, 58, 70])
        .end_main();
    let module = p.build();

    let mut sim = Simulator::new(&module, 0).unwrap();
    run_to_end(&mut sim);

    assert_eq!(sim.register_by_id(100).unwrap().f32(0), 3.0);
    assert_reg_vec4f(&sim, 101, [1.0, 2.0, 50.0, 4.0]);
}

#[test]
fn copy_object_duplicates_bytes() {
    let mut p = ProgramBuilder::new();
    p.float_types();
    p.vec4f_constant(60, 61, [1.0, 2.0, 3.0, 4.0]);
    p.begin_main()
        .op(Op::CopyObject, &[ID_VEC4F, 100, 60])
        .end_main();
    let module = p.build();

    let mut sim = Simulator::new(&module, 0).unwrap();
    run_to_end(&mut sim);

    let copy = sim.register_by_id(100).unwrap();
    let src = sim.register_by_id(60).unwrap();
    assert_eq!(copy.bytes(), src.bytes());
}
