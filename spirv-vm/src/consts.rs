//! Simulator parameters.

/// Bytes per register lane; every supported scalar is 32 bits wide.
pub const LANE_SIZE: usize = 4;

/// Heap allocations are rounded up to this many bytes.
pub const HEAP_ALIGN: usize = 8;

/// Entry point used when a host does not pick one explicitly.
pub const DEFAULT_ENTRY_POINT: usize = 0;

static_assertions::const_assert!(HEAP_ALIGN.is_power_of_two());
static_assertions::const_assert_eq!(LANE_SIZE, spirv_asm::WORD_SIZE);
