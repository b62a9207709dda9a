//! Enumerated operand values used by the instructions the engine consumes.

use num_enum::TryFromPrimitive;

/// Memory region a variable lives in.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum StorageClass {
    UniformConstant = 0,
    Input = 1,
    Uniform = 2,
    Output = 3,
    Workgroup = 4,
    CrossWorkgroup = 5,
    Private = 6,
    Function = 7,
    Generic = 8,
    PushConstant = 9,
    AtomicCounter = 10,
    Image = 11,
    StorageBuffer = 12,
}

/// Pipeline stage an entry point runs as.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum ExecutionModel {
    Vertex = 0,
    TessellationControl = 1,
    TessellationEvaluation = 2,
    Geometry = 3,
    Fragment = 4,
    GLCompute = 5,
    Kernel = 6,
}

/// Annotation kinds the loader inspects. Only a subset influences the
/// engine (`ColMajor`, `BuiltIn`, `Location`); the rest is carried so
/// decorations decode without loss.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum Decoration {
    RelaxedPrecision = 0,
    SpecId = 1,
    Block = 2,
    BufferBlock = 3,
    RowMajor = 4,
    ColMajor = 5,
    ArrayStride = 6,
    MatrixStride = 7,
    GlslShared = 8,
    GlslPacked = 9,
    CPacked = 10,
    BuiltIn = 11,
    NoPerspective = 13,
    Flat = 14,
    Patch = 15,
    Centroid = 16,
    Sample = 17,
    Invariant = 18,
    Restrict = 19,
    Aliased = 20,
    Volatile = 21,
    Constant = 22,
    Coherent = 23,
    NonWritable = 24,
    NonReadable = 25,
    Uniform = 26,
    SaturatedConversion = 28,
    Stream = 29,
    Location = 30,
    Component = 31,
    Index = 32,
    Binding = 33,
    DescriptorSet = 34,
    Offset = 35,
    XfbBuffer = 36,
    XfbStride = 37,
    FuncParamAttr = 38,
    FpRoundingMode = 39,
    FpFastMathMode = 40,
    LinkageAttributes = 41,
    NoContraction = 42,
    InputAttachmentIndex = 43,
    Alignment = 44,
}

/// Builtin pipeline variables a host may bind by name instead of location.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum BuiltIn {
    Position = 0,
    PointSize = 1,
    ClipDistance = 3,
    CullDistance = 4,
    VertexId = 5,
    InstanceId = 6,
    PrimitiveId = 7,
    InvocationId = 8,
    Layer = 9,
    ViewportIndex = 10,
    FragCoord = 15,
    PointCoord = 16,
    FrontFacing = 17,
    SampleId = 18,
    SamplePosition = 19,
    SampleMask = 20,
    FragDepth = 22,
    HelperInvocation = 23,
    NumWorkgroups = 24,
    WorkgroupSize = 25,
    WorkgroupId = 26,
    LocalInvocationId = 27,
    GlobalInvocationId = 28,
    LocalInvocationIndex = 29,
    VertexIndex = 42,
    InstanceIndex = 43,
}

bitflags::bitflags! {
    /// Control mask carried by `OpFunction`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FunctionControl: u32 {
        /// Strong hint to inline the function.
        const INLINE = 0x1;
        /// Strong hint not to inline the function.
        const DONT_INLINE = 0x2;
        /// The function accesses no externally visible state.
        const PURE = 0x4;
        /// The function is free of side effects entirely.
        const CONST = 0x8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_classes_match_their_stream_values() {
        assert_eq!(StorageClass::try_from(1).ok(), Some(StorageClass::Input));
        assert_eq!(StorageClass::try_from(3).ok(), Some(StorageClass::Output));
        assert_eq!(StorageClass::try_from(7).ok(), Some(StorageClass::Function));
        assert!(StorageClass::try_from(13).is_err());
    }

    #[test]
    fn interface_decorations_decode() {
        assert_eq!(Decoration::try_from(11).ok(), Some(Decoration::BuiltIn));
        assert_eq!(Decoration::try_from(30).ok(), Some(Decoration::Location));
        assert_eq!(Decoration::try_from(5).ok(), Some(Decoration::ColMajor));
        // 12 and 27 are holes in the encoding
        assert!(Decoration::try_from(12).is_err());
        assert!(Decoration::try_from(27).is_err());
    }

    #[test]
    fn function_control_mask() {
        let flags = FunctionControl::from_bits_truncate(0x5);
        assert!(flags.contains(FunctionControl::INLINE));
        assert!(flags.contains(FunctionControl::PURE));
        assert!(!flags.contains(FunctionControl::CONST));
    }
}
