//! The module's type graph.
//!
//! Types hold the ids of their children rather than owning them, so forward
//! references (legal in SPIR-V for pointers and function types) resolve
//! through the table. Every entry carries its derived storage shape:
//! `element_size` bytes per scalar lane and `count` lanes.

use spirv_asm::{Id, StorageClass};

/// External matrix layout, from a `ColMajor` decoration on the type id.
/// Lane storage inside the simulator is column-major either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MatrixOrder {
    /// No `ColMajor` decoration present.
    RowMajor,
    /// The type id is decorated `ColMajor`.
    ColMajor,
}

/// Scalar interpretation of a type's lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScalarClass {
    /// 32-bit IEEE floats.
    Float,
    /// Signed 32-bit integers.
    Signed,
    /// Unsigned 32-bit integers.
    Unsigned,
    /// Booleans, one full lane each.
    Bool,
    /// No scalar interpretation (pointers, aggregates, void, ...).
    Other,
}

/// Tagged type variants the engine understands.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeKind {
    /// `OpTypeVoid`.
    Void,
    /// `OpTypeBool`.
    Bool,
    /// `OpTypeInt`.
    Int {
        /// Whether the integer is signed.
        signed: bool,
    },
    /// `OpTypeFloat`.
    Float,
    /// `OpTypeVector` of a scalar base.
    Vector {
        /// Component type id.
        base: Id,
    },
    /// `OpTypeMatrix`, a run of column vectors.
    Matrix {
        /// Column vector type id.
        col: Id,
        /// Lanes per column.
        rows: u32,
        /// Number of columns.
        cols: u32,
        /// External layout tag.
        order: MatrixOrder,
    },
    /// `OpTypePointer`; pointer registers hold a heap offset.
    Pointer {
        /// Memory region of the pointee.
        storage: StorageClass,
        /// Pointee type id.
        pointee: Id,
    },
    /// `OpTypeFunction`.
    Function {
        /// Return type id.
        ret: Id,
        /// Parameter type ids.
        params: Vec<Id>,
    },
    /// `OpTypeArray` with a constant element count.
    Array {
        /// Element type id.
        elem: Id,
    },
    /// `OpTypeStruct`.
    Structure {
        /// Member type ids, in declaration order.
        members: Vec<Id>,
    },
}

/// One entry of the type table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Type {
    /// Result id of the defining instruction.
    pub id: Id,
    /// The variant.
    pub kind: TypeKind,
    /// Lane interpretation, derived from the leaf scalar.
    pub class: ScalarClass,
    /// Bytes per element. For arrays this is the byte size of one whole
    /// element; for every scalar/vector/matrix it is the scalar width.
    pub element_size: u32,
    /// Number of elements.
    pub count: u32,
}

impl Type {
    /// Total storage footprint in bytes.
    pub fn byte_size(&self) -> usize {
        (self.element_size * self.count) as usize
    }

    /// Number of 32-bit lanes a register of this type holds.
    pub fn lanes(&self) -> usize {
        self.count as usize
    }

    /// Float scalar, vector or matrix.
    pub fn is_float(&self) -> bool {
        self.class == ScalarClass::Float && self.is_numeric_shape()
    }

    /// Integer scalar, vector or matrix of either signedness.
    pub fn is_int(&self) -> bool {
        matches!(self.class, ScalarClass::Signed | ScalarClass::Unsigned)
            && self.is_numeric_shape()
    }

    /// Signed-integer scalar, vector or matrix.
    pub fn is_signed_int(&self) -> bool {
        self.class == ScalarClass::Signed && self.is_numeric_shape()
    }

    /// Unsigned-integer scalar, vector or matrix.
    pub fn is_unsigned_int(&self) -> bool {
        self.class == ScalarClass::Unsigned && self.is_numeric_shape()
    }

    /// Boolean scalar or vector.
    pub fn is_bool(&self) -> bool {
        matches!(self.kind, TypeKind::Bool)
            || (matches!(self.kind, TypeKind::Vector { .. }) && self.class == ScalarClass::Bool)
    }

    /// Exactly one scalar lane.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Bool | TypeKind::Int { .. } | TypeKind::Float
        )
    }

    /// Any vector.
    pub fn is_vector(&self) -> bool {
        matches!(self.kind, TypeKind::Vector { .. })
    }

    /// Any matrix.
    pub fn is_matrix(&self) -> bool {
        matches!(self.kind, TypeKind::Matrix { .. })
    }

    /// Any pointer.
    pub fn is_pointer(&self) -> bool {
        matches!(self.kind, TypeKind::Pointer { .. })
    }

    /// Matrix dimensions `(rows, cols)`, if this is a matrix.
    pub fn matrix_dims(&self) -> Option<(usize, usize)> {
        match self.kind {
            TypeKind::Matrix { rows, cols, .. } => Some((rows as usize, cols as usize)),
            _ => None,
        }
    }

    fn is_numeric_shape(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Int { .. }
                | TypeKind::Float
                | TypeKind::Vector { .. }
                | TypeKind::Matrix { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn float_vec4() -> Type {
        Type {
            id: 11,
            kind: TypeKind::Vector { base: 10 },
            class: ScalarClass::Float,
            element_size: 4,
            count: 4,
        }
    }

    #[test]
    fn storage_shape() {
        let v = float_vec4();
        assert_eq!(v.byte_size(), 16);
        assert_eq!(v.lanes(), 4);
        assert!(v.is_float() && v.is_vector());
        assert!(!v.is_scalar() && !v.is_int());
    }

    #[test]
    fn pointers_are_not_numeric() {
        let p = Type {
            id: 13,
            kind: TypeKind::Pointer {
                storage: StorageClass::Input,
                pointee: 10,
            },
            class: ScalarClass::Other,
            element_size: 4,
            count: 1,
        };
        assert!(p.is_pointer());
        assert!(!p.is_float() && !p.is_int());
        assert_eq!(p.byte_size(), 4);
    }
}
