//! Pipeline and function variables.

use spirv_asm::{Id, StorageClass};

/// How a host addresses an interface slot: by builtin or by location number.
///
/// A variable (or structure member) without an access descriptor is not
/// externally addressable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Access {
    /// A `BuiltIn` decoration; the operand is the builtin number.
    BuiltIn(u32),
    /// A `Location` decoration; the operand is the location number.
    Location(u32),
}

/// The value a variable starts out with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Initializer {
    /// Initialized from a constant's byte image.
    Constant(Id),
    /// Initialized from another (module-scope) variable.
    Variable(Id),
}

/// One `OpVariable`: module-scope pipeline variables and function locals
/// alike.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variable {
    /// Result id.
    pub id: Id,
    /// Result type; always a pointer type.
    pub type_id: Id,
    /// Memory region the variable lives in.
    pub storage_class: StorageClass,
    /// Debug name from `OpName`, when present.
    pub name: Option<String>,
    /// Optional initial value.
    pub initializer: Option<Initializer>,
    /// Interface access of the variable as a whole.
    pub access: Option<Access>,
    /// Per-member interface access, for structure pointees.
    pub member_access: Vec<Option<Access>>,
    /// Per-member debug names from `OpMemberName`.
    pub member_names: Vec<Option<String>>,
}
