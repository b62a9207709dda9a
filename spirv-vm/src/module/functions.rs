//! Function table entries and entry points.

use spirv_asm::{ExecutionModel, FunctionControl, Id};

/// One `OpFunction` with its body bracketed by word addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    /// Result id.
    pub id: Id,
    /// The `OpTypeFunction` id.
    pub type_id: Id,
    /// Debug name from `OpName`, when present.
    pub name: Option<String>,
    /// Control mask carried by the declaration.
    pub control: FunctionControl,
    /// Address of the first instruction after the prologue
    /// (`OpLabel`/`OpFunctionParameter`/`OpVariable`).
    pub first_body: usize,
    /// Address of the last instruction before `OpFunctionEnd`.
    pub last_body: usize,
    /// Parameter ids, in declaration order.
    pub params: Vec<Id>,
    /// `Function`-class variable ids declared in the prologue.
    pub locals: Vec<Id>,
}

/// A designated shader stage start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    /// Id of the function it runs.
    pub function: Id,
    /// Pipeline stage.
    pub model: ExecutionModel,
    /// Exported name.
    pub name: String,
}
