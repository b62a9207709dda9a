//! Module loading.
//!
//! One pass over the instruction stream builds the name table, the
//! decoration index, the type graph, constants, variables, the function
//! table, entry points and the label map. Entries whose children are forward
//! references are retried in a resolve pass until the graph closes, so
//! forward pointer and function types load without a fixed declaration
//! order.

use hashbrown::HashMap;
use tracing::{debug, warn};

use spirv_asm::{
    decode_string, Binary, Decoration, ExecutionModel, FunctionControl, Header, Id, Op,
    StorageClass,
};

use crate::consts::LANE_SIZE;
use crate::error::LoadError;

mod constants;
mod decorations;
mod functions;
mod types;
mod variables;

pub use constants::Constant;
pub use decorations::DecorationIndex;
pub use functions::{EntryPoint, Function};
pub use types::{MatrixOrder, ScalarClass, Type, TypeKind};
pub use variables::{Access, Initializer, Variable};

/// A loaded module: the immutable graph a simulator executes against.
#[derive(Debug, Clone)]
pub struct Module {
    binary: Binary,
    names: HashMap<(Id, Option<u32>), String>,
    ext_imports: HashMap<Id, String>,
    decorations: DecorationIndex,
    types: HashMap<Id, Type>,
    constants: HashMap<Id, Constant>,
    variables: HashMap<Id, Variable>,
    functions: HashMap<Id, Function>,
    entry_points: Vec<EntryPoint>,
    labels: HashMap<Id, usize>,
}

impl Module {
    /// Decode a binary into a module.
    pub fn load(binary: Binary) -> Result<Self, LoadError> {
        let mut module = Module {
            binary,
            names: HashMap::new(),
            ext_imports: HashMap::new(),
            decorations: DecorationIndex::default(),
            types: HashMap::new(),
            constants: HashMap::new(),
            variables: HashMap::new(),
            functions: HashMap::new(),
            entry_points: Vec::new(),
            labels: HashMap::new(),
        };

        let mut pending = Vec::new();
        let mut addr = module.binary.first_op();
        while addr < module.binary.end() {
            let next = module.binary.next_addr(addr)?;
            module.ingest(addr, &mut pending)?;
            addr = next;
        }

        module.resolve_pending(pending)?;
        module.resolve_entry_points()?;

        debug!(
            types = module.types.len(),
            constants = module.constants.len(),
            variables = module.variables.len(),
            functions = module.functions.len(),
            entry_points = module.entry_points.len(),
            "module loaded"
        );
        Ok(module)
    }

    /// The underlying binary.
    pub fn binary(&self) -> &Binary {
        &self.binary
    }

    /// The module header.
    pub fn header(&self) -> &Header {
        self.binary.header()
    }

    /// Type table lookup.
    pub fn type_by_id(&self, id: Id) -> Option<&Type> {
        self.types.get(&id)
    }

    /// Constant table lookup.
    pub fn constant_by_id(&self, id: Id) -> Option<&Constant> {
        self.constants.get(&id)
    }

    /// Variable lookup, module-scope and function-local alike.
    pub fn variable_by_id(&self, id: Id) -> Option<&Variable> {
        self.variables.get(&id)
    }

    /// Function table lookup.
    pub fn function_by_id(&self, id: Id) -> Option<&Function> {
        self.functions.get(&id)
    }

    /// Entry points, in declaration order.
    pub fn entry_points(&self) -> &[EntryPoint] {
        &self.entry_points
    }

    /// Instruction address of a label id.
    pub fn label_addr(&self, id: Id) -> Option<usize> {
        self.labels.get(&id).copied()
    }

    /// Debug name of an id, from `OpName`.
    pub fn name_of(&self, id: Id) -> Option<&str> {
        self.names.get(&(id, None)).map(String::as_str)
    }

    /// Debug name of a structure member, from `OpMemberName`.
    pub fn member_name_of(&self, id: Id, member: u32) -> Option<&str> {
        self.names.get(&(id, Some(member))).map(String::as_str)
    }

    /// Imported extended-instruction sets as `(id, set name)`.
    pub fn ext_imports(&self) -> impl Iterator<Item = (Id, &str)> {
        self.ext_imports.iter().map(|(id, name)| (*id, name.as_str()))
    }

    /// All variables.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    /// All constants as `(id, constant)`.
    pub fn constants(&self) -> impl Iterator<Item = (Id, &Constant)> {
        self.constants.iter().map(|(id, c)| (*id, c))
    }

    /// The decoration index.
    pub fn decorations(&self) -> &DecorationIndex {
        &self.decorations
    }

    fn ingest(&mut self, addr: usize, pending: &mut Vec<usize>) -> Result<(), LoadError> {
        let op = self.binary.op_at(addr)?;
        let Some(kind) = op.op() else {
            // Unknown kinds in the prefix sections are tolerated; execution
            // traps if the cursor ever lands on one.
            return Ok(());
        };

        match kind {
            Op::ExtInstImport => {
                if let (Some(id), Some(name)) = (op.operand(0), decode_string(&op.operands()[1..]))
                {
                    self.ext_imports.insert(id, name);
                }
            }
            Op::Name => {
                if let (Some(id), Some(name)) = (op.operand(0), decode_string(&op.operands()[1..]))
                {
                    self.names.insert((id, None), name);
                }
            }
            Op::MemberName => {
                if let (Some(id), Some(member), Some(name)) = (
                    op.operand(0),
                    op.operand(1),
                    decode_string(&op.operands()[2..]),
                ) {
                    self.names.insert((id, Some(member)), name);
                }
            }
            Op::EntryPoint => self.ingest_entry_point(addr),
            Op::Decorate | Op::MemberDecorate => self.decorations.record(&self.binary, addr),
            Op::Label => {
                if let Some(id) = op.operand(0) {
                    self.labels.insert(id, addr);
                }
            }
            Op::Function => self.ingest_function(addr)?,
            Op::Variable => {
                if !self.ingest_variable(addr)? {
                    pending.push(addr);
                }
            }
            k if k.is_type() => {
                if !self.ingest_type(addr)? {
                    pending.push(addr);
                }
            }
            k if k.is_constant() => {
                if !self.ingest_constant(addr)? {
                    pending.push(addr);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Returns `Ok(false)` when a referenced id is not available yet.
    fn ingest_type(&mut self, addr: usize) -> Result<bool, LoadError> {
        let op = self.binary.op_at(addr)?;
        let kind = op.op().expect("caller checked the kind");
        let Some(id) = op.operand(0) else { return Ok(true) };

        let ty = match kind {
            Op::TypeVoid => Type {
                id,
                kind: TypeKind::Void,
                class: ScalarClass::Other,
                element_size: 0,
                count: 1,
            },
            Op::TypeBool => Type {
                id,
                kind: TypeKind::Bool,
                class: ScalarClass::Bool,
                element_size: LANE_SIZE as u32,
                count: 1,
            },
            Op::TypeInt => {
                let width = op.operand(1).unwrap_or(32);
                let signed = op.operand(2) == Some(1);
                Type {
                    id,
                    kind: TypeKind::Int { signed },
                    class: if signed {
                        ScalarClass::Signed
                    } else {
                        ScalarClass::Unsigned
                    },
                    element_size: width / 8,
                    count: 1,
                }
            }
            Op::TypeFloat => {
                let width = op.operand(1).unwrap_or(32);
                Type {
                    id,
                    kind: TypeKind::Float,
                    class: ScalarClass::Float,
                    element_size: width / 8,
                    count: 1,
                }
            }
            Op::TypeVector => {
                let (Some(base), Some(count)) = (op.operand(1), op.operand(2)) else {
                    return Ok(true);
                };
                let Some(base_ty) = self.types.get(&base) else { return Ok(false) };
                Type {
                    id,
                    kind: TypeKind::Vector { base },
                    class: base_ty.class,
                    element_size: base_ty.element_size,
                    count,
                }
            }
            Op::TypeMatrix => {
                let (Some(col), Some(cols)) = (op.operand(1), op.operand(2)) else {
                    return Ok(true);
                };
                let Some(col_ty) = self.types.get(&col) else { return Ok(false) };
                let rows = col_ty.count;
                let order = if self
                    .decorations
                    .has(&self.binary, id, None, Decoration::ColMajor)
                {
                    MatrixOrder::ColMajor
                } else {
                    MatrixOrder::RowMajor
                };
                Type {
                    id,
                    kind: TypeKind::Matrix {
                        col,
                        rows,
                        cols,
                        order,
                    },
                    class: col_ty.class,
                    element_size: col_ty.element_size,
                    count: rows * cols,
                }
            }
            Op::TypePointer => {
                let (Some(raw_sc), Some(pointee)) = (op.operand(1), op.operand(2)) else {
                    return Ok(true);
                };
                let Ok(storage) = StorageClass::try_from(raw_sc) else {
                    warn!(id, raw_sc, "skipping pointer type with unknown storage class");
                    return Ok(true);
                };
                Type {
                    id,
                    kind: TypeKind::Pointer { storage, pointee },
                    class: ScalarClass::Other,
                    element_size: LANE_SIZE as u32,
                    count: 1,
                }
            }
            Op::TypeFunction => {
                let Some(ret) = op.operand(1) else { return Ok(true) };
                Type {
                    id,
                    kind: TypeKind::Function {
                        ret,
                        params: op.operands()[2..].to_vec(),
                    },
                    class: ScalarClass::Other,
                    element_size: 0,
                    count: 0,
                }
            }
            Op::TypeArray => {
                let (Some(elem), Some(len_id)) = (op.operand(1), op.operand(2)) else {
                    return Ok(true);
                };
                let Some(elem_ty) = self.types.get(&elem) else { return Ok(false) };
                let element_size = elem_ty.byte_size() as u32;
                let Some(len) = self.constants.get(&len_id) else { return Ok(false) };
                let count_ok = self
                    .types
                    .get(&len.type_id)
                    .is_some_and(|t| t.is_int());
                let Some(count) = len.u32().filter(|_| count_ok) else {
                    return Err(LoadError::BadArrayLength(id));
                };
                Type {
                    id,
                    kind: TypeKind::Array { elem },
                    class: ScalarClass::Other,
                    element_size,
                    count,
                }
            }
            Op::TypeStruct => {
                let members = op.operands()[1..].to_vec();
                let mut size = 0u32;
                for member in &members {
                    let Some(member_ty) = self.types.get(member) else { return Ok(false) };
                    size += member_ty.byte_size() as u32;
                }
                Type {
                    id,
                    kind: TypeKind::Structure { members },
                    class: ScalarClass::Other,
                    element_size: size,
                    count: 1,
                }
            }
            other => {
                debug!(id, op = %other, "skipping unsupported type kind");
                return Ok(true);
            }
        };

        self.types.insert(id, ty);
        Ok(true)
    }

    /// Returns `Ok(false)` when a referenced id is not available yet.
    fn ingest_constant(&mut self, addr: usize) -> Result<bool, LoadError> {
        let op = self.binary.op_at(addr)?;
        let kind = op.op().expect("caller checked the kind");
        let (Some(type_id), Some(id)) = (op.operand(0), op.operand(1)) else {
            return Ok(true);
        };
        let Some(ty) = self.types.get(&type_id) else { return Ok(false) };
        let size = ty.byte_size();

        let bytes = match kind {
            Op::ConstantTrue => {
                let mut bytes = vec![0u8; size];
                bytes[..4].copy_from_slice(&1u32.to_le_bytes());
                bytes
            }
            Op::ConstantFalse => vec![0u8; size],
            Op::Constant => {
                let mut bytes = vec![0u8; size.max(4)];
                let value = op.operand(2).unwrap_or(0);
                bytes[..4].copy_from_slice(&value.to_le_bytes());
                bytes
            }
            Op::ConstantComposite => {
                let mut bytes = Vec::with_capacity(size);
                for child_id in op.operands()[2..].iter() {
                    let Some(child) = self.constants.get(child_id) else { return Ok(false) };
                    bytes.extend_from_slice(&child.bytes);
                }
                bytes
            }
            other => {
                warn!(id, op = %other, "skipping unsupported constant kind");
                return Ok(true);
            }
        };

        self.constants.insert(id, Constant { type_id, bytes });
        Ok(true)
    }

    /// Returns `Ok(false)` while the variable's pointer type (or its
    /// pointee) is not available yet.
    fn ingest_variable(&mut self, addr: usize) -> Result<bool, LoadError> {
        let op = self.binary.op_at(addr)?;
        let (Some(type_id), Some(id), Some(raw_sc)) =
            (op.operand(0), op.operand(1), op.operand(2))
        else {
            return Ok(true);
        };

        let Some(ty) = self.types.get(&type_id) else { return Ok(false) };
        let TypeKind::Pointer { pointee, .. } = ty.kind else {
            return Err(LoadError::NonPointerVariable(id));
        };
        let Some(pointee_ty) = self.types.get(&pointee) else { return Ok(false) };

        let Ok(storage_class) = StorageClass::try_from(raw_sc) else {
            warn!(id, raw_sc, "skipping variable with unknown storage class");
            return Ok(true);
        };

        let initializer = op.operand(3).and_then(|init_id| {
            if self.constants.contains_key(&init_id) {
                Some(Initializer::Constant(init_id))
            } else if self.variables.contains_key(&init_id) {
                Some(Initializer::Variable(init_id))
            } else {
                None
            }
        });

        let access = self.access_of(id, None);

        // Member access rides on the structure *type* id.
        let (member_access, member_names) = match &pointee_ty.kind {
            TypeKind::Structure { members } => {
                let access = (0..members.len() as u32)
                    .map(|i| self.access_of(pointee, Some(i)))
                    .collect();
                let names = (0..members.len() as u32)
                    .map(|i| self.names.get(&(pointee, Some(i))).cloned())
                    .collect();
                (access, names)
            }
            _ => (Vec::new(), Vec::new()),
        };

        self.variables.insert(
            id,
            Variable {
                id,
                type_id,
                storage_class,
                name: self.names.get(&(id, None)).cloned(),
                initializer,
                access,
                member_access,
                member_names,
            },
        );
        Ok(true)
    }

    fn ingest_function(&mut self, addr: usize) -> Result<(), LoadError> {
        let op = self.binary.op_at(addr)?;
        let (Some(type_id), Some(id)) = (op.operand(3), op.operand(1)) else {
            return Ok(());
        };
        let control = FunctionControl::from_bits_truncate(op.operand(2).unwrap_or(0));

        // Scan past the prologue, collecting parameters and locals.
        let mut cursor = self.binary.next_addr(addr)?;
        let mut params = Vec::new();
        let mut locals = Vec::new();
        loop {
            if cursor >= self.binary.end() {
                return Err(LoadError::UnterminatedFunction(id));
            }
            let view = self.binary.op_at(cursor)?;
            match view.op() {
                Some(Op::Label) => {}
                Some(Op::FunctionParameter) => {
                    if let Some(param) = view.operand(1) {
                        params.push(param);
                    }
                }
                Some(Op::Variable) => {
                    if let Some(local) = view.operand(1) {
                        locals.push(local);
                    }
                }
                _ => break,
            }
            cursor = self.binary.next_addr(cursor)?;
        }
        let first_body = cursor;

        // Continue to the last instruction before OpFunctionEnd.
        let mut last_body = cursor;
        loop {
            if cursor >= self.binary.end() {
                return Err(LoadError::UnterminatedFunction(id));
            }
            let view = self.binary.op_at(cursor)?;
            if view.op() == Some(Op::FunctionEnd) {
                break;
            }
            last_body = cursor;
            cursor = self.binary.next_addr(cursor)?;
        }

        self.functions.insert(
            id,
            Function {
                id,
                type_id,
                name: self.names.get(&(id, None)).cloned(),
                control,
                first_body,
                last_body,
                params,
                locals,
            },
        );
        Ok(())
    }

    fn ingest_entry_point(&mut self, addr: usize) {
        let Ok(op) = self.binary.op_at(addr) else { return };
        let (Some(raw_model), Some(function)) = (op.operand(0), op.operand(1)) else {
            return;
        };
        let Ok(model) = ExecutionModel::try_from(raw_model) else {
            warn!(function, raw_model, "skipping entry point with unknown execution model");
            return;
        };
        let name = decode_string(&op.operands()[2..]).unwrap_or_default();
        self.entry_points.push(EntryPoint {
            function,
            model,
            name,
        });
    }

    fn access_of(&self, id: Id, member: Option<u32>) -> Option<Access> {
        let mut access = None;
        for (dec, operand) in self.decorations.iter(&self.binary, id, member) {
            match dec {
                Decoration::BuiltIn => access = Some(Access::BuiltIn(operand?)),
                Decoration::Location => access = Some(Access::Location(operand?)),
                _ => {}
            }
        }
        access
    }

    fn resolve_pending(&mut self, mut pending: Vec<usize>) -> Result<(), LoadError> {
        while !pending.is_empty() {
            let before = pending.len();
            let mut still = Vec::new();
            for addr in pending {
                let op = self.binary.op_at(addr)?;
                let kind = op.op().expect("only named kinds are deferred");
                let done = match kind {
                    Op::Variable => self.ingest_variable(addr)?,
                    k if k.is_type() => self.ingest_type(addr)?,
                    _ => self.ingest_constant(addr)?,
                };
                if !done {
                    still.push(addr);
                }
            }
            if still.len() == before {
                // No forward progress: either a real dangling reference (an
                // error for types and constants) or variables pointing at
                // type kinds the engine skipped.
                for &addr in &still {
                    let op = self.binary.op_at(addr)?;
                    let kind = op.op().expect("only named kinds are deferred");
                    match kind {
                        Op::Variable => {
                            warn!(
                                id = op.operand(1),
                                "dropping variable whose pointee type never resolved"
                            );
                        }
                        k if k.is_type() => {
                            return Err(LoadError::UnresolvedType(op.operand(0).unwrap_or(0)));
                        }
                        _ => {
                            return Err(LoadError::UnresolvedConstant(op.operand(1).unwrap_or(0)));
                        }
                    }
                }
                return Ok(());
            }
            pending = still;
        }
        Ok(())
    }

    fn resolve_entry_points(&self) -> Result<(), LoadError> {
        for ep in &self.entry_points {
            if !self.functions.contains_key(&ep.function) {
                return Err(LoadError::UnresolvedEntryPoint(ep.function));
            }
        }
        Ok(())
    }
}
