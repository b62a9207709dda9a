//! Byte-backed registers with typed lane views.
//!
//! A register stores raw little-endian bytes; the same buffer is read as
//! `f32`, `i32` or `u32` lanes depending on the instruction. Bitcast-like
//! conversions rely on this being a bit-exact reinterpretation, so lane
//! accessors go through `to_bits`/`from_bits` rather than numeric casts.

use spirv_asm::Id;

use crate::consts::LANE_SIZE;
use crate::module::{ScalarClass, Type, TypeKind};

/// One value produced by an instruction, bound to its result id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
    /// Result id the register is bound to.
    pub id: Id,
    /// Type id of the stored value.
    pub type_id: Id,
    bytes: Vec<u8>,
}

impl Register {
    /// A zero-initialized register shaped like `ty`.
    pub fn zeroed(id: Id, ty: &Type) -> Self {
        Register {
            id,
            type_id: ty.id,
            bytes: vec![0; ty.byte_size()],
        }
    }

    /// A register over an existing byte image.
    pub fn from_bytes(id: Id, type_id: Id, bytes: Vec<u8>) -> Self {
        Register { id, type_id, bytes }
    }

    /// The same value bound to a different id (argument passing, returns).
    pub fn clone_as(&self, id: Id) -> Self {
        Register {
            id,
            type_id: self.type_id,
            bytes: self.bytes.clone(),
        }
    }

    /// Raw little-endian bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Mutable raw bytes.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Number of 32-bit lanes.
    pub fn lanes(&self) -> usize {
        self.bytes.len() / LANE_SIZE
    }

    /// Lane as an unsigned integer (also the boolean and pointer view).
    pub fn u32(&self, lane: usize) -> u32 {
        let at = lane * LANE_SIZE;
        u32::from_le_bytes([
            self.bytes[at],
            self.bytes[at + 1],
            self.bytes[at + 2],
            self.bytes[at + 3],
        ])
    }

    /// Lane as a signed integer.
    pub fn i32(&self, lane: usize) -> i32 {
        self.u32(lane) as i32
    }

    /// Lane as a float, bit-exact.
    pub fn f32(&self, lane: usize) -> f32 {
        f32::from_bits(self.u32(lane))
    }

    /// Lane as a boolean: any non-zero value is true.
    pub fn bool(&self, lane: usize) -> bool {
        self.u32(lane) != 0
    }

    /// Store an unsigned integer lane.
    pub fn set_u32(&mut self, lane: usize, value: u32) {
        let at = lane * LANE_SIZE;
        self.bytes[at..at + LANE_SIZE].copy_from_slice(&value.to_le_bytes());
    }

    /// Store a signed integer lane.
    pub fn set_i32(&mut self, lane: usize, value: i32) {
        self.set_u32(lane, value as u32);
    }

    /// Store a float lane, bit-exact.
    pub fn set_f32(&mut self, lane: usize, value: f32) {
        self.set_u32(lane, value.to_bits());
    }

    /// Store a boolean lane as 0 or 1.
    pub fn set_bool(&mut self, lane: usize, value: bool) {
        self.set_u32(lane, u32::from(value));
    }

    /// Render the lanes for host debugging, honoring the type's lane class.
    pub fn render(&self, ty: &Type) -> String {
        use core::fmt::Write;

        let mut out = format!("reg %{}:", self.id);
        for lane in 0..self.lanes() {
            match (&ty.kind, ty.class) {
                (TypeKind::Pointer { .. }, _) => {
                    let _ = write!(out, " ptr({:#x})", self.u32(lane));
                }
                (_, ScalarClass::Float) => {
                    let _ = write!(out, " {:.4}", self.f32(lane));
                }
                (_, ScalarClass::Signed) => {
                    let _ = write!(out, " {}", self.i32(lane));
                }
                (_, ScalarClass::Bool) => {
                    let _ = write!(out, " {}", self.bool(lane));
                }
                _ => {
                    let _ = write!(out, " {}", self.u32(lane));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ScalarClass;

    fn vec4f() -> Type {
        Type {
            id: 11,
            kind: TypeKind::Vector { base: 10 },
            class: ScalarClass::Float,
            element_size: 4,
            count: 4,
        }
    }

    #[test]
    fn storage_matches_the_type_shape() {
        let reg = Register::zeroed(100, &vec4f());
        assert_eq!(reg.bytes().len(), 16);
        assert_eq!(reg.lanes(), 4);
    }

    #[test]
    fn lane_views_share_bits() {
        let mut reg = Register::zeroed(100, &vec4f());
        reg.set_f32(2, -1.5);
        assert_eq!(reg.u32(2), (-1.5f32).to_bits());
        assert_eq!(reg.f32(2), -1.5);
        // untouched lanes stay zero
        assert_eq!(reg.u32(0), 0);

        reg.set_i32(0, -7);
        assert_eq!(reg.i32(0), -7);
        assert_eq!(reg.u32(0), 0xffff_fff9);
    }

    #[test]
    fn clone_as_rebinds_without_copying_lazily() {
        let mut reg = Register::zeroed(100, &vec4f());
        reg.set_f32(0, 3.5);
        let other = reg.clone_as(200);
        assert_eq!(other.id, 200);
        assert_eq!(other.type_id, reg.type_id);
        assert_eq!(other.bytes(), reg.bytes());
    }

    #[test]
    fn render_uses_the_lane_class() {
        let mut reg = Register::zeroed(7, &vec4f());
        reg.set_f32(0, 1.0);
        assert!(reg.render(&vec4f()).starts_with("reg %7: 1.0000"));
    }
}
