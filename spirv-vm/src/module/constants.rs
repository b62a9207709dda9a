//! Materialized constants.

use spirv_asm::Id;

/// A constant's type and its byte image, ready to seed a register.
///
/// Composite constants concatenate the images of their children, so a single
/// contiguous buffer covers scalars, vectors, matrices, arrays and structs.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Constant {
    /// Type id of the constant.
    pub type_id: Id,
    /// Little-endian byte image, `element_size * count` bytes.
    pub bytes: Vec<u8>,
}

impl Constant {
    /// First lane as an unsigned integer (array lengths, access indices).
    pub fn u32(&self) -> Option<u32> {
        let lane = self.bytes.get(0..4)?;
        Some(u32::from_le_bytes([lane[0], lane[1], lane[2], lane[3]]))
    }
}
