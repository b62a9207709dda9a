//! Word-level module assembler.
//!
//! Hosts and tests synthesize modules instruction by instruction instead of
//! shipping binary fixtures; the result feeds straight into
//! [`Binary::from_words`](crate::Binary::from_words).

use crate::lit::encode_string;
use crate::op::{pack_word, Op};
use crate::{HEADER_WORDS, MAGIC};

/// Incremental builder for a SPIR-V word stream.
///
/// ```
/// use spirv_asm::{Assembler, Binary, Op};
///
/// let mut asm = Assembler::new(1, 0);
/// asm.op(Op::Capability, &[1]);
/// asm.op(Op::TypeVoid, &[2]);
/// asm.set_bound(3);
/// let bin = Binary::from_words(asm.into_words()).unwrap();
/// assert_eq!(bin.ops().count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Assembler {
    words: Vec<u32>,
}

impl Assembler {
    /// Start a module with a header for the given version.
    pub fn new(version_major: u8, version_minor: u8) -> Self {
        let version = (u32::from(version_major) << 16) | (u32::from(version_minor) << 8);
        Assembler {
            words: vec![MAGIC, version, 0, 0, 0],
        }
    }

    /// Append one instruction.
    pub fn op(&mut self, op: Op, operands: &[u32]) -> &mut Self {
        self.words.push(pack_word(op as u16, operands.len() as u16 + 1));
        self.words.extend_from_slice(operands);
        self
    }

    /// Append one instruction whose trailing operand is a literal string.
    pub fn op_str(&mut self, op: Op, operands: &[u32], literal: &str) -> &mut Self {
        let tail = encode_string(literal);
        let len = 1 + operands.len() + tail.len();
        self.words.push(pack_word(op as u16, len as u16));
        self.words.extend_from_slice(operands);
        self.words.extend_from_slice(&tail);
        self
    }

    /// Append one instruction with a literal string sandwiched between two
    /// operand groups, as `OpEntryPoint` lays out its name and interface ids.
    pub fn op_str_extra(
        &mut self,
        op: Op,
        operands: &[u32],
        literal: &str,
        extra: &[u32],
    ) -> &mut Self {
        let tail = encode_string(literal);
        let len = 1 + operands.len() + tail.len() + extra.len();
        self.words.push(pack_word(op as u16, len as u16));
        self.words.extend_from_slice(operands);
        self.words.extend_from_slice(&tail);
        self.words.extend_from_slice(extra);
        self
    }

    /// Patch the id bound in the header.
    pub fn set_bound(&mut self, bound: u32) -> &mut Self {
        self.words[3] = bound;
        self
    }

    /// Number of words emitted so far.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether only the header has been emitted.
    pub fn is_empty(&self) -> bool {
        self.words.len() == HEADER_WORDS
    }

    /// Finish, yielding the word stream.
    pub fn into_words(self) -> Vec<u32> {
        self.words
    }

    /// Finish, yielding little-endian bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }
}
