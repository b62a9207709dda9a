//! Validated reader over a SPIR-V word stream.
//!
//! A [`Binary`] owns the raw words and stays immutable after loading;
//! instructions are addressed by their word index so that any number of
//! consumers (the module loader, simulators, a host poking at operands) can
//! walk the stream without sharing cursor state.

use crate::op::{split_word, Op};
use crate::{HEADER_WORDS, MAGIC, WORD_SIZE};

/// Reasons a byte buffer is rejected as a SPIR-V module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinaryError {
    /// Fewer words than the module header needs.
    #[error("binary too small: {words} words, need at least {HEADER_WORDS}")]
    TooSmall {
        /// Number of whole words in the buffer.
        words: usize,
    },
    /// The byte length is not a whole number of 32-bit words.
    #[error("binary length of {bytes} bytes is not a multiple of {WORD_SIZE}")]
    Unaligned {
        /// Length of the rejected buffer.
        bytes: usize,
    },
    /// The first word is not the SPIR-V magic number.
    #[error("not a SPIR-V binary: first word {found:#010x}, expected {MAGIC:#010x}")]
    BadMagic {
        /// The first word of the rejected buffer.
        found: u32,
    },
    /// An instruction's length field points past the end of the stream
    /// (or is zero).
    #[error("truncated or malformed instruction at word {addr}")]
    TruncatedInstruction {
        /// Word index of the offending instruction.
        addr: usize,
    },
}

/// The five-word module header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Header {
    /// Magic number, always [`MAGIC`] once loaded.
    pub magic: u32,
    /// Major version.
    pub version_major: u8,
    /// Minor version.
    pub version_minor: u8,
    /// Tool id of the producing generator.
    pub generator: u32,
    /// Upper bound on the ids used by the module.
    pub bound: u32,
    /// Reserved word, zero in every published encoding.
    pub reserved: u32,
}

impl Header {
    fn parse(words: &[u32]) -> Self {
        Header {
            magic: words[0],
            version_major: ((words[1] & 0x00ff_0000) >> 16) as u8,
            version_minor: ((words[1] & 0x0000_ff00) >> 8) as u8,
            generator: words[2],
            bound: words[3],
            reserved: words[4],
        }
    }
}

/// One decoded instruction, borrowing its operand words from the stream.
#[derive(Debug, Clone, Copy)]
pub struct OpView<'a> {
    /// Word index of the instruction inside the stream.
    pub addr: usize,
    kind: u16,
    operands: &'a [u32],
}

impl<'a> OpView<'a> {
    /// Raw 16-bit opcode kind.
    pub fn kind_raw(&self) -> u16 {
        self.kind
    }

    /// The opcode kind, if it is one the engine names.
    pub fn op(&self) -> Option<Op> {
        Op::try_from(self.kind).ok()
    }

    /// All operand words (everything after the leading packed word).
    pub fn operands(&self) -> &'a [u32] {
        self.operands
    }

    /// A single operand word, if present.
    pub fn operand(&self, index: usize) -> Option<u32> {
        self.operands.get(index).copied()
    }

    /// Total instruction length in words, including the leading word.
    pub fn word_count(&self) -> usize {
        self.operands.len() + 1
    }
}

/// An immutable, validated SPIR-V module binary.
#[derive(Debug, Clone)]
pub struct Binary {
    words: Vec<u32>,
    header: Header,
}

impl Binary {
    /// Load a module from little-endian bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, BinaryError> {
        if data.len() % WORD_SIZE != 0 {
            return Err(BinaryError::Unaligned { bytes: data.len() });
        }
        let words = data
            .chunks_exact(WORD_SIZE)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Self::from_words(words)
    }

    /// Load a module from a word buffer.
    pub fn from_words(words: Vec<u32>) -> Result<Self, BinaryError> {
        if words.len() < HEADER_WORDS {
            return Err(BinaryError::TooSmall { words: words.len() });
        }
        if words[0] != MAGIC {
            return Err(BinaryError::BadMagic { found: words[0] });
        }
        let header = Header::parse(&words);
        let bin = Binary { words, header };

        // Walk the stream once so that instruction addresses handed out later
        // are always in bounds.
        let mut addr = bin.first_op();
        while addr < bin.end() {
            let (_, len) = split_word(bin.words[addr]);
            if len == 0 || addr + len as usize > bin.end() {
                return Err(BinaryError::TruncatedInstruction { addr });
            }
            addr += len as usize;
        }

        Ok(bin)
    }

    /// The parsed module header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Word index of the first instruction.
    pub fn first_op(&self) -> usize {
        HEADER_WORDS
    }

    /// One-past-the-last word index.
    pub fn end(&self) -> usize {
        self.words.len()
    }

    /// The whole word buffer, header included.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Decode the instruction starting at `addr`.
    pub fn op_at(&self, addr: usize) -> Result<OpView<'_>, BinaryError> {
        if addr < self.first_op() || addr >= self.end() {
            return Err(BinaryError::TruncatedInstruction { addr });
        }
        let (kind, len) = split_word(self.words[addr]);
        let len = len as usize;
        if len == 0 || addr + len > self.end() {
            return Err(BinaryError::TruncatedInstruction { addr });
        }
        Ok(OpView {
            addr,
            kind,
            operands: &self.words[addr + 1..addr + len],
        })
    }

    /// Word index of the instruction following the one at `addr`.
    pub fn next_addr(&self, addr: usize) -> Result<usize, BinaryError> {
        let op = self.op_at(addr)?;
        Ok(addr + op.word_count())
    }

    /// Whether `addr` is a valid branch target: inside `[first_op, end]`.
    pub fn check_jump(&self, addr: usize) -> bool {
        addr >= self.first_op() && addr <= self.end()
    }

    /// Iterate every instruction in stream order.
    pub fn ops(&self) -> Ops<'_> {
        Ops {
            bin: self,
            addr: self.first_op(),
        }
    }
}

/// Iterator over a binary's instructions. See [`Binary::ops`].
#[derive(Debug, Clone)]
pub struct Ops<'a> {
    bin: &'a Binary,
    addr: usize,
}

impl<'a> Iterator for Ops<'a> {
    type Item = OpView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.addr >= self.bin.end() {
            return None;
        }
        // The load-time walk guarantees this cannot fail.
        let op = self.bin.op_at(self.addr).ok()?;
        self.addr += op.word_count();
        Some(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::pack_word;

    fn words_with(ops: &[(Op, &[u32])]) -> Vec<u32> {
        let mut words = vec![MAGIC, 0x0001_0000, 0, 100, 0];
        for (op, extra) in ops {
            words.push(pack_word(*op as u16, extra.len() as u16 + 1));
            words.extend_from_slice(extra);
        }
        words
    }

    #[test]
    fn rejects_short_buffer() {
        assert!(matches!(
            Binary::from_words(vec![MAGIC, 0, 0]),
            Err(BinaryError::TooSmall { words: 3 })
        ));
    }

    #[test]
    fn rejects_unaligned_bytes() {
        assert!(matches!(
            Binary::from_bytes(&[0u8; 21]),
            Err(BinaryError::Unaligned { bytes: 21 })
        ));
    }

    #[test]
    fn rejects_wrong_magic() {
        assert!(matches!(
            Binary::from_words(vec![0xdead_beef, 0, 0, 0, 0]),
            Err(BinaryError::BadMagic { found: 0xdead_beef })
        ));
    }

    #[test]
    fn rejects_instruction_running_past_the_end() {
        let mut words = words_with(&[]);
        words.push(pack_word(Op::Nop as u16, 9));
        assert!(matches!(
            Binary::from_words(words),
            Err(BinaryError::TruncatedInstruction { addr: 5 })
        ));
    }

    #[test]
    fn parses_header_fields() {
        let bin = Binary::from_words(words_with(&[])).unwrap();
        assert_eq!(bin.header().magic, MAGIC);
        assert_eq!(bin.header().version_major, 1);
        assert_eq!(bin.header().version_minor, 0);
        assert_eq!(bin.header().bound, 100);
    }

    #[test]
    fn walks_instructions_in_order() {
        let bin = Binary::from_words(words_with(&[
            (Op::Capability, &[1]),
            (Op::TypeVoid, &[2]),
            (Op::Nop, &[]),
        ]))
        .unwrap();

        let kinds: Vec<_> = bin.ops().map(|op| op.op().unwrap()).collect();
        assert_eq!(kinds, [Op::Capability, Op::TypeVoid, Op::Nop]);

        let first = bin.op_at(bin.first_op()).unwrap();
        assert_eq!(first.operands(), &[1]);
        assert_eq!(bin.next_addr(first.addr).unwrap(), first.addr + 2);
    }

    #[test]
    fn jump_targets_are_bounded() {
        let bin = Binary::from_words(words_with(&[(Op::Nop, &[])])).unwrap();
        assert!(bin.check_jump(bin.first_op()));
        assert!(bin.check_jump(bin.end()));
        assert!(!bin.check_jump(bin.end() + 1));
        assert!(!bin.check_jump(0));
    }
}
