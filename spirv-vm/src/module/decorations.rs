//! Index over `OpDecorate`/`OpMemberDecorate` instructions.
//!
//! Decorations are kept as addresses into the word stream and decoded on
//! query, keyed by `(target-id, member)` with `None` for whole-id
//! decorations.

use hashbrown::HashMap;
use spirv_asm::{Binary, Decoration, Id, Op};

/// Lookup table from `(id, member)` to the decoration instructions that
/// target it, in stream order.
#[derive(Debug, Clone, Default)]
pub struct DecorationIndex {
    ops: HashMap<(Id, Option<u32>), Vec<usize>>,
}

impl DecorationIndex {
    /// Record one decoration instruction at `addr`.
    pub(crate) fn record(&mut self, bin: &Binary, addr: usize) {
        let Ok(op) = bin.op_at(addr) else { return };
        let Some(target) = op.operand(0) else { return };
        let member = match op.op() {
            Some(Op::MemberDecorate) => match op.operand(1) {
                Some(m) => Some(m),
                None => return,
            },
            _ => None,
        };
        self.ops.entry((target, member)).or_default().push(addr);
    }

    /// Whether `wanted` is set on `(id, member)`.
    pub fn has(&self, bin: &Binary, id: Id, member: Option<u32>, wanted: Decoration) -> bool {
        self.find(bin, id, member, wanted).is_some()
    }

    /// First operand of `wanted` on `(id, member)`, if the decoration is set
    /// and carries one.
    pub fn operand(
        &self,
        bin: &Binary,
        id: Id,
        member: Option<u32>,
        wanted: Decoration,
    ) -> Option<u32> {
        let (addr, arg_index) = self.find(bin, id, member, wanted)?;
        bin.op_at(addr).ok()?.operand(arg_index)
    }

    /// Walk all decorations of `(id, member)`, yielding `(decoration, first
    /// operand)` pairs in stream order.
    pub fn iter<'a>(
        &'a self,
        bin: &'a Binary,
        id: Id,
        member: Option<u32>,
    ) -> impl Iterator<Item = (Decoration, Option<u32>)> + 'a {
        self.ops
            .get(&(id, member))
            .into_iter()
            .flatten()
            .filter_map(move |&addr| {
                let op = bin.op_at(addr).ok()?;
                let dec_index = if op.op() == Some(Op::MemberDecorate) { 2 } else { 1 };
                let dec = Decoration::try_from(op.operand(dec_index)?).ok()?;
                Some((dec, op.operand(dec_index + 1)))
            })
    }

    fn find(
        &self,
        bin: &Binary,
        id: Id,
        member: Option<u32>,
        wanted: Decoration,
    ) -> Option<(usize, usize)> {
        for &addr in self.ops.get(&(id, member))? {
            let Ok(op) = bin.op_at(addr) else { continue };
            let dec_index = if op.op() == Some(Op::MemberDecorate) { 2 } else { 1 };
            if op.operand(dec_index) == Some(wanted as u32) {
                return Some((addr, dec_index + 1));
            }
        }
        None
    }
}
