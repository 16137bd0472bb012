use bitvec::prelude::*;

/// Fixed-size bitset of excluded tile slots
///
/// Slots are 0-based positions in the tile index. The mask is reused from
/// cell to cell, so clearing only touches the bits that were set.
#[derive(Clone, Debug)]
pub struct TileMask {
    bits: BitVec,
    marked: Vec<usize>,
}

impl TileMask {
    /// Create a mask with no slot excluded
    pub fn new(slot_count: usize) -> Self {
        Self {
            bits: bitvec![0; slot_count],
            marked: Vec::with_capacity(4),
        }
    }

    /// Exclude a slot; out-of-range slots are ignored
    pub fn insert(&mut self, slot: usize) {
        if slot < self.bits.len() && !self.contains(slot) {
            self.bits.set(slot, true);
            self.marked.push(slot);
        }
    }

    /// Test whether a slot is excluded
    pub fn contains(&self, slot: usize) -> bool {
        self.bits.get(slot).as_deref() == Some(&true)
    }

    /// Re-admit every excluded slot
    pub fn clear(&mut self) {
        for slot in self.marked.drain(..) {
            self.bits.set(slot, false);
        }
    }

    /// Test if no slot is excluded
    pub fn is_empty(&self) -> bool {
        self.marked.is_empty()
    }
}
