use std::collections::BTreeMap;

use super::{pack_be, unpack_be, AccessWidth, MemoryStore};

/// Sparse big-endian memory covering the whole 32-bit address space.
///
/// Only bytes that have been written are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SparseMemory {
    bytes: BTreeMap<u32, u8>,
}

impl SparseMemory {
    /// Creates an empty store; every address reads as zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a single byte.
    #[must_use]
    pub fn byte(&self, addr: u32) -> u8 {
        self.bytes.get(&addr).copied().unwrap_or(0)
    }

    /// Number of individual bytes that have been written.
    #[must_use]
    pub fn written_bytes(&self) -> usize {
        self.bytes.len()
    }
}

impl MemoryStore for SparseMemory {
    fn get(&self, addr: u32, width: AccessWidth) -> u32 {
        let bytes: Vec<u8> = (0..width.bytes())
            .map(|offset| self.byte(addr.wrapping_add(offset)))
            .collect();
        pack_be(&bytes)
    }

    fn set(&mut self, addr: u32, value: u32, width: AccessWidth) {
        for (offset, byte) in (0u32..).zip(unpack_be(value, width)) {
            let _ = self.bytes.insert(addr.wrapping_add(offset), byte);
        }
    }

    fn populated_words(&self) -> Vec<u32> {
        let mut words: Vec<u32> = self.bytes.keys().map(|addr| addr & !0x3).collect();
        words.dedup();
        words
    }
}

#[cfg(test)]
mod tests {
    use super::SparseMemory;
    use crate::memory::{AccessWidth, MemoryStore};

    #[test]
    fn unwritten_memory_reads_zero() {
        let memory = SparseMemory::new();
        assert_eq!(memory.get(0, AccessWidth::Word), 0);
        assert_eq!(memory.get(0xDEAD_BEEF, AccessWidth::Half), 0);
        assert!(memory.populated_words().is_empty());
    }

    #[test]
    fn word_writes_are_big_endian() {
        let mut memory = SparseMemory::new();
        memory.set(0x100, 0x1234_5678, AccessWidth::Word);

        assert_eq!(memory.byte(0x100), 0x12);
        assert_eq!(memory.byte(0x103), 0x78);
        assert_eq!(memory.get(0x100, AccessWidth::Word), 0x1234_5678);
        assert_eq!(memory.get(0x100, AccessWidth::Half), 0x1234);
        assert_eq!(memory.get(0x102, AccessWidth::Half), 0x5678);
        assert_eq!(memory.get(0x101, AccessWidth::Byte), 0x34);
    }

    #[test]
    fn narrow_writes_only_touch_their_bytes() {
        let mut memory = SparseMemory::new();
        memory.set(0x200, 0xAABB_CCDD, AccessWidth::Word);
        memory.set(0x201, 0xFFFF_FF11, AccessWidth::Byte);
        memory.set(0x202, 0xFFFF_2233, AccessWidth::Half);

        assert_eq!(memory.get(0x200, AccessWidth::Word), 0xAA11_2233);
        assert_eq!(memory.written_bytes(), 4);
    }

    #[test]
    fn accesses_wrap_at_the_top_of_the_address_space() {
        let mut memory = SparseMemory::new();
        memory.set(0xFFFF_FFFE, 0x0102_0304, AccessWidth::Word);

        assert_eq!(memory.byte(0xFFFF_FFFE), 0x01);
        assert_eq!(memory.byte(0xFFFF_FFFF), 0x02);
        assert_eq!(memory.byte(0x0000_0000), 0x03);
        assert_eq!(memory.byte(0x0000_0001), 0x04);
        assert_eq!(memory.get(0xFFFF_FFFE, AccessWidth::Word), 0x0102_0304);
    }

    #[test]
    fn populated_words_are_aligned_sorted_and_unique() {
        let mut memory = SparseMemory::new();
        memory.set(0x10, 1, AccessWidth::Word);
        memory.set(0x7, 0xAB, AccessWidth::Byte);
        memory.set(0x12, 0xBEEF, AccessWidth::Half);

        assert_eq!(memory.populated_words(), vec![0x4, 0x10]);
    }
}
