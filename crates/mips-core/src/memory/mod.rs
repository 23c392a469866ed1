//! Memory store contract consumed by the engine, plus the default sparse store.

/// Access widths and big-endian byte packing helpers.
pub mod access;
/// Sparse byte-addressable store backing the full 32-bit address space.
pub mod sparse;

pub use access::{pack_be, unpack_be, AccessWidth};
pub use sparse::SparseMemory;

/// Byte-addressable storage with width-parameterised reads and writes.
///
/// Multi-byte values are big-endian. Addresses wrap modulo 2^32 and unwritten
/// bytes read as zero. Alignment is not enforced by the engine.
pub trait MemoryStore {
    /// Reads `width` bytes starting at `addr`, zero-extended to 32 bits.
    fn get(&self, addr: u32, width: AccessWidth) -> u32;

    /// Writes the low `width` bytes of `value` starting at `addr`.
    fn set(&mut self, addr: u32, value: u32, width: AccessWidth);

    /// Returns every word-aligned address whose word holds at least one
    /// written byte, in ascending order.
    fn populated_words(&self) -> Vec<u32>;
}
