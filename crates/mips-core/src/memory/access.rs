//! Access widths and big-endian packing shared by memory store implementations.

use crate::state::INSTRUCTION_BYTES;

/// Width of a single memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum AccessWidth {
    /// One byte.
    Byte = 1,
    /// Two bytes.
    Half = 2,
    /// Four bytes.
    Word = 4,
}

impl AccessWidth {
    /// Number of bytes covered by this access.
    #[must_use]
    pub const fn bytes(self) -> u32 {
        self as u32
    }

    /// Mask selecting the low bytes a value of this width occupies.
    #[must_use]
    pub const fn mask(self) -> u32 {
        match self {
            Self::Byte => 0xFF,
            Self::Half => 0xFFFF,
            Self::Word => u32::MAX,
        }
    }
}

const _: () = assert!(AccessWidth::Word.bytes() == INSTRUCTION_BYTES);

/// Packs up to four big-endian bytes into a zero-extended value.
#[must_use]
pub fn pack_be(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(0u32, |value, byte| (value << 8) | u32::from(*byte))
}

/// Splits the low `width` bytes of `value` into big-endian order.
#[must_use]
pub fn unpack_be(value: u32, width: AccessWidth) -> Vec<u8> {
    let all = value.to_be_bytes();
    let skip = all.len() - width.bytes() as usize;
    all[skip..].to_vec()
}
