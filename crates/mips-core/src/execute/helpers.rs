//! Sign extension and address arithmetic shared by the instruction handlers.

#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

/// Bit index of the sign bit of a 16-bit immediate.
pub const IMM16_SIGN_BIT: u32 = 15;
/// Bit index of the sign bit of a branch offset after the `<< 2` word scaling.
pub const BRANCH_OFFSET_SIGN_BIT: u32 = 17;
/// Program-counter bits preserved by `j` and `jal`.
pub const JUMP_REGION_MASK: u32 = 0xF000_0000;

/// Sign-extends `value` to 32 bits, treating `significant_bit_index` as its sign bit.
///
/// Bits above the sign bit are discarded first. Indices of 31 or more return
/// `value` reinterpreted as `i32`.
#[must_use]
pub const fn sign_extend(value: u32, significant_bit_index: u32) -> i32 {
    if significant_bit_index >= 31 {
        return value as i32;
    }
    let shift = 31 - significant_bit_index;
    ((value << shift) as i32) >> shift
}

/// Sign-extends a 16-bit immediate into its 32-bit register form.
#[must_use]
pub const fn sign_extend_imm16(imm: u16) -> u32 {
    sign_extend(imm as u32, IMM16_SIGN_BIT) as u32
}

/// Base register plus sign-extended offset, wrapping at 2^32.
#[must_use]
pub const fn effective_address(base: u32, offset: u16) -> u32 {
    base.wrapping_add(sign_extend_imm16(offset))
}

/// Byte displacement of a taken branch: `sext18(offset << 2)`.
#[must_use]
pub const fn branch_displacement(offset: u16) -> u32 {
    sign_extend((offset as u32) << 2, BRANCH_OFFSET_SIGN_BIT) as u32
}

/// Target of `j`/`jal`: the upper four bits of `pc` joined with `address << 2`.
#[must_use]
pub const fn jump_target(pc: u32, address: u32) -> u32 {
    (pc & JUMP_REGION_MASK) | ((address & 0x03FF_FFFF) << 2)
}
