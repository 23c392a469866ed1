/// Number of architecturally visible general-purpose registers (`$0..$31`).
pub const GENERAL_REGISTER_COUNT: usize = 32;
/// Width of one instruction word in bytes; the program counter advances by this.
pub const INSTRUCTION_BYTES: u32 = 4;

/// Architecturally visible general-purpose register, named by calling convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum Register {
    /// `$zero`, constant zero by convention.
    Zero = 0,
    /// `$at`, assembler temporary.
    At = 1,
    /// `$v0`, value register.
    V0 = 2,
    /// `$v1`, value register.
    V1 = 3,
    /// `$a0`, argument register.
    A0 = 4,
    /// `$a1`, argument register.
    A1 = 5,
    /// `$a2`, argument register.
    A2 = 6,
    /// `$a3`, argument register.
    A3 = 7,
    /// `$t0`, temporary register.
    T0 = 8,
    /// `$t1`, temporary register.
    T1 = 9,
    /// `$t2`, temporary register.
    T2 = 10,
    /// `$t3`, temporary register.
    T3 = 11,
    /// `$t4`, temporary register.
    T4 = 12,
    /// `$t5`, temporary register.
    T5 = 13,
    /// `$t6`, temporary register.
    T6 = 14,
    /// `$t7`, temporary register.
    T7 = 15,
    /// `$s0`, saved register.
    S0 = 16,
    /// `$s1`, saved register.
    S1 = 17,
    /// `$s2`, saved register.
    S2 = 18,
    /// `$s3`, saved register.
    S3 = 19,
    /// `$s4`, saved register.
    S4 = 20,
    /// `$s5`, saved register.
    S5 = 21,
    /// `$s6`, saved register.
    S6 = 22,
    /// `$s7`, saved register.
    S7 = 23,
    /// `$t8`, temporary register.
    T8 = 24,
    /// `$t9`, temporary register.
    T9 = 25,
    /// `$k0`, kernel-reserved register.
    K0 = 26,
    /// `$k1`, kernel-reserved register.
    K1 = 27,
    /// `$gp`, global pointer.
    Gp = 28,
    /// `$sp`, stack pointer.
    Sp = 29,
    /// `$fp`, frame pointer.
    Fp = 30,
    /// `$ra`, return address.
    Ra = 31,
}

impl Register {
    /// Ordered list of all registers, indexable by register number.
    pub const ALL: [Self; GENERAL_REGISTER_COUNT] = [
        Self::Zero,
        Self::At,
        Self::V0,
        Self::V1,
        Self::A0,
        Self::A1,
        Self::A2,
        Self::A3,
        Self::T0,
        Self::T1,
        Self::T2,
        Self::T3,
        Self::T4,
        Self::T5,
        Self::T6,
        Self::T7,
        Self::S0,
        Self::S1,
        Self::S2,
        Self::S3,
        Self::S4,
        Self::S5,
        Self::S6,
        Self::S7,
        Self::T8,
        Self::T9,
        Self::K0,
        Self::K1,
        Self::Gp,
        Self::Sp,
        Self::Fp,
        Self::Ra,
    ];

    /// Returns the register number (`0..=31`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Decodes the low five bits of `bits`; higher bits are ignored.
    #[must_use]
    pub const fn from_field(bits: u8) -> Self {
        Self::ALL[(bits & 0x1F) as usize]
    }

    /// Assembler name, including the `$` sigil.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Zero => "$zero",
            Self::At => "$at",
            Self::V0 => "$v0",
            Self::V1 => "$v1",
            Self::A0 => "$a0",
            Self::A1 => "$a1",
            Self::A2 => "$a2",
            Self::A3 => "$a3",
            Self::T0 => "$t0",
            Self::T1 => "$t1",
            Self::T2 => "$t2",
            Self::T3 => "$t3",
            Self::T4 => "$t4",
            Self::T5 => "$t5",
            Self::T6 => "$t6",
            Self::T7 => "$t7",
            Self::S0 => "$s0",
            Self::S1 => "$s1",
            Self::S2 => "$s2",
            Self::S3 => "$s3",
            Self::S4 => "$s4",
            Self::S5 => "$s5",
            Self::S6 => "$s6",
            Self::S7 => "$s7",
            Self::T8 => "$t8",
            Self::T9 => "$t9",
            Self::K0 => "$k0",
            Self::K1 => "$k1",
            Self::Gp => "$gp",
            Self::Sp => "$sp",
            Self::Fp => "$fp",
            Self::Ra => "$ra",
        }
    }
}

/// Register file and program counter of the simulated core.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ArchitecturalState {
    gpr: [u32; GENERAL_REGISTER_COUNT],
    pc: u32,
}

impl ArchitecturalState {
    /// Reads a general-purpose register.
    #[must_use]
    pub const fn gpr(&self, reg: Register) -> u32 {
        self.gpr[reg.index()]
    }

    /// Writes a general-purpose register.
    ///
    /// No register is protected here, `$zero` included.
    pub const fn set_gpr(&mut self, reg: Register, value: u32) {
        self.gpr[reg.index()] = value;
    }

    /// Returns the whole register file in register-number order.
    #[must_use]
    pub const fn registers(&self) -> &[u32; GENERAL_REGISTER_COUNT] {
        &self.gpr
    }

    /// Reads the program counter.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.pc
    }

    /// Writes the program counter.
    pub const fn set_pc(&mut self, value: u32) {
        self.pc = value;
    }

    /// Advances the program counter past one instruction word, wrapping at 2^32.
    pub const fn advance_pc(&mut self) {
        self.pc = self.pc.wrapping_add(INSTRUCTION_BYTES);
    }
}
