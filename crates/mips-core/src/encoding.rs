/// Primary opcode shared by every register-format instruction.
pub const SPECIAL_OPCODE: u8 = 0x00;

/// Word that halts the machine when fetched.
pub const HALT_SENTINEL: u32 = 0xFEED_FEED;

/// Recognised operations of the supported MIPS subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Shift left logical by `shamt`.
    Sll,
    /// Shift right logical by `shamt`.
    Srl,
    /// Jump to the address in a register.
    Jr,
    /// Add; overflow wraps.
    Add,
    /// Add unsigned.
    Addu,
    /// Subtract; overflow wraps.
    Sub,
    /// Subtract unsigned.
    Subu,
    /// Bitwise and.
    And,
    /// Bitwise or.
    Or,
    /// Bitwise nor.
    Nor,
    /// Set on signed less-than.
    Slt,
    /// Set on unsigned less-than.
    Sltu,
    /// Jump within the current 256 MiB region.
    J,
    /// Jump and link through `$ra`.
    Jal,
    /// Branch if equal.
    Beq,
    /// Branch if not equal.
    Bne,
    /// Branch if less than or equal to zero, signed.
    Blez,
    /// Branch if greater than zero, signed.
    Bgtz,
    /// Add sign-extended immediate; overflow wraps.
    Addi,
    /// Add sign-extended immediate, unsigned.
    Addiu,
    /// Set on signed less-than immediate.
    Slti,
    /// Set on unsigned less-than sign-extended immediate.
    Sltiu,
    /// Bitwise and with zero-extended immediate.
    Andi,
    /// Bitwise or with zero-extended immediate.
    Ori,
    /// Load immediate into the upper half.
    Lui,
    /// Load word.
    Lw,
    /// Load byte, zero-extended.
    Lbu,
    /// Load halfword, zero-extended.
    Lhu,
    /// Store the low byte.
    Sb,
    /// Store the low halfword.
    Sh,
    /// Store word.
    Sw,
}

impl Operation {
    /// Lower-case assembler mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Sll => "sll",
            Self::Srl => "srl",
            Self::Jr => "jr",
            Self::Add => "add",
            Self::Addu => "addu",
            Self::Sub => "sub",
            Self::Subu => "subu",
            Self::And => "and",
            Self::Or => "or",
            Self::Nor => "nor",
            Self::Slt => "slt",
            Self::Sltu => "sltu",
            Self::J => "j",
            Self::Jal => "jal",
            Self::Beq => "beq",
            Self::Bne => "bne",
            Self::Blez => "blez",
            Self::Bgtz => "bgtz",
            Self::Addi => "addi",
            Self::Addiu => "addiu",
            Self::Slti => "slti",
            Self::Sltiu => "sltiu",
            Self::Andi => "andi",
            Self::Ori => "ori",
            Self::Lui => "lui",
            Self::Lw => "lw",
            Self::Lbu => "lbu",
            Self::Lhu => "lhu",
            Self::Sb => "sb",
            Self::Sh => "sh",
            Self::Sw => "sw",
        }
    }

    /// Returns true for branches and jumps, which own a delay slot.
    #[must_use]
    pub const fn is_control_transfer(self) -> bool {
        matches!(
            self,
            Self::Jr | Self::J | Self::Jal | Self::Beq | Self::Bne | Self::Blez | Self::Bgtz
        )
    }
}

/// Secondary table selecting the operation by `funct` when `opcode == 0`.
pub const FUNCT_TABLE: &[(u8, Operation)] = &[
    (0x00, Operation::Sll),
    (0x02, Operation::Srl),
    (0x08, Operation::Jr),
    (0x20, Operation::Add),
    (0x21, Operation::Addu),
    (0x22, Operation::Sub),
    (0x23, Operation::Subu),
    (0x24, Operation::And),
    (0x25, Operation::Or),
    (0x27, Operation::Nor),
    (0x2A, Operation::Slt),
    (0x2B, Operation::Sltu),
];

/// Primary table selecting the operation by `opcode` for immediate and jump formats.
///
/// Opcode 0 is absent here; it always routes through [`FUNCT_TABLE`].
pub const OPCODE_TABLE: &[(u8, Operation)] = &[
    (0x02, Operation::J),
    (0x03, Operation::Jal),
    (0x04, Operation::Beq),
    (0x05, Operation::Bne),
    (0x06, Operation::Blez),
    (0x07, Operation::Bgtz),
    (0x08, Operation::Addi),
    (0x09, Operation::Addiu),
    (0x0A, Operation::Slti),
    (0x0B, Operation::Sltiu),
    (0x0C, Operation::Andi),
    (0x0D, Operation::Ori),
    (0x0F, Operation::Lui),
    (0x23, Operation::Lw),
    (0x24, Operation::Lbu),
    (0x25, Operation::Lhu),
    (0x28, Operation::Sb),
    (0x29, Operation::Sh),
    (0x2B, Operation::Sw),
];

fn lookup(table: &[(u8, Operation)], key: u8) -> Option<Operation> {
    table
        .iter()
        .find_map(|(entry, operation)| (*entry == key).then_some(*operation))
}

/// Resolves an `(opcode, funct)` pair to its operation.
///
/// `funct` is only consulted when `opcode` is [`SPECIAL_OPCODE`]. `None` means
/// the pair is illegal.
#[must_use]
pub fn classify(opcode: u8, funct: u8) -> Option<Operation> {
    if opcode == SPECIAL_OPCODE {
        lookup(FUNCT_TABLE, funct)
    } else {
        lookup(OPCODE_TABLE, opcode)
    }
}

/// Returns the `(opcode, funct)` pair that encodes `operation`.
///
/// `funct` is 0 for immediate and jump formats.
#[must_use]
pub fn encoding_of(operation: Operation) -> (u8, u8) {
    FUNCT_TABLE
        .iter()
        .find(|(_, entry)| *entry == operation)
        .map(|(funct, _)| (SPECIAL_OPCODE, *funct))
        .or_else(|| {
            OPCODE_TABLE
                .iter()
                .find(|(_, entry)| *entry == operation)
                .map(|(opcode, _)| (*opcode, 0))
        })
        .unwrap_or((SPECIAL_OPCODE, 0))
}
