//! Instruction decoder for the supported MIPS subset.
//!
//! Decoding runs in two stages. [`InstructionFields::extract`] slices a word
//! into its raw bit fields and never fails. [`Decoder::decode`] then resolves
//! the opcode (and funct, for register format) through the tables in
//! [`crate::encoding`] into an [`Instruction`] ready for dispatch.

use crate::encoding::{classify, encoding_of, Operation, HALT_SENTINEL};
use crate::fault::FaultCode;
use crate::state::Register;

/// Raw bit fields of a 32-bit instruction word.
///
/// Every field is extracted regardless of the word's format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstructionFields {
    /// Bits 31..26.
    pub opcode: u8,
    /// Bits 25..21.
    pub rs: u8,
    /// Bits 20..16.
    pub rt: u8,
    /// Bits 15..11.
    pub rd: u8,
    /// Bits 10..6.
    pub shamt: u8,
    /// Bits 5..0.
    pub funct: u8,
    /// Bits 15..0.
    pub imm: u16,
    /// Bits 25..0.
    pub address: u32,
}

impl InstructionFields {
    /// Slices `word` into its fields by mask and shift.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn extract(word: u32) -> Self {
        Self {
            opcode: ((word >> 26) & 0x3F) as u8,
            rs: ((word >> 21) & 0x1F) as u8,
            rt: ((word >> 16) & 0x1F) as u8,
            rd: ((word >> 11) & 0x1F) as u8,
            shamt: ((word >> 6) & 0x1F) as u8,
            funct: (word & 0x3F) as u8,
            imm: (word & 0xFFFF) as u16,
            address: word & 0x03FF_FFFF,
        }
    }

    /// Reassembles the register-format view `opcode | rs | rt | rd | shamt | funct`.
    #[must_use]
    pub const fn register_word(&self) -> u32 {
        register_word(self.opcode, self.rs, self.rt, self.rd, self.shamt, self.funct)
    }

    /// Reassembles the immediate-format view `opcode | rs | rt | imm`.
    #[must_use]
    pub const fn immediate_word(&self) -> u32 {
        immediate_word(self.opcode, self.rs, self.rt, self.imm)
    }

    /// Reassembles the jump-format view `opcode | address`.
    #[must_use]
    pub const fn jump_word(&self) -> u32 {
        jump_word(self.opcode, self.address)
    }
}

const fn register_word(opcode: u8, rs: u8, rt: u8, rd: u8, shamt: u8, funct: u8) -> u32 {
    ((opcode as u32 & 0x3F) << 26)
        | ((rs as u32 & 0x1F) << 21)
        | ((rt as u32 & 0x1F) << 16)
        | ((rd as u32 & 0x1F) << 11)
        | ((shamt as u32 & 0x1F) << 6)
        | (funct as u32 & 0x3F)
}

const fn immediate_word(opcode: u8, rs: u8, rt: u8, imm: u16) -> u32 {
    ((opcode as u32 & 0x3F) << 26)
        | ((rs as u32 & 0x1F) << 21)
        | ((rt as u32 & 0x1F) << 16)
        | imm as u32
}

const fn jump_word(opcode: u8, address: u32) -> u32 {
    ((opcode as u32 & 0x3F) << 26) | (address & 0x03FF_FFFF)
}

/// A decoded instruction, one variant per supported operation.
///
/// Immediates are kept as their raw 16-bit field; each operation applies
/// its own zero or sign extension at execute time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// The `0xfeedfeed` sentinel.
    Halt,
    /// Shift left logical by `shamt`.
    Sll {
        /// Destination register.
        rd: Register,
        /// Register shifted.
        rt: Register,
        /// Shift amount; only the low five bits are used.
        shamt: u8,
    },
    /// Shift right logical by `shamt`.
    Srl {
        /// Destination register.
        rd: Register,
        /// Register shifted.
        rt: Register,
        /// Shift amount; only the low five bits are used.
        shamt: u8,
    },
    /// Jump to the address in a register.
    Jr {
        /// Register holding the target address.
        rs: Register,
    },
    /// Add; overflow wraps.
    Add {
        /// Destination register.
        rd: Register,
        /// First source register.
        rs: Register,
        /// Second source register.
        rt: Register,
    },
    /// Add unsigned.
    Addu {
        /// Destination register.
        rd: Register,
        /// First source register.
        rs: Register,
        /// Second source register.
        rt: Register,
    },
    /// Subtract; overflow wraps.
    Sub {
        /// Destination register.
        rd: Register,
        /// First source register.
        rs: Register,
        /// Second source register.
        rt: Register,
    },
    /// Subtract unsigned.
    Subu {
        /// Destination register.
        rd: Register,
        /// First source register.
        rs: Register,
        /// Second source register.
        rt: Register,
    },
    /// Bitwise and.
    And {
        /// Destination register.
        rd: Register,
        /// First source register.
        rs: Register,
        /// Second source register.
        rt: Register,
    },
    /// Bitwise or.
    Or {
        /// Destination register.
        rd: Register,
        /// First source register.
        rs: Register,
        /// Second source register.
        rt: Register,
    },
    /// Bitwise nor.
    Nor {
        /// Destination register.
        rd: Register,
        /// First source register.
        rs: Register,
        /// Second source register.
        rt: Register,
    },
    /// Set on signed less-than.
    Slt {
        /// Destination register.
        rd: Register,
        /// First source register.
        rs: Register,
        /// Second source register.
        rt: Register,
    },
    /// Set on unsigned less-than.
    Sltu {
        /// Destination register.
        rd: Register,
        /// First source register.
        rs: Register,
        /// Second source register.
        rt: Register,
    },
    /// Jump; `target` is the raw 26-bit address field.
    J {
        /// Raw 26-bit word-address field.
        target: u32,
    },
    /// Jump and link; `target` is the raw 26-bit address field.
    Jal {
        /// Raw 26-bit word-address field.
        target: u32,
    },
    /// Branch if equal.
    Beq {
        /// First compared register.
        rs: Register,
        /// Second compared register.
        rt: Register,
        /// Signed word offset from the delay-slot successor.
        offset: u16,
    },
    /// Branch if not equal.
    Bne {
        /// First compared register.
        rs: Register,
        /// Second compared register.
        rt: Register,
        /// Signed word offset from the delay-slot successor.
        offset: u16,
    },
    /// Branch if less than or equal to zero, signed.
    Blez {
        /// Compared register.
        rs: Register,
        /// Signed word offset from the delay-slot successor.
        offset: u16,
    },
    /// Branch if greater than zero, signed.
    Bgtz {
        /// Compared register.
        rs: Register,
        /// Signed word offset from the delay-slot successor.
        offset: u16,
    },
    /// Add sign-extended immediate; overflow wraps.
    Addi {
        /// Destination register.
        rt: Register,
        /// Source register.
        rs: Register,
        /// Raw 16-bit immediate.
        imm: u16,
    },
    /// Add sign-extended immediate, unsigned.
    Addiu {
        /// Destination register.
        rt: Register,
        /// Source register.
        rs: Register,
        /// Raw 16-bit immediate.
        imm: u16,
    },
    /// Set on signed less-than immediate.
    Slti {
        /// Destination register.
        rt: Register,
        /// Source register.
        rs: Register,
        /// Raw 16-bit immediate.
        imm: u16,
    },
    /// Set on unsigned less-than sign-extended immediate.
    Sltiu {
        /// Destination register.
        rt: Register,
        /// Source register.
        rs: Register,
        /// Raw 16-bit immediate.
        imm: u16,
    },
    /// Bitwise and with zero-extended immediate.
    Andi {
        /// Destination register.
        rt: Register,
        /// Source register.
        rs: Register,
        /// Raw 16-bit immediate.
        imm: u16,
    },
    /// Bitwise or with zero-extended immediate.
    Ori {
        /// Destination register.
        rt: Register,
        /// Source register.
        rs: Register,
        /// Raw 16-bit immediate.
        imm: u16,
    },
    /// Load immediate into the upper half.
    Lui {
        /// Destination register.
        rt: Register,
        /// Value for the upper 16 bits.
        imm: u16,
    },
    /// Load word.
    Lw {
        /// Destination register.
        rt: Register,
        /// Base address register.
        base: Register,
        /// Signed byte offset from `base`.
        offset: u16,
    },
    /// Load byte, zero-extended.
    Lbu {
        /// Destination register.
        rt: Register,
        /// Base address register.
        base: Register,
        /// Signed byte offset from `base`.
        offset: u16,
    },
    /// Load halfword, zero-extended.
    Lhu {
        /// Destination register.
        rt: Register,
        /// Base address register.
        base: Register,
        /// Signed byte offset from `base`.
        offset: u16,
    },
    /// Store the low byte.
    Sb {
        /// Register holding the stored value.
        rt: Register,
        /// Base address register.
        base: Register,
        /// Signed byte offset from `base`.
        offset: u16,
    },
    /// Store the low halfword.
    Sh {
        /// Register holding the stored value.
        rt: Register,
        /// Base address register.
        base: Register,
        /// Signed byte offset from `base`.
        offset: u16,
    },
    /// Store word.
    Sw {
        /// Register holding the stored value.
        rt: Register,
        /// Base address register.
        base: Register,
        /// Signed byte offset from `base`.
        offset: u16,
    },
}

impl Instruction {
    /// Returns the table operation, or `None` for [`Instruction::Halt`].
    #[must_use]
    pub const fn operation(self) -> Option<Operation> {
        Some(match self {
            Self::Halt => return None,
            Self::Sll { .. } => Operation::Sll,
            Self::Srl { .. } => Operation::Srl,
            Self::Jr { .. } => Operation::Jr,
            Self::Add { .. } => Operation::Add,
            Self::Addu { .. } => Operation::Addu,
            Self::Sub { .. } => Operation::Sub,
            Self::Subu { .. } => Operation::Subu,
            Self::And { .. } => Operation::And,
            Self::Or { .. } => Operation::Or,
            Self::Nor { .. } => Operation::Nor,
            Self::Slt { .. } => Operation::Slt,
            Self::Sltu { .. } => Operation::Sltu,
            Self::J { .. } => Operation::J,
            Self::Jal { .. } => Operation::Jal,
            Self::Beq { .. } => Operation::Beq,
            Self::Bne { .. } => Operation::Bne,
            Self::Blez { .. } => Operation::Blez,
            Self::Bgtz { .. } => Operation::Bgtz,
            Self::Addi { .. } => Operation::Addi,
            Self::Addiu { .. } => Operation::Addiu,
            Self::Slti { .. } => Operation::Slti,
            Self::Sltiu { .. } => Operation::Sltiu,
            Self::Andi { .. } => Operation::Andi,
            Self::Ori { .. } => Operation::Ori,
            Self::Lui { .. } => Operation::Lui,
            Self::Lw { .. } => Operation::Lw,
            Self::Lbu { .. } => Operation::Lbu,
            Self::Lhu { .. } => Operation::Lhu,
            Self::Sb { .. } => Operation::Sb,
            Self::Sh { .. } => Operation::Sh,
            Self::Sw { .. } => Operation::Sw,
        })
    }

    /// Returns true when this instruction owns a delay slot.
    #[must_use]
    pub const fn is_control_transfer(self) -> bool {
        match self.operation() {
            Some(operation) => operation.is_control_transfer(),
            None => false,
        }
    }

    /// Re-encodes this instruction into its canonical 32-bit word.
    ///
    /// Fields an operation ignores (for example `shamt` of `add`) encode as 0.
    #[must_use]
    pub fn encode(self) -> u32 {
        let Some(operation) = self.operation() else {
            return HALT_SENTINEL;
        };
        let (opcode, funct) = encoding_of(operation);
        let reg = |r: Register| r as u8;

        match self {
            Self::Halt => HALT_SENTINEL,
            Self::Sll { rd, rt, shamt } | Self::Srl { rd, rt, shamt } => {
                register_word(opcode, 0, reg(rt), reg(rd), shamt, funct)
            }
            Self::Jr { rs } => register_word(opcode, reg(rs), 0, 0, 0, funct),
            Self::Add { rd, rs, rt }
            | Self::Addu { rd, rs, rt }
            | Self::Sub { rd, rs, rt }
            | Self::Subu { rd, rs, rt }
            | Self::And { rd, rs, rt }
            | Self::Or { rd, rs, rt }
            | Self::Nor { rd, rs, rt }
            | Self::Slt { rd, rs, rt }
            | Self::Sltu { rd, rs, rt } => {
                register_word(opcode, reg(rs), reg(rt), reg(rd), 0, funct)
            }
            Self::J { target } | Self::Jal { target } => jump_word(opcode, target),
            Self::Beq { rs, rt, offset } | Self::Bne { rs, rt, offset } => {
                immediate_word(opcode, reg(rs), reg(rt), offset)
            }
            Self::Blez { rs, offset } | Self::Bgtz { rs, offset } => {
                immediate_word(opcode, reg(rs), 0, offset)
            }
            Self::Addi { rt, rs, imm }
            | Self::Addiu { rt, rs, imm }
            | Self::Slti { rt, rs, imm }
            | Self::Sltiu { rt, rs, imm }
            | Self::Andi { rt, rs, imm }
            | Self::Ori { rt, rs, imm } => immediate_word(opcode, reg(rs), reg(rt), imm),
            Self::Lui { rt, imm } => immediate_word(opcode, 0, reg(rt), imm),
            Self::Lw { rt, base, offset }
            | Self::Lbu { rt, base, offset }
            | Self::Lhu { rt, base, offset }
            | Self::Sb { rt, base, offset }
            | Self::Sh { rt, base, offset }
            | Self::Sw { rt, base, offset } => immediate_word(opcode, reg(base), reg(rt), offset),
        }
    }
}

/// Instruction decoder for the supported MIPS subset.
#[derive(Debug, Clone, Copy)]
pub struct Decoder;

impl Decoder {
    /// Decodes a 32-bit instruction word.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::IllegalInstruction`] when the opcode, or the funct
    /// under opcode 0, is not recognised.
    pub fn decode(word: u32) -> Result<Instruction, FaultCode> {
        if word == HALT_SENTINEL {
            return Ok(Instruction::Halt);
        }

        let fields = InstructionFields::extract(word);
        let operation =
            classify(fields.opcode, fields.funct).ok_or(FaultCode::IllegalInstruction)?;

        let rs = Register::from_field(fields.rs);
        let rt = Register::from_field(fields.rt);
        let rd = Register::from_field(fields.rd);
        let imm = fields.imm;

        Ok(match operation {
            Operation::Sll => Instruction::Sll {
                rd,
                rt,
                shamt: fields.shamt,
            },
            Operation::Srl => Instruction::Srl {
                rd,
                rt,
                shamt: fields.shamt,
            },
            Operation::Jr => Instruction::Jr { rs },
            Operation::Add => Instruction::Add { rd, rs, rt },
            Operation::Addu => Instruction::Addu { rd, rs, rt },
            Operation::Sub => Instruction::Sub { rd, rs, rt },
            Operation::Subu => Instruction::Subu { rd, rs, rt },
            Operation::And => Instruction::And { rd, rs, rt },
            Operation::Or => Instruction::Or { rd, rs, rt },
            Operation::Nor => Instruction::Nor { rd, rs, rt },
            Operation::Slt => Instruction::Slt { rd, rs, rt },
            Operation::Sltu => Instruction::Sltu { rd, rs, rt },
            Operation::J => Instruction::J {
                target: fields.address,
            },
            Operation::Jal => Instruction::Jal {
                target: fields.address,
            },
            Operation::Beq => Instruction::Beq { rs, rt, offset: imm },
            Operation::Bne => Instruction::Bne { rs, rt, offset: imm },
            Operation::Blez => Instruction::Blez { rs, offset: imm },
            Operation::Bgtz => Instruction::Bgtz { rs, offset: imm },
            Operation::Addi => Instruction::Addi { rt, rs, imm },
            Operation::Addiu => Instruction::Addiu { rt, rs, imm },
            Operation::Slti => Instruction::Slti { rt, rs, imm },
            Operation::Sltiu => Instruction::Sltiu { rt, rs, imm },
            Operation::Andi => Instruction::Andi { rt, rs, imm },
            Operation::Ori => Instruction::Ori { rt, rs, imm },
            Operation::Lui => Instruction::Lui { rt, imm },
            Operation::Lw => Instruction::Lw {
                rt,
                base: rs,
                offset: imm,
            },
            Operation::Lbu => Instruction::Lbu {
                rt,
                base: rs,
                offset: imm,
            },
            Operation::Lhu => Instruction::Lhu {
                rt,
                base: rs,
                offset: imm,
            },
            Operation::Sb => Instruction::Sb {
                rt,
                base: rs,
                offset: imm,
            },
            Operation::Sh => Instruction::Sh {
                rt,
                base: rs,
                offset: imm,
            },
            Operation::Sw => Instruction::Sw {
                rt,
                base: rs,
                offset: imm,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::encoding::{FUNCT_TABLE, OPCODE_TABLE};

    #[test]
    fn extract_splits_register_format_word() {
        // add $a1, $v1, $a0
        let fields = InstructionFields::extract(0x0064_2820);
        assert_eq!(fields.opcode, 0);
        assert_eq!(fields.rs, 3);
        assert_eq!(fields.rt, 4);
        assert_eq!(fields.rd, 5);
        assert_eq!(fields.shamt, 0);
        assert_eq!(fields.funct, 0x20);
    }

    #[test]
    fn extract_splits_immediate_and_jump_format_words() {
        let fields = InstructionFields::extract(0x2022_0005);
        assert_eq!(fields.opcode, 0x08);
        assert_eq!(fields.rs, 1);
        assert_eq!(fields.rt, 2);
        assert_eq!(fields.imm, 5);

        let fields = InstructionFields::extract(0x0C00_0040);
        assert_eq!(fields.opcode, 0x03);
        assert_eq!(fields.address, 0x40);
    }

    proptest! {
        #[test]
        fn field_masks_partition_the_word(word in any::<u32>()) {
            let fields = InstructionFields::extract(word);
            prop_assert_eq!(fields.register_word(), word);
            prop_assert_eq!(fields.immediate_word(), word);
            prop_assert_eq!(fields.jump_word(), word);
        }

        #[test]
        fn decode_never_panics_and_faults_only_on_unknown_pairs(word in any::<u32>()) {
            let fields = InstructionFields::extract(word);
            match Decoder::decode(word) {
                Ok(Instruction::Halt) => prop_assert_eq!(word, HALT_SENTINEL),
                Ok(instruction) => {
                    prop_assert_eq!(
                        instruction.operation(),
                        classify(fields.opcode, fields.funct)
                    );
                }
                Err(code) => {
                    prop_assert_eq!(code, FaultCode::IllegalInstruction);
                    prop_assert!(classify(fields.opcode, fields.funct).is_none());
                }
            }
        }
    }

    #[rstest]
    #[case(0x0064_2820, Instruction::Add { rd: Register::A1, rs: Register::V1, rt: Register::A0 })]
    #[case(0x2022_0005, Instruction::Addi { rt: Register::V0, rs: Register::At, imm: 5 })]
    #[case(0x0000_0000, Instruction::Sll { rd: Register::Zero, rt: Register::Zero, shamt: 0 })]
    #[case(0x03E0_0008, Instruction::Jr { rs: Register::Ra })]
    #[case(0x1021_0000, Instruction::Beq { rs: Register::At, rt: Register::At, offset: 0 })]
    #[case(0x8FBF_0014, Instruction::Lw { rt: Register::Ra, base: Register::Sp, offset: 0x14 })]
    #[case(0x3C08_1234, Instruction::Lui { rt: Register::T0, imm: 0x1234 })]
    #[case(0x0800_0010, Instruction::J { target: 0x10 })]
    #[case(0xFEED_FEED, Instruction::Halt)]
    fn decodes_known_words(#[case] word: u32, #[case] expected: Instruction) {
        assert_eq!(Decoder::decode(word), Ok(expected));
        assert_eq!(expected.encode(), word);
    }

    #[rstest]
    #[case(0xFFFF_FFFF)]
    #[case(0x0000_0001)]
    #[case(0x0000_0026)]
    #[case(0x0400_0000)]
    #[case(0x3800_0000)]
    fn unknown_words_are_illegal(#[case] word: u32) {
        assert_eq!(Decoder::decode(word), Err(FaultCode::IllegalInstruction));
    }

    #[test]
    fn every_table_operation_decodes_and_reencodes() {
        let words = FUNCT_TABLE
            .iter()
            .map(|(funct, _)| register_word(0, 7, 8, 9, 3, *funct))
            .chain(
                OPCODE_TABLE
                    .iter()
                    .map(|(opcode, _)| immediate_word(*opcode, 7, 8, 0x8001)),
            );

        for word in words {
            let instruction = Decoder::decode(word).expect("table entry decodes");
            let again = Decoder::decode(instruction.encode()).expect("canonical word decodes");
            assert_eq!(again, instruction, "word {word:#010x}");
        }
    }

    #[test]
    fn control_transfer_classification_follows_operation() {
        assert!(Instruction::Jr { rs: Register::Ra }.is_control_transfer());
        assert!(Instruction::Jal { target: 0 }.is_control_transfer());
        assert!(!Instruction::Halt.is_control_transfer());
        assert!(!Instruction::Lui {
            rt: Register::T0,
            imm: 1
        }
        .is_control_transfer());
    }
}
