//! Instruction disassembly for the MIPS subset.
//!
//! This module converts instruction words into conventional assembler
//! syntax (`addi $v0, $at, 5`, `lw $t0, -4($sp)`). It is used by the
//! tracing sink of the command-line runner and by tests.

#![allow(clippy::cast_possible_wrap)]

use std::fmt;

use crate::decoder::{Decoder, Instruction};
use crate::memory::{AccessWidth, MemoryStore};
use crate::state::INSTRUCTION_BYTES;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single disassembled instruction row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// Address the word was read from.
    pub addr: u32,
    /// Raw instruction word.
    pub word: u32,
    /// The instruction mnemonic (e.g., "addi", "halt").
    pub mnemonic: String,
    /// The formatted operands (e.g., "$v0, $at, 5").
    pub operands: String,
    /// Whether this word does not decode.
    pub is_illegal: bool,
}

impl fmt::Display for DisassemblyRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}: {:08x}  {}", self.addr, self.word, self.mnemonic)?;
        if !self.operands.is_empty() {
            write!(f, " {}", self.operands)?;
        }
        Ok(())
    }
}

/// Disassembles one word. Illegal words render as `.word 0x... ; illegal`.
#[must_use]
pub fn disassemble_word(addr: u32, word: u32) -> DisassemblyRow {
    match Decoder::decode(word) {
        Ok(instr) => DisassemblyRow {
            addr,
            word,
            mnemonic: mnemonic(instr).to_string(),
            operands: format_operands(instr),
            is_illegal: false,
        },
        Err(_) => DisassemblyRow {
            addr,
            word,
            mnemonic: ".word".to_string(),
            operands: format!("{word:#010x} ; illegal"),
            is_illegal: true,
        },
    }
}

/// Disassembles `count` consecutive words starting at `start`.
#[must_use]
pub fn disassemble_range(
    start: u32,
    count: usize,
    memory: &dyn MemoryStore,
) -> Vec<DisassemblyRow> {
    let mut rows = Vec::with_capacity(count);
    let mut addr = start;
    for _ in 0..count {
        rows.push(disassemble_word(addr, memory.get(addr, AccessWidth::Word)));
        addr = addr.wrapping_add(INSTRUCTION_BYTES);
    }
    rows
}

fn mnemonic(instr: Instruction) -> &'static str {
    instr.operation().map_or("halt", |operation| operation.mnemonic())
}

fn format_operands(instr: Instruction) -> String {
    let signed = |imm: u16| imm as i16;

    match instr {
        Instruction::Halt => String::new(),
        Instruction::Sll { rd, rt, shamt } | Instruction::Srl { rd, rt, shamt } => {
            format!("{}, {}, {shamt}", rd.name(), rt.name())
        }
        Instruction::Jr { rs } => rs.name().to_string(),
        Instruction::Add { rd, rs, rt }
        | Instruction::Addu { rd, rs, rt }
        | Instruction::Sub { rd, rs, rt }
        | Instruction::Subu { rd, rs, rt }
        | Instruction::And { rd, rs, rt }
        | Instruction::Or { rd, rs, rt }
        | Instruction::Nor { rd, rs, rt }
        | Instruction::Slt { rd, rs, rt }
        | Instruction::Sltu { rd, rs, rt } => {
            format!("{}, {}, {}", rd.name(), rs.name(), rt.name())
        }
        Instruction::J { target } | Instruction::Jal { target } => {
            format!("{:#x}", (target & 0x03FF_FFFF) << 2)
        }
        Instruction::Beq { rs, rt, offset } | Instruction::Bne { rs, rt, offset } => {
            format!("{}, {}, {}", rs.name(), rt.name(), signed(offset))
        }
        Instruction::Blez { rs, offset } | Instruction::Bgtz { rs, offset } => {
            format!("{}, {}", rs.name(), signed(offset))
        }
        Instruction::Addi { rt, rs, imm }
        | Instruction::Addiu { rt, rs, imm }
        | Instruction::Slti { rt, rs, imm }
        | Instruction::Sltiu { rt, rs, imm } => {
            format!("{}, {}, {}", rt.name(), rs.name(), signed(imm))
        }
        Instruction::Andi { rt, rs, imm } | Instruction::Ori { rt, rs, imm } => {
            format!("{}, {}, {imm:#x}", rt.name(), rs.name())
        }
        Instruction::Lui { rt, imm } => format!("{}, {imm:#x}", rt.name()),
        Instruction::Lw { rt, base, offset }
        | Instruction::Lbu { rt, base, offset }
        | Instruction::Lhu { rt, base, offset }
        | Instruction::Sb { rt, base, offset }
        | Instruction::Sh { rt, base, offset }
        | Instruction::Sw { rt, base, offset } => {
            format!("{}, {}({})", rt.name(), signed(offset), base.name())
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operands = format_operands(*self);
        if operands.is_empty() {
            f.write_str(mnemonic(*self))
        } else {
            write!(f, "{} {operands}", mnemonic(*self))
        }
    }
}
