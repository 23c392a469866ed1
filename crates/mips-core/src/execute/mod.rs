//! Fetch-decode-execute engine.
//!
//! Each instruction runs in two phases. [`execute_instruction`] reads
//! operands and memory and records every side effect in an
//! [`ExecuteState`]; [`commit_execution`] then applies them to the core
//! state and memory store. Branches and jumps do not touch the program
//! counter directly: they return a [`ControlTransfer`] that [`step_one`]
//! applies only after the following instruction (the delay slot) has been
//! executed.

#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

mod helpers;

pub use helpers::{
    branch_displacement, effective_address, jump_target, sign_extend, sign_extend_imm16,
    BRANCH_OFFSET_SIGN_BIT, IMM16_SIGN_BIT, JUMP_REGION_MASK,
};

use crate::api::{ControlTransfer, MemoryAccess, NullTraceSink};
use crate::decoder::{Decoder, Instruction};
use crate::memory::{AccessWidth, MemoryStore};
use crate::state::{Register, RunState};
use crate::{
    CoreConfig, CoreState, Fault, FaultCode, RunOutcome, RunStop, StepOutcome, TraceEvent,
    TraceSink,
};

/// Outcome of executing a single decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteOutcome {
    /// Instruction retired; the program counter simply advances.
    Retired,
    /// Instruction retired and requests a control transfer after its delay slot.
    Transfer(ControlTransfer),
    /// The halt sentinel was executed.
    Halted,
}

/// Side effects computed by [`execute_instruction`] and applied by [`commit_execution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecuteState {
    /// Destination register and the value to write into it.
    pub write_back: Option<(Register, u32)>,
    /// Load performed while computing the result.
    pub memory_read: Option<MemoryAccess>,
    /// Store to perform at commit.
    pub memory_write: Option<MemoryAccess>,
    /// Control transfer requested by a branch or jump.
    pub transfer: Option<ControlTransfer>,
    /// Whether the halt sentinel was executed.
    pub halt: bool,
}

impl ExecuteState {
    fn write(&mut self, rd: Register, value: u32) {
        self.write_back = Some((rd, value));
    }

    fn load(&mut self, rt: Register, memory: &dyn MemoryStore, addr: u32, width: AccessWidth) {
        let value = memory.get(addr, width);
        self.memory_read = Some(MemoryAccess { addr, value, width });
        self.write(rt, value);
    }

    fn store(&mut self, addr: u32, value: u32, width: AccessWidth) {
        self.memory_write = Some(MemoryAccess {
            addr,
            value: value & width.mask(),
            width,
        });
    }

    fn branch(&mut self, taken: bool, offset: u16) {
        self.transfer = Some(ControlTransfer::Branch { taken, offset });
    }
}

const fn set_if(condition: bool) -> u32 {
    if condition {
        1
    } else {
        0
    }
}

/// Computes the effects of `instr` against the current state without applying them.
///
/// Memory is only read here; stores are deferred to [`commit_execution`].
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn execute_instruction(
    instr: &Instruction,
    state: &CoreState,
    memory: &dyn MemoryStore,
) -> (ExecuteOutcome, ExecuteState) {
    let reg = |r: Register| state.arch.gpr(r);
    let mut exec = ExecuteState::default();

    match *instr {
        Instruction::Halt => exec.halt = true,
        Instruction::Sll { rd, rt, shamt } => exec.write(rd, reg(rt) << (shamt & 0x1F)),
        Instruction::Srl { rd, rt, shamt } => exec.write(rd, reg(rt) >> (shamt & 0x1F)),
        Instruction::Jr { rs } => exec.transfer = Some(ControlTransfer::JumpRegister { rs }),
        Instruction::Add { rd, rs, rt } | Instruction::Addu { rd, rs, rt } => {
            exec.write(rd, reg(rs).wrapping_add(reg(rt)));
        }
        Instruction::Sub { rd, rs, rt } | Instruction::Subu { rd, rs, rt } => {
            exec.write(rd, reg(rs).wrapping_sub(reg(rt)));
        }
        Instruction::And { rd, rs, rt } => exec.write(rd, reg(rs) & reg(rt)),
        Instruction::Or { rd, rs, rt } => exec.write(rd, reg(rs) | reg(rt)),
        Instruction::Nor { rd, rs, rt } => exec.write(rd, !(reg(rs) | reg(rt))),
        Instruction::Slt { rd, rs, rt } => {
            exec.write(rd, set_if((reg(rs) as i32) < (reg(rt) as i32)));
        }
        Instruction::Sltu { rd, rs, rt } => exec.write(rd, set_if(reg(rs) < reg(rt))),
        Instruction::J { target } => exec.transfer = Some(ControlTransfer::Jump { target }),
        Instruction::Jal { target } => {
            exec.transfer = Some(ControlTransfer::JumpAndLink { target });
        }
        Instruction::Beq { rs, rt, offset } => exec.branch(reg(rs) == reg(rt), offset),
        Instruction::Bne { rs, rt, offset } => exec.branch(reg(rs) != reg(rt), offset),
        Instruction::Blez { rs, offset } => exec.branch((reg(rs) as i32) <= 0, offset),
        Instruction::Bgtz { rs, offset } => exec.branch((reg(rs) as i32) > 0, offset),
        Instruction::Addi { rt, rs, imm } | Instruction::Addiu { rt, rs, imm } => {
            exec.write(rt, reg(rs).wrapping_add(sign_extend_imm16(imm)));
        }
        Instruction::Slti { rt, rs, imm } => {
            let imm = sign_extend(u32::from(imm), IMM16_SIGN_BIT);
            exec.write(rt, set_if((reg(rs) as i32) < imm));
        }
        Instruction::Sltiu { rt, rs, imm } => {
            exec.write(rt, set_if(reg(rs) < sign_extend_imm16(imm)));
        }
        Instruction::Andi { rt, rs, imm } => exec.write(rt, reg(rs) & u32::from(imm)),
        Instruction::Ori { rt, rs, imm } => exec.write(rt, reg(rs) | u32::from(imm)),
        Instruction::Lui { rt, imm } => exec.write(rt, u32::from(imm) << 16),
        Instruction::Lw { rt, base, offset } => {
            exec.load(rt, memory, effective_address(reg(base), offset), AccessWidth::Word);
        }
        Instruction::Lbu { rt, base, offset } => {
            exec.load(rt, memory, effective_address(reg(base), offset), AccessWidth::Byte);
        }
        Instruction::Lhu { rt, base, offset } => {
            exec.load(rt, memory, effective_address(reg(base), offset), AccessWidth::Half);
        }
        Instruction::Sb { rt, base, offset } => {
            exec.store(effective_address(reg(base), offset), reg(rt), AccessWidth::Byte);
        }
        Instruction::Sh { rt, base, offset } => {
            exec.store(effective_address(reg(base), offset), reg(rt), AccessWidth::Half);
        }
        Instruction::Sw { rt, base, offset } => {
            exec.store(effective_address(reg(base), offset), reg(rt), AccessWidth::Word);
        }
    }

    let outcome = if exec.halt {
        ExecuteOutcome::Halted
    } else if let Some(transfer) = exec.transfer {
        ExecuteOutcome::Transfer(transfer)
    } else {
        ExecuteOutcome::Retired
    };

    (outcome, exec)
}

/// Applies the side effects recorded in `exec` to the core state and memory.
pub fn commit_execution(
    state: &mut CoreState,
    memory: &mut dyn MemoryStore,
    exec: &ExecuteState,
    trace: &mut dyn TraceSink,
) {
    if let Some(access) = exec.memory_read {
        trace.on_event(TraceEvent::MemoryAccess {
            access,
            is_write: false,
        });
    }

    if let Some(access) = exec.memory_write {
        memory.set(access.addr, access.value, access.width);
        trace.on_event(TraceEvent::MemoryAccess {
            access,
            is_write: true,
        });
    }

    if let Some((rd, value)) = exec.write_back {
        state.write_register(rd, value);
    }
}

/// Redirects the program counter once the delay slot of `transfer` has executed.
///
/// All targets are computed from the post-delay-slot program counter.
pub fn apply_transfer(state: &mut CoreState, transfer: ControlTransfer) {
    let pc = state.arch.pc();
    match transfer {
        ControlTransfer::Branch { taken, offset } => {
            if taken {
                state.arch.set_pc(pc.wrapping_add(branch_displacement(offset)));
            }
        }
        ControlTransfer::Jump { target } => state.arch.set_pc(jump_target(pc, target)),
        ControlTransfer::JumpAndLink { target } => {
            state.write_register(Register::Ra, pc);
            state.arch.set_pc(jump_target(pc, target));
        }
        ControlTransfer::JumpRegister { rs } => state.arch.set_pc(state.arch.gpr(rs)),
    }
}

/// Fetches, decodes and executes the single instruction at the program counter.
///
/// The program counter is advanced past the fetched word before the
/// instruction executes. Control transfers are returned, not applied.
/// When `in_delay_slot` is set, a branch or jump is rejected before any of
/// its effects are committed.
///
/// # Errors
///
/// Returns a [`Fault`] when the fetched word does not decode, or when it is
/// a control transfer fetched from a delay slot.
pub fn execute_one(
    state: &mut CoreState,
    memory: &mut dyn MemoryStore,
    trace: &mut dyn TraceSink,
    in_delay_slot: bool,
) -> Result<ExecuteOutcome, Fault> {
    let pc = state.arch.pc();
    let word = memory.get(pc, AccessWidth::Word);
    trace.on_event(TraceEvent::InstructionStart { pc, word });
    state.arch.advance_pc();

    let instruction = Decoder::decode(word).map_err(|code| Fault::new(code, pc, word))?;
    if in_delay_slot && instruction.is_control_transfer() {
        return Err(Fault::new(FaultCode::ControlTransferInDelaySlot, pc, word));
    }

    let (outcome, exec) = execute_instruction(&instruction, state, memory);
    if outcome == ExecuteOutcome::Halted {
        trace.on_event(TraceEvent::Halted { pc });
        return Ok(outcome);
    }

    commit_execution(state, memory, &exec, trace);
    state.retired = state.retired.wrapping_add(1);
    trace.on_event(TraceEvent::InstructionRetired { pc, instruction });

    Ok(outcome)
}

fn latch_fault(state: &mut CoreState, fault: Fault, trace: &mut dyn TraceSink) -> StepOutcome {
    tracing::warn!(%fault, "execution faulted");
    state.run_state = RunState::FaultLatched(fault);
    trace.on_event(TraceEvent::FaultRaised { fault });
    StepOutcome::Fault { fault }
}

fn latch_halt(state: &mut CoreState) -> StepOutcome {
    tracing::debug!(retired = state.retired, "halt sentinel reached");
    state.run_state = RunState::Halted;
    StepOutcome::Halted
}

/// Advances the machine by one instruction, or by a branch/jump plus its delay slot.
///
/// A stopped machine stays stopped: once halted or faulted, further calls
/// report the same outcome without executing anything.
pub fn step_one(
    state: &mut CoreState,
    memory: &mut dyn MemoryStore,
    trace: &mut dyn TraceSink,
) -> StepOutcome {
    if state.run_state.is_stopped() {
        return state
            .run_state
            .latched_fault()
            .map_or(StepOutcome::Halted, |fault| StepOutcome::Fault { fault });
    }

    let transfer = match execute_one(state, memory, trace, false) {
        Ok(ExecuteOutcome::Retired) => return StepOutcome::Retired { instructions: 1 },
        Ok(ExecuteOutcome::Halted) => return latch_halt(state),
        Ok(ExecuteOutcome::Transfer(transfer)) => transfer,
        Err(fault) => return latch_fault(state, fault, trace),
    };

    match execute_one(state, memory, trace, true) {
        Ok(ExecuteOutcome::Halted) => latch_halt(state),
        Ok(ExecuteOutcome::Retired | ExecuteOutcome::Transfer(_)) => {
            apply_transfer(state, transfer);
            StepOutcome::Retired { instructions: 2 }
        }
        Err(fault) => latch_fault(state, fault, trace),
    }
}

/// Steps the machine until it halts, faults, or reaches the configured step limit.
///
/// The limit is checked between steps, so a branch and its delay slot always
/// retire together and may overshoot the limit by one instruction.
pub fn run(
    state: &mut CoreState,
    memory: &mut dyn MemoryStore,
    config: &CoreConfig,
    trace: &mut dyn TraceSink,
) -> RunOutcome {
    let mut null_sink = NullTraceSink;
    let sink: &mut dyn TraceSink = if config.tracing_enabled {
        trace
    } else {
        &mut null_sink
    };
    let start = state.retired;

    loop {
        let steps = state.retired.wrapping_sub(start);
        if config.step_limit.is_some_and(|limit| steps >= limit) {
            tracing::debug!(steps, "step limit reached");
            return RunOutcome {
                steps,
                stop: RunStop::StepLimit,
            };
        }

        let stop = match step_one(state, memory, sink) {
            StepOutcome::Retired { .. } => continue,
            StepOutcome::Halted => RunStop::Halted,
            StepOutcome::Fault { fault } => RunStop::Fault(fault),
        };

        return RunOutcome {
            steps: state.retired.wrapping_sub(start),
            stop,
        };
    }
}
