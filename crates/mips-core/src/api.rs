//! Public host-facing API for embedding the simulator core.

use crate::decoder::Instruction;
use crate::memory::AccessWidth;
use crate::state::{ArchitecturalState, Register, RunState};
use crate::Fault;

/// How writes that target register `$zero` are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ZeroRegisterPolicy {
    /// `$zero` is an ordinary register; writes land.
    #[default]
    Writable,
    /// Writes to `$zero` are discarded so it always reads 0.
    Hardwired,
}

/// Top-level immutable configuration for a core instance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreConfig {
    /// Treatment of writes to `$zero`.
    pub zero_register: ZeroRegisterPolicy,
    /// Stop a run after this many retired instructions. `None` runs until halt or fault.
    pub step_limit: Option<u64>,
    /// Enables trace callback dispatch.
    pub tracing_enabled: bool,
}

/// Complete host-visible core state used by the stepping APIs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreState {
    /// Register file and program counter.
    pub arch: ArchitecturalState,
    /// Treatment of writes to `$zero`, fixed at construction.
    pub zero_register: ZeroRegisterPolicy,
    /// Current execution state.
    pub run_state: RunState,
    /// Number of instructions retired so far, delay slots included.
    pub retired: u64,
}

impl CoreState {
    /// Creates a zeroed core state honouring `config`.
    #[must_use]
    pub fn with_config(config: &CoreConfig) -> Self {
        Self {
            zero_register: config.zero_register,
            ..Self::default()
        }
    }

    /// Writes a destination register, applying the `$zero` policy.
    pub fn write_register(&mut self, reg: Register, value: u32) {
        if reg == Register::Zero && self.zero_register == ZeroRegisterPolicy::Hardwired {
            return;
        }
        self.arch.set_gpr(reg, value);
    }

    /// Restores the power-on state: zeroed registers, `PC=0`, running.
    ///
    /// Memory is owned elsewhere and is left untouched.
    pub fn reset(&mut self) {
        self.arch = ArchitecturalState::default();
        self.run_state = RunState::Running;
        self.retired = 0;
    }
}

/// Control-flow intent of a branch or jump, applied once its delay slot has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlTransfer {
    /// Conditional branch with its outcome already evaluated.
    Branch {
        /// Whether the branch condition held.
        taken: bool,
        /// Raw 16-bit word offset field.
        offset: u16,
    },
    /// `j`: region-relative jump.
    Jump {
        /// Raw 26-bit address field.
        target: u32,
    },
    /// `jal`: region-relative jump that also links `$ra`.
    JumpAndLink {
        /// Raw 26-bit address field.
        target: u32,
    },
    /// `jr`: jump to the address held in a register.
    JumpRegister {
        /// Register read once the delay slot has executed.
        rs: Register,
    },
}

/// Output status from one step of the engine.
///
/// A step executes one instruction, or a branch/jump together with its
/// delay slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// Instructions retired normally.
    Retired {
        /// Number of instructions retired by this step (1, or 2 with a delay slot).
        instructions: u8,
    },
    /// The halt sentinel was fetched.
    Halted,
    /// Execution stopped on a fault.
    Fault {
        /// The raised fault.
        fault: Fault,
    },
}

/// Reason a run loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStop {
    /// The halt sentinel was fetched.
    Halted,
    /// A fault ended execution.
    Fault(Fault),
    /// [`CoreConfig::step_limit`] was reached.
    StepLimit,
}

/// Aggregated outcome from running the engine until it stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunOutcome {
    /// Number of instructions retired during this run call.
    pub steps: u64,
    /// Why the run stopped.
    pub stop: RunStop,
}

/// One memory access performed by an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryAccess {
    /// Effective address.
    pub addr: u32,
    /// Value read or written, zero-extended.
    pub value: u32,
    /// Access width.
    pub width: AccessWidth,
}

/// Trace events emitted at instruction boundaries when enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceEvent {
    /// A word was fetched and is about to execute.
    InstructionStart {
        /// Address the word was fetched from.
        pc: u32,
        /// Raw instruction word.
        word: u32,
    },
    /// An instruction finished executing.
    InstructionRetired {
        /// Address the instruction was fetched from.
        pc: u32,
        /// The decoded instruction.
        instruction: Instruction,
    },
    /// Memory access in commit order.
    MemoryAccess {
        /// The access performed.
        access: MemoryAccess,
        /// True for stores, false for loads.
        is_write: bool,
    },
    /// A fault stopped the engine.
    FaultRaised {
        /// The raised fault.
        fault: Fault,
    },
    /// The halt sentinel was fetched.
    Halted {
        /// Address the sentinel was fetched from.
        pc: u32,
    },
}

/// Sink trait for trace hooks.
pub trait TraceSink {
    /// Records an event in execution order.
    fn on_event(&mut self, event: TraceEvent);
}

/// Trace sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTraceSink;

impl TraceSink for NullTraceSink {
    fn on_event(&mut self, _event: TraceEvent) {}
}

impl TraceSink for Vec<TraceEvent> {
    fn on_event(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, CoreState, TraceEvent, TraceSink, ZeroRegisterPolicy};
    use crate::{Register, RunState};

    #[test]
    fn default_core_config_leaves_zero_writable_and_unbounded() {
        let config = CoreConfig::default();

        assert_eq!(config.zero_register, ZeroRegisterPolicy::Writable);
        assert_eq!(config.step_limit, None);
        assert!(!config.tracing_enabled);
    }

    #[test]
    fn writable_zero_register_accepts_writes() {
        let mut state = CoreState::default();
        state.write_register(Register::Zero, 7);
        assert_eq!(state.arch.gpr(Register::Zero), 7);
    }

    #[test]
    fn hardwired_zero_register_discards_writes() {
        let config = CoreConfig {
            zero_register: ZeroRegisterPolicy::Hardwired,
            ..CoreConfig::default()
        };
        let mut state = CoreState::with_config(&config);

        state.write_register(Register::Zero, 7);
        state.write_register(Register::T0, 9);

        assert_eq!(state.arch.gpr(Register::Zero), 0);
        assert_eq!(state.arch.gpr(Register::T0), 9);
    }

    #[test]
    fn reset_restores_boot_state_and_keeps_policy() {
        let config = CoreConfig {
            zero_register: ZeroRegisterPolicy::Hardwired,
            ..CoreConfig::default()
        };
        let mut state = CoreState::with_config(&config);
        state.arch.set_pc(0x40);
        state.write_register(Register::S0, 1);
        state.run_state = RunState::Halted;
        state.retired = 12;

        state.reset();

        assert_eq!(state.arch.pc(), 0);
        assert_eq!(state.arch.gpr(Register::S0), 0);
        assert_eq!(state.run_state, RunState::Running);
        assert_eq!(state.retired, 0);
        assert_eq!(state.zero_register, ZeroRegisterPolicy::Hardwired);
    }

    #[test]
    fn vec_sink_records_in_order() {
        let mut sink: Vec<TraceEvent> = Vec::new();
        sink.on_event(TraceEvent::Halted { pc: 4 });
        sink.on_event(TraceEvent::InstructionStart { pc: 8, word: 0 });
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[0], TraceEvent::Halted { pc: 4 });
    }
}
