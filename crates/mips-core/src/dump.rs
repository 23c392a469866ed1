//! Final-state dump adapter.
//!
//! The engine never formats output itself. At the end of a run the host
//! hands the register file, grouped by calling-convention role, and the
//! memory store to a [`StateDump`] implementation.

use crate::memory::MemoryStore;
use crate::state::{Register, GENERAL_REGISTER_COUNT};
use crate::CoreState;

/// Register file grouped by calling-convention role. `$zero` is not included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterInfo {
    /// `$at` (1).
    pub at: u32,
    /// `$v0..$v1` (2-3).
    pub v: [u32; 2],
    /// `$a0..$a3` (4-7).
    pub a: [u32; 4],
    /// `$t0..$t7` (8-15) followed by `$t8..$t9` (24-25).
    pub t: [u32; 10],
    /// `$s0..$s7` (16-23).
    pub s: [u32; 8],
    /// `$k0..$k1` (26-27).
    pub k: [u32; 2],
    /// `$gp` (28).
    pub gp: u32,
    /// `$sp` (29).
    pub sp: u32,
    /// `$fp` (30).
    pub fp: u32,
    /// `$ra` (31).
    pub ra: u32,
}

fn copy_range<const N: usize>(regs: &[u32; GENERAL_REGISTER_COUNT], first: Register) -> [u32; N] {
    let mut out = [0; N];
    out.copy_from_slice(&regs[first.index()..first.index() + N]);
    out
}

impl RegisterInfo {
    /// Groups a register file indexed by register number.
    #[must_use]
    pub fn from_registers(regs: &[u32; GENERAL_REGISTER_COUNT]) -> Self {
        let low_t: [u32; 8] = copy_range(regs, Register::T0);
        let high_t: [u32; 2] = copy_range(regs, Register::T8);
        let mut t = [0; 10];
        t[..8].copy_from_slice(&low_t);
        t[8..].copy_from_slice(&high_t);

        Self {
            at: regs[Register::At.index()],
            v: copy_range(regs, Register::V0),
            a: copy_range(regs, Register::A0),
            t,
            s: copy_range(regs, Register::S0),
            k: copy_range(regs, Register::K0),
            gp: regs[Register::Gp.index()],
            sp: regs[Register::Sp.index()],
            fp: regs[Register::Fp.index()],
            ra: regs[Register::Ra.index()],
        }
    }

    /// Named registers and their values in register-number order, `$at` first.
    #[must_use]
    pub fn named_values(&self) -> Vec<(Register, u32)> {
        let mut regs = [0; GENERAL_REGISTER_COUNT];
        regs[Register::At.index()] = self.at;
        regs[Register::V0.index()..=Register::V1.index()].copy_from_slice(&self.v);
        regs[Register::A0.index()..=Register::A3.index()].copy_from_slice(&self.a);
        regs[Register::T0.index()..=Register::T7.index()].copy_from_slice(&self.t[..8]);
        regs[Register::S0.index()..=Register::S7.index()].copy_from_slice(&self.s);
        regs[Register::T8.index()..=Register::T9.index()].copy_from_slice(&self.t[8..]);
        regs[Register::K0.index()..=Register::K1.index()].copy_from_slice(&self.k);
        regs[Register::Gp.index()] = self.gp;
        regs[Register::Sp.index()] = self.sp;
        regs[Register::Fp.index()] = self.fp;
        regs[Register::Ra.index()] = self.ra;

        Register::ALL[1..]
            .iter()
            .map(|reg| (*reg, regs[reg.index()]))
            .collect()
    }
}

/// Receiver of the final architectural state.
pub trait StateDump {
    /// Error produced while writing the dump.
    type Error;

    /// Records the grouped register file.
    ///
    /// # Errors
    ///
    /// Implementation-defined output failure.
    fn dump_register_state(&mut self, registers: &RegisterInfo) -> Result<(), Self::Error>;

    /// Records the contents of memory.
    ///
    /// # Errors
    ///
    /// Implementation-defined output failure.
    fn dump_memory_state(&mut self, memory: &dyn MemoryStore) -> Result<(), Self::Error>;
}

/// Dumps registers then memory, each exactly once.
///
/// # Errors
///
/// Propagates the first failure from `dumper`; memory is not dumped if the
/// register dump fails.
pub fn dump_state<D: StateDump + ?Sized>(
    dumper: &mut D,
    state: &CoreState,
    memory: &dyn MemoryStore,
) -> Result<(), D::Error> {
    let registers = RegisterInfo::from_registers(state.arch.registers());
    dumper.dump_register_state(&registers)?;
    dumper.dump_memory_state(memory)
}
