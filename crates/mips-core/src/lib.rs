//! Core simulator crate for a 32-bit MIPS subset.
//!
//! The crate holds the fetch-decode-execute engine together with everything
//! it touches directly: the register file, the memory store contract, the
//! image loader and the final-state dump adapter. Formatting output files and
//! process handling live in the `mips-sim` binary crate.

/// Memory store contract and the sparse big-endian store.
pub mod memory;
pub use memory::{pack_be, unpack_be, AccessWidth, MemoryStore, SparseMemory};

/// Public host-facing API contract and integration types.
pub mod api;
pub use api::{
    ControlTransfer, CoreConfig, CoreState, MemoryAccess, NullTraceSink, RunOutcome, RunStop,
    StepOutcome, TraceEvent, TraceSink, ZeroRegisterPolicy,
};

/// Architectural CPU state model primitives.
pub mod state;
pub use state::{
    ArchitecturalState, Register, RunState, GENERAL_REGISTER_COUNT, INSTRUCTION_BYTES,
};

/// Opcode and funct classification tables.
pub mod encoding;
pub use encoding::{classify, encoding_of, Operation, HALT_SENTINEL, SPECIAL_OPCODE};

/// Instruction decode with field extraction and table lookup.
pub mod decoder;
pub use decoder::{Decoder, Instruction, InstructionFields};

/// Fault taxonomy for conditions that stop the engine.
pub mod fault;
pub use fault::{Fault, FaultCode, FAULT_EXIT_STATUS};

/// Instruction execution pipeline and delay-slot handling.
pub mod execute;
pub use execute::{
    apply_transfer, commit_execution, execute_instruction, execute_one, run, sign_extend,
    step_one, ExecuteOutcome, ExecuteState,
};

/// Flat binary image loading.
pub mod image;
pub use image::{load_image, read_image, ImageError};

/// Final-state dump adapter and register grouping.
pub mod dump;
pub use dump::{dump_state, RegisterInfo, StateDump};

/// Instruction disassembly.
pub mod disasm;
pub use disasm::{disassemble_range, disassemble_word, DisassemblyRow};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
