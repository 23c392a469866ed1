//! Architectural CPU state model primitives.

/// Architectural register file types and storage model.
pub mod registers;
/// Engine run-state machine.
pub mod run_state;

pub use registers::{ArchitecturalState, Register, GENERAL_REGISTER_COUNT, INSTRUCTION_BYTES};
pub use run_state::RunState;
