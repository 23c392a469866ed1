//! Command-line runner for the MIPS subset simulator.
//!
//! The binary loads a flat big-endian image, runs it on `mips-core` and
//! writes the final register and memory state to `reg_state.out` and
//! `mem_state.out`.

/// File-backed register and memory dumps.
pub mod dump;
/// Log subscriber setup.
pub mod logging;
/// Load, run and dump orchestration with exit statuses.
pub mod session;
/// Trace sink logging engine events.
pub mod trace;
