//! One simulator run: load the image, execute, dump and pick an exit status.

use std::path::{Path, PathBuf};

use mips_core::{
    disassemble_range, dump_state, load_image, read_image, run, CoreConfig, CoreState,
    DisassemblyRow, Fault, ImageError, MemoryStore, RunStop, SparseMemory, INSTRUCTION_BYTES,
};
use thiserror::Error;

use crate::dump::{DumpError, DumpFormat, FileStateDump};
use crate::trace::LogTraceSink;

/// Exit status of a run that reached the halt sentinel.
pub const EXIT_SUCCESS: u8 = 0;
/// Exit status for usage errors, unreadable images and dump failures.
pub const EXIT_STARTUP_FAILURE: u8 = 1;
/// Exit status of a run stopped by `--max-steps`.
pub const EXIT_STEP_LIMIT: u8 = 2;

/// Words disassembled ahead of a faulting instruction.
const FAULT_CONTEXT_BEFORE: u32 = 2;
/// Rows in a fault context listing.
const FAULT_CONTEXT_ROWS: usize = 5;

/// Everything a run needs, as parsed from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimArgs {
    /// Program image to load at address 0.
    pub image: PathBuf,
    /// Directory receiving the dump files.
    pub out_dir: PathBuf,
    /// Dump file encoding.
    pub format: DumpFormat,
    /// Engine configuration.
    pub config: CoreConfig,
}

impl SimArgs {
    /// Arguments for `image` with every option at its default.
    #[must_use]
    pub fn new(image: PathBuf) -> Self {
        Self {
            image,
            out_dir: PathBuf::from("."),
            format: DumpFormat::default(),
            config: CoreConfig::default(),
        }
    }
}

/// Failure that prevents a run from completing normally.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The program image could not be loaded.
    #[error(transparent)]
    Image(#[from] ImageError),
    /// A dump file could not be written.
    #[error(transparent)]
    Dump(#[from] DumpError),
}

impl SessionError {
    /// Process exit status for this error.
    #[must_use]
    pub const fn exit_status(&self) -> u8 {
        match self {
            Self::Image(_) | Self::Dump(_) => EXIT_STARTUP_FAILURE,
        }
    }
}

/// How a completed run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The halt sentinel was reached and state was dumped.
    Halted {
        /// Instructions retired.
        steps: u64,
    },
    /// The step limit was reached and state was dumped.
    StepLimit {
        /// Instructions retired.
        steps: u64,
    },
    /// A fault stopped the engine.
    Fault(Fault),
}

impl SessionOutcome {
    /// Process exit status for this outcome.
    #[must_use]
    pub const fn exit_status(&self) -> u8 {
        match self {
            Self::Halted { .. } => EXIT_SUCCESS,
            Self::StepLimit { .. } => EXIT_STEP_LIMIT,
            Self::Fault(fault) => fault.code.exit_status(),
        }
    }
}

/// Dumps a power-on register file and empty memory into `out_dir`.
///
/// Used when the command line is rejected before an image is loaded.
///
/// # Errors
///
/// Returns [`DumpError`] when a dump file cannot be written.
pub fn dump_zeroed_state(out_dir: &Path, format: DumpFormat) -> Result<(), DumpError> {
    let mut dumper = FileStateDump::new(out_dir, format);
    dump_state(&mut dumper, &CoreState::default(), &SparseMemory::new())
}

/// Disassembles the words around a fault, the faulting word in the middle.
#[must_use]
pub fn fault_context(fault: &Fault, memory: &dyn MemoryStore) -> Vec<DisassemblyRow> {
    let start = fault.pc.wrapping_sub(FAULT_CONTEXT_BEFORE * INSTRUCTION_BYTES);
    disassemble_range(start, FAULT_CONTEXT_ROWS, memory)
}

/// Loads, runs and dumps one program.
///
/// A startup failure dumps the zeroed state before returning its error.
/// Faults are returned as [`SessionOutcome::Fault`] without a dump; the
/// surrounding code is logged at `debug` level.
///
/// # Errors
///
/// Returns [`SessionError`] when the image cannot be loaded or a dump file
/// cannot be written.
pub fn run_session(args: &SimArgs) -> Result<SessionOutcome, SessionError> {
    let mut dumper = FileStateDump::new(&args.out_dir, args.format);
    let mut state = CoreState::with_config(&args.config);
    let mut memory = SparseMemory::new();

    let loaded = read_image(&args.image).and_then(|bytes| load_image(&bytes, &mut memory));
    if let Err(err) = loaded {
        tracing::debug!(image = %args.image.display(), "startup failed, dumping zeroed state");
        dump_state(&mut dumper, &state, &memory)?;
        return Err(err.into());
    }

    let mut sink = LogTraceSink::default();
    let outcome = run(&mut state, &mut memory, &args.config, &mut sink);
    tracing::info!(
        steps = outcome.steps,
        events = sink.events(),
        stop = ?outcome.stop,
        "run finished"
    );

    let session = match outcome.stop {
        RunStop::Halted => SessionOutcome::Halted {
            steps: outcome.steps,
        },
        RunStop::StepLimit => SessionOutcome::StepLimit {
            steps: outcome.steps,
        },
        RunStop::Fault(fault) => {
            for row in fault_context(&fault, &memory) {
                tracing::debug!("{row}");
            }
            return Ok(SessionOutcome::Fault(fault));
        }
    };

    dump_state(&mut dumper, &state, &memory)?;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use mips_core::{load_image, CoreConfig, Fault, FaultCode, SparseMemory, HALT_SENTINEL};

    use super::{fault_context, run_session, SessionError, SessionOutcome, SimArgs};
    use crate::dump::{MEMORY_DUMP_FILE, REGISTER_DUMP_FILE};

    fn write_image(dir: &Path, words: &[u32]) -> std::path::PathBuf {
        let path = dir.join("program.bin");
        let bytes: Vec<u8> = words.iter().flat_map(|word| word.to_be_bytes()).collect();
        fs::write(&path, bytes).expect("write image");
        path
    }

    fn args_in(dir: &Path, image: std::path::PathBuf) -> SimArgs {
        SimArgs {
            out_dir: dir.join("out"),
            ..SimArgs::new(image)
        }
    }

    #[test]
    fn halted_run_dumps_and_succeeds() {
        let dir = tempfile::tempdir().expect("tempdir");
        let image = write_image(dir.path(), &[0x1021_0000, 0x2006_0001, HALT_SENTINEL]);
        let args = args_in(dir.path(), image);

        let outcome = run_session(&args).expect("run completes");

        assert_eq!(outcome, SessionOutcome::Halted { steps: 2 });
        assert_eq!(outcome.exit_status(), 0);
        let registers =
            fs::read_to_string(args.out_dir.join(REGISTER_DUMP_FILE)).expect("register dump");
        assert!(registers.contains("$a2: 0x00000001\n"));
    }

    #[test]
    fn illegal_instruction_skips_dump() {
        let dir = tempfile::tempdir().expect("tempdir");
        let image = write_image(dir.path(), &[0xFFFF_FFFF]);
        let args = args_in(dir.path(), image);

        let outcome = run_session(&args).expect("fault is an outcome, not an error");

        let SessionOutcome::Fault(fault) = outcome else {
            panic!("expected a fault, got {outcome:?}");
        };
        assert_eq!(fault.code, FaultCode::IllegalInstruction);
        assert_eq!(outcome.exit_status(), 127);
        assert!(!args.out_dir.join(REGISTER_DUMP_FILE).exists());
        assert!(!args.out_dir.join(MEMORY_DUMP_FILE).exists());
    }

    #[test]
    fn fault_context_centres_the_faulting_word() {
        let mut memory = SparseMemory::new();
        let image: Vec<u8> = [0x2022_0005_u32, 0, 0xFFFF_FFFF, HALT_SENTINEL]
            .iter()
            .flat_map(|word| word.to_be_bytes())
            .collect();
        load_image(&image, &mut memory).expect("aligned image");
        let fault = Fault::new(FaultCode::IllegalInstruction, 8, 0xFFFF_FFFF);

        let rows = fault_context(&fault, &memory);

        let addrs: Vec<u32> = rows.iter().map(|row| row.addr).collect();
        assert_eq!(addrs, vec![0, 4, 8, 12, 16]);
        assert!(rows[2].is_illegal);
        assert_eq!(rows[0].to_string(), "0x00000000: 20220005  addi $v0, $at, 5");
        assert_eq!(rows[3].mnemonic, "halt");
    }

    #[test]
    fn fault_context_wraps_below_address_zero() {
        let memory = SparseMemory::new();
        let fault = Fault::new(FaultCode::IllegalInstruction, 0, 0xFFFF_FFFF);

        let rows = fault_context(&fault, &memory);

        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].addr, 0xFFFF_FFF8);
        assert_eq!(rows[2].addr, 0);
    }

    #[test]
    fn misaligned_image_dumps_zeroed_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let image = dir.path().join("short.bin");
        fs::write(&image, [0x20, 0x22, 0x00]).expect("write image");
        let args = args_in(dir.path(), image);

        let err = run_session(&args).expect_err("misaligned image is rejected");

        assert!(matches!(err, SessionError::Image(_)));
        assert_eq!(err.exit_status(), 1);
        let registers =
            fs::read_to_string(args.out_dir.join(REGISTER_DUMP_FILE)).expect("register dump");
        assert!(registers.lines().all(|line| line.ends_with(": 0x00000000")));
        let memory = fs::read_to_string(args.out_dir.join(MEMORY_DUMP_FILE)).expect("memory dump");
        assert!(memory.is_empty());
    }

    #[test]
    fn step_limit_dumps_and_reports_status_two() {
        let dir = tempfile::tempdir().expect("tempdir");
        // 0: j 0 ; 4: nop
        let image = write_image(dir.path(), &[0x0800_0000, 0]);
        let args = SimArgs {
            config: CoreConfig {
                step_limit: Some(8),
                ..CoreConfig::default()
            },
            ..args_in(dir.path(), image)
        };

        let outcome = run_session(&args).expect("run completes");

        assert_eq!(outcome, SessionOutcome::StepLimit { steps: 8 });
        assert_eq!(outcome.exit_status(), 2);
        assert!(args.out_dir.join(MEMORY_DUMP_FILE).exists());
    }
}
