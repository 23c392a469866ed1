//! CLI entry point for the MIPS subset simulator.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use mips_core::{CoreConfig, ZeroRegisterPolicy};
use mips_sim::dump::DumpFormat;
use mips_sim::logging::init_logging;
use mips_sim::session::{
    dump_zeroed_state, run_session, SessionOutcome, SimArgs, EXIT_STARTUP_FAILURE,
};
use serde as _;
use serde_json as _;
#[cfg(test)]
use tempfile as _;
use thiserror as _;
use tracing as _;
use tracing_subscriber as _;

const USAGE_TEXT: &str = "\
Usage: mips-sim [options] <image>

Runs a flat big-endian MIPS image loaded at address 0 until the
0xfeedfeed sentinel, then writes reg_state.out and mem_state.out.

Options:
  -o, --out-dir <dir>    Directory for the dump files (default: .)
      --format <fmt>     Dump format: text or json (default: text)
      --max-steps <n>    Stop after n retired instructions (exit status 2)
      --hardwire-zero    Discard writes to $zero
      --trace            Log every instruction to stderr
  -h, --help             Show this help message

Exit status:
  0    halted on the sentinel
  1    bad arguments, unreadable image or failed dump
  2    step limit reached
  127  illegal instruction
";

#[derive(Debug)]
enum ParseResult {
    Run(SimArgs),
    Help,
}

/// Rejected command line, with the dump target parsed so far.
#[derive(Debug)]
struct ArgsError {
    message: String,
    out_dir: PathBuf,
    format: DumpFormat,
}

#[allow(clippy::while_let_on_iterator)]
fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, ArgsError> {
    let mut images: Vec<PathBuf> = Vec::new();
    let mut out_dir = PathBuf::from(".");
    let mut format = DumpFormat::default();
    let mut config = CoreConfig::default();
    let mut problem: Option<String> = None;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Ok(ParseResult::Help);
        }

        if arg == "-o" || arg == "--out-dir" {
            match args.next() {
                Some(value) => out_dir = PathBuf::from(value),
                None => problem = problem.or_else(|| Some("missing value for -o".to_string())),
            }
            continue;
        }

        if arg == "--format" {
            let parsed = args
                .next()
                .ok_or_else(|| "missing value for --format".to_string())
                .and_then(|value| value.to_string_lossy().parse::<DumpFormat>());
            match parsed {
                Ok(value) => format = value,
                Err(message) => problem = problem.or(Some(message)),
            }
            continue;
        }

        if arg == "--max-steps" {
            let parsed = args
                .next()
                .ok_or_else(|| "missing value for --max-steps".to_string())
                .and_then(|value| {
                    let text = value.to_string_lossy();
                    text.parse::<u64>()
                        .map_err(|_| format!("invalid step count: {text}"))
                });
            match parsed {
                Ok(limit) => config.step_limit = Some(limit),
                Err(message) => problem = problem.or(Some(message)),
            }
            continue;
        }

        if arg == "--hardwire-zero" {
            config.zero_register = ZeroRegisterPolicy::Hardwired;
            continue;
        }

        if arg == "--trace" {
            config.tracing_enabled = true;
            continue;
        }

        let text = arg.to_string_lossy();
        if text.starts_with('-') && text.len() > 1 {
            problem = problem.or_else(|| Some(format!("unknown option: {text}")));
            continue;
        }

        images.push(PathBuf::from(arg));
    }

    if problem.is_none() && images.len() != 1 {
        problem = Some(if images.is_empty() {
            "missing image path".to_string()
        } else {
            "expected exactly one image path".to_string()
        });
    }

    match (problem, images.pop()) {
        (None, Some(image)) => Ok(ParseResult::Run(SimArgs {
            image,
            out_dir,
            format,
            config,
        })),
        (problem, _) => Err(ArgsError {
            message: problem.unwrap_or_else(|| "missing image path".to_string()),
            out_dir,
            format,
        }),
    }
}

fn run(args: &SimArgs) -> u8 {
    match run_session(args) {
        Ok(SessionOutcome::Fault(fault)) => {
            eprintln!("error: {fault}");
            SessionOutcome::Fault(fault).exit_status()
        }
        Ok(outcome @ SessionOutcome::StepLimit { steps }) => {
            eprintln!("warning: step limit reached after {steps} instructions");
            outcome.exit_status()
        }
        Ok(outcome) => outcome.exit_status(),
        Err(error) => {
            eprintln!("error: {error}");
            error.exit_status()
        }
    }
}

fn main() -> ExitCode {
    let status = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Run(args)) => {
            init_logging(args.config.tracing_enabled);
            run(&args)
        }
        Err(error) => {
            init_logging(false);
            eprintln!("error: {}", error.message);
            eprintln!("{USAGE_TEXT}");
            if let Err(dump_error) = dump_zeroed_state(&error.out_dir, error.format) {
                eprintln!("error: {dump_error}");
            }
            EXIT_STARTUP_FAILURE
        }
    };

    ExitCode::from(status)
}
