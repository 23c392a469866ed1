//! Integration tests for the mips-sim CLI.

use mips_core as _;
use mips_sim as _;
use serde as _;
use thiserror as _;
use tracing as _;
use tracing_subscriber as _;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const HALT: u32 = 0xFEED_FEED;

fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_mips-sim"))
}

fn write_image(dir: &Path, name: &str, words: &[u32]) -> PathBuf {
    let path = dir.join(name);
    let bytes: Vec<u8> = words.iter().flat_map(|word| word.to_be_bytes()).collect();
    fs::write(&path, bytes).unwrap();
    path
}

fn run_sim(dir: &Path, args: &[&str]) -> Output {
    Command::new(binary_path())
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run mips-sim")
}

fn read_dump(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(name)).unwrap()
}

#[test]
fn halting_program_exits_zero_and_dumps_state() {
    let temp_dir = tempfile::tempdir().unwrap();
    let image = write_image(
        temp_dir.path(),
        "branch.bin",
        &[0x1021_0000, 0x2006_0001, HALT],
    );

    let output = run_sim(temp_dir.path(), &[image.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(0));
    let registers = read_dump(temp_dir.path(), "reg_state.out");
    assert_eq!(registers.lines().count(), 31);
    assert!(registers.contains("$a2: 0x00000001\n"));
    assert_eq!(
        read_dump(temp_dir.path(), "mem_state.out"),
        "0x00000000: 0x10210000\n0x00000004: 0x20060001\n0x00000008: 0xfeedfeed\n"
    );
}

#[test]
fn store_is_visible_in_memory_dump() {
    let temp_dir = tempfile::tempdir().unwrap();
    // lui $t0, 0x1234 ; ori $t0, $t0, 0x5678 ; sw $t0, 0x100($zero) ; halt
    let image = write_image(
        temp_dir.path(),
        "store.bin",
        &[0x3C08_1234, 0x3508_5678, 0xAC08_0100, HALT],
    );
    let out_dir = temp_dir.path().join("dumps");

    let output = run_sim(
        temp_dir.path(),
        &[image.to_str().unwrap(), "-o", out_dir.to_str().unwrap()],
    );

    assert_eq!(output.status.code(), Some(0));
    assert!(read_dump(&out_dir, "reg_state.out").contains("$t0: 0x12345678\n"));
    assert!(read_dump(&out_dir, "mem_state.out").ends_with("0x00000100: 0x12345678\n"));
}

#[test]
fn illegal_instruction_exits_127_without_dump() {
    let temp_dir = tempfile::tempdir().unwrap();
    let image = write_image(temp_dir.path(), "illegal.bin", &[0xFFFF_FFFF]);

    let output = run_sim(temp_dir.path(), &[image.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(127));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("illegal instruction"));
    assert!(!temp_dir.path().join("reg_state.out").exists());
    assert!(!temp_dir.path().join("mem_state.out").exists());
}

#[test]
fn misaligned_image_dumps_zeroed_state_and_exits_one() {
    let temp_dir = tempfile::tempdir().unwrap();
    let image = temp_dir.path().join("short.bin");
    fs::write(&image, [0x20, 0x22, 0x00, 0x05, 0xFE]).unwrap();

    let output = run_sim(temp_dir.path(), &[image.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    let registers = read_dump(temp_dir.path(), "reg_state.out");
    assert!(registers.lines().all(|line| line.ends_with(": 0x00000000")));
    assert!(read_dump(temp_dir.path(), "mem_state.out").is_empty());
}

#[test]
fn missing_image_file_exits_one() {
    let temp_dir = tempfile::tempdir().unwrap();

    let output = run_sim(temp_dir.path(), &["does-not-exist.bin"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("does-not-exist.bin"));
    assert!(temp_dir.path().join("reg_state.out").exists());
}

#[test]
fn wrong_argument_count_dumps_zeroed_state() {
    let temp_dir = tempfile::tempdir().unwrap();

    let output = run_sim(temp_dir.path(), &[]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage:"));
    assert!(read_dump(temp_dir.path(), "reg_state.out").starts_with("$at: 0x00000000\n"));
    assert!(read_dump(temp_dir.path(), "mem_state.out").is_empty());
}

#[test]
fn json_format_writes_structured_dumps() {
    let temp_dir = tempfile::tempdir().unwrap();
    let image = write_image(temp_dir.path(), "addi.bin", &[0x2022_0005, HALT]);

    let output = run_sim(
        temp_dir.path(),
        &["--format", "json", image.to_str().unwrap()],
    );

    assert_eq!(output.status.code(), Some(0));
    let registers: serde_json::Value =
        serde_json::from_str(&read_dump(temp_dir.path(), "reg_state.out")).unwrap();
    assert_eq!(registers["v"][0], 5);
    let memory: serde_json::Value =
        serde_json::from_str(&read_dump(temp_dir.path(), "mem_state.out")).unwrap();
    assert_eq!(memory.as_array().map(Vec::len), Some(2));
    assert_eq!(memory[1]["value"], u64::from(HALT));
}

#[test]
fn step_limit_exits_two_with_dump() {
    let temp_dir = tempfile::tempdir().unwrap();
    // j 0 ; nop
    let image = write_image(temp_dir.path(), "spin.bin", &[0x0800_0000, 0]);

    let output = run_sim(
        temp_dir.path(),
        &["--max-steps", "50", image.to_str().unwrap()],
    );

    assert_eq!(output.status.code(), Some(2));
    assert!(temp_dir.path().join("reg_state.out").exists());
}

#[test]
fn hardwire_zero_keeps_zero_register_clear() {
    let temp_dir = tempfile::tempdir().unwrap();
    // addi $zero, $zero, 7 ; add $v0, $zero, $zero ; halt
    let image = write_image(
        temp_dir.path(),
        "zero.bin",
        &[0x2000_0007, 0x0000_1020, HALT],
    );

    let writable = run_sim(temp_dir.path(), &[image.to_str().unwrap()]);
    assert_eq!(writable.status.code(), Some(0));
    assert!(read_dump(temp_dir.path(), "reg_state.out").contains("$v0: 0x0000000e\n"));

    let hardwired = run_sim(temp_dir.path(), &["--hardwire-zero", image.to_str().unwrap()]);
    assert_eq!(hardwired.status.code(), Some(0));
    assert!(read_dump(temp_dir.path(), "reg_state.out").contains("$v0: 0x00000000\n"));
}

#[test]
fn help_exits_zero() {
    let temp_dir = tempfile::tempdir().unwrap();

    let output = run_sim(temp_dir.path(), &["--help"]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Usage: mips-sim"));
    assert!(!temp_dir.path().join("reg_state.out").exists());
}
