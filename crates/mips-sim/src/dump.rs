//! File-backed final-state dump.
//!
//! Registers go to `reg_state.out` and memory to `mem_state.out` inside the
//! output directory, either as plain text or as JSON.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use mips_core::{AccessWidth, MemoryStore, RegisterInfo, StateDump};
use serde::Serialize;
use thiserror::Error;

/// File receiving the register dump.
pub const REGISTER_DUMP_FILE: &str = "reg_state.out";
/// File receiving the memory dump.
pub const MEMORY_DUMP_FILE: &str = "mem_state.out";

/// Output encoding of the dump files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DumpFormat {
    /// `$name: 0x%08x` and `0x%08x: 0x%08x` lines.
    #[default]
    Text,
    /// Pretty-printed JSON documents.
    Json,
}

impl FromStr for DumpFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown dump format: {other}")),
        }
    }
}

/// Failure to write a dump file.
#[derive(Debug, Error)]
pub enum DumpError {
    /// The output directory or file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Io {
        /// Path being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The state could not be encoded as JSON.
    #[error("failed to encode {} as JSON: {source}", path.display())]
    Json {
        /// Path being written.
        path: PathBuf,
        /// Underlying serialisation error.
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Serialize)]
struct MemoryWord {
    address: u32,
    value: u32,
}

fn memory_words(memory: &dyn MemoryStore) -> Vec<MemoryWord> {
    memory
        .populated_words()
        .into_iter()
        .map(|address| MemoryWord {
            address,
            value: memory.get(address, AccessWidth::Word),
        })
        .collect()
}

/// Renders the register file, one `$name: 0x%08x` line per register.
#[must_use]
pub fn format_registers_text(registers: &RegisterInfo) -> String {
    let mut out = String::new();
    for (reg, value) in registers.named_values() {
        let _ = writeln!(out, "{}: {value:#010x}", reg.name());
    }
    out
}

/// Renders populated memory words in ascending address order.
#[must_use]
pub fn format_memory_text(memory: &dyn MemoryStore) -> String {
    let mut out = String::new();
    for word in memory_words(memory) {
        let _ = writeln!(out, "{:#010x}: {:#010x}", word.address, word.value);
    }
    out
}

/// [`StateDump`] writing the two dump files into a directory.
#[derive(Debug, Clone)]
pub struct FileStateDump {
    out_dir: PathBuf,
    format: DumpFormat,
}

impl FileStateDump {
    /// Creates a dumper writing into `out_dir`, which is created on first write.
    #[must_use]
    pub fn new(out_dir: &Path, format: DumpFormat) -> Self {
        Self {
            out_dir: out_dir.to_path_buf(),
            format,
        }
    }

    /// Path of the register dump file.
    #[must_use]
    pub fn register_path(&self) -> PathBuf {
        self.out_dir.join(REGISTER_DUMP_FILE)
    }

    /// Path of the memory dump file.
    #[must_use]
    pub fn memory_path(&self) -> PathBuf {
        self.out_dir.join(MEMORY_DUMP_FILE)
    }

    fn encode<T: Serialize + ?Sized>(
        &self,
        path: &Path,
        text: impl FnOnce() -> String,
        value: &T,
    ) -> Result<String, DumpError> {
        match self.format {
            DumpFormat::Text => Ok(text()),
            DumpFormat::Json => serde_json::to_string_pretty(value)
                .map(|mut json| {
                    json.push('\n');
                    json
                })
                .map_err(|source| DumpError::Json {
                    path: path.to_path_buf(),
                    source,
                }),
        }
    }

    fn write(path: &Path, contents: &str) -> Result<(), DumpError> {
        let io_error = |source| DumpError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(path, contents).map_err(io_error)?;
        tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote dump file");
        Ok(())
    }
}

impl StateDump for FileStateDump {
    type Error = DumpError;

    fn dump_register_state(&mut self, registers: &RegisterInfo) -> Result<(), DumpError> {
        let path = self.register_path();
        let contents = self.encode(&path, || format_registers_text(registers), registers)?;
        Self::write(&path, &contents)
    }

    fn dump_memory_state(&mut self, memory: &dyn MemoryStore) -> Result<(), DumpError> {
        let path = self.memory_path();
        let words = memory_words(memory);
        let contents = self.encode(&path, || format_memory_text(memory), &words)?;
        Self::write(&path, &contents)
    }
}
