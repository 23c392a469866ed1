//! Flat binary program images.
//!
//! An image is a sequence of big-endian 32-bit instruction words placed at
//! consecutive addresses starting at 0.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::memory::{pack_be, AccessWidth, MemoryStore};
use crate::state::INSTRUCTION_BYTES;

/// Failure to read or place a program image.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The image file could not be read.
    #[error("failed to read image {}: {source}", path.display())]
    Io {
        /// Path that was opened.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The image is not a whole number of instruction words.
    #[error("image length {len} is not a multiple of 4 bytes")]
    MisalignedLength {
        /// Image length in bytes.
        len: usize,
    },
}

/// Reads an image file into memory.
///
/// # Errors
///
/// Returns [`ImageError::Io`] when the file cannot be read.
pub fn read_image(path: &Path) -> Result<Vec<u8>, ImageError> {
    fs::read(path).map_err(|source| ImageError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Stores `bytes` as instruction words from address 0 and returns the word count.
///
/// Nothing is written when the length is rejected.
///
/// # Errors
///
/// Returns [`ImageError::MisalignedLength`] when the length is not a multiple of 4.
pub fn load_image(bytes: &[u8], memory: &mut dyn MemoryStore) -> Result<usize, ImageError> {
    let word_bytes = AccessWidth::Word.bytes() as usize;
    if bytes.len() % word_bytes != 0 {
        return Err(ImageError::MisalignedLength { len: bytes.len() });
    }

    let mut addr = 0u32;
    for chunk in bytes.chunks_exact(word_bytes) {
        memory.set(addr, pack_be(chunk), AccessWidth::Word);
        addr = addr.wrapping_add(INSTRUCTION_BYTES);
    }

    let words = bytes.len() / word_bytes;
    tracing::debug!(words, "loaded program image");
    Ok(words)
}
