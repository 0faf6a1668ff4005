//! Program images as produced by LC-3 assemblers.
//!
//! The first big-endian `u16` of an image is the origin the program is loaded at, every
//! following big-endian `u16` is one instruction.
use crate::errors::LoadProgramError;
use std::fs;
use std::path::Path;

/// A parsed program image: where to load it and its instructions as a string of binary digits,
/// most significant bit first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramImage {
    pub origin: u16,
    pub bits: String,
}

impl ProgramImage {
    /// Number of 16 bit instructions in the image.
    #[must_use]
    pub fn instruction_count(&self) -> usize {
        self.bits.len() / 16
    }
}

/// Reads and parses the image at `path`.
///
/// # Errors
/// - file cannot be read
/// - see [`parse_image`]
pub fn read_image(path: impl AsRef<Path>) -> Result<ProgramImage, LoadProgramError> {
    let bytes = fs::read(path.as_ref())?;
    log::debug!("Read {} bytes from {}", bytes.len(), path.as_ref().display());
    parse_image(&bytes)
}

/// Parses an image held in memory.
///
/// # Errors
/// - image is shorter than the two byte origin
/// - image has an odd number of bytes
pub fn parse_image(bytes: &[u8]) -> Result<ProgramImage, LoadProgramError> {
    if bytes.len() < 2 {
        return Err(LoadProgramError::ImageMissingOrigin {
            length: bytes.len(),
        });
    }
    if bytes.len() % 2 != 0 {
        return Err(LoadProgramError::ImageOddLength {
            length: bytes.len(),
        });
    }
    let mut words = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
    let origin = words.next().unwrap_or_default();
    Ok(ProgramImage {
        origin,
        bits: words_to_bits(words),
    })
}

/// Renders instructions as binary digits, 16 per instruction.
pub fn words_to_bits(words: impl IntoIterator<Item = u16>) -> String {
    words.into_iter().map(|word| format!("{word:016b}")).collect()
}
