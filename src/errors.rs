use std::io;
use thiserror::Error;

/// Errors raised by the bit-packed memory engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error(
        "Invalid memory configuration: {cell_count} cells with instruction width {instruction_width}, \
         cell count must be positive and allocatable, instruction width within [2, 64]"
    )]
    InvalidConfiguration {
        cell_count: usize,
        instruction_width: u32,
    },
    #[error("Invalid address: {address}, memory range: [0, {max_address}]")]
    AddressOutOfRange { address: i64, max_address: u64 },
}

/// Errors raised while turning a program image or bit string into memory contents.
#[derive(Error, Debug)]
pub enum LoadProgramError {
    #[error(
        "Program has {length} bits which is not a multiple of the instruction width {instruction_width}"
    )]
    ProgramLengthNotAligned { length: usize, instruction_width: u32 },
    #[error("Program contains non-binary character {found:?} at position {position}")]
    InvalidProgramDigit { position: usize, found: char },
    #[error("Program image is missing its origin, got {length} bytes")]
    ImageMissingOrigin { length: usize },
    #[error("Program image has odd length {length}, instructions are two bytes each")]
    ImageOddLength { length: usize },
    #[error("Error reading program image: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// Errors ending the fetch/decode/execute loop.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Unknown opcode {opcode:#06b}")]
    UnknownOpcode { opcode: u8 },
    #[error("Unknown trap code {trap_code:#04x}")]
    UnknownTrapCode { trap_code: u8 },
    #[error("Unknown register {index}")]
    UnknownRegister { index: u8 },
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error("Error during reading console input or writing program output: {0}")]
    IOInputOutputError(String),
}

impl From<io::Error> for ExecutionError {
    fn from(error: io::Error) -> Self {
        Self::IOInputOutputError(error.to_string())
    }
}
