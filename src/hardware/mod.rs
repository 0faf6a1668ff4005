//! Storage of the machine: the bit-packed memory engine and the register file.

pub mod bits;
pub mod memory;
pub mod registers;

pub use memory::Memory;
pub use registers::{ConditionFlag, Register, RegisterId, Registers};

/// Width of one LC-3 instruction and of every register, in bits.
pub const INSTRUCTION_WIDTH: u32 = u16::BITS;
