//! # LC-3 on bit-packed memory.
//!
//! `lc3-bitvm` emulates the LC-3 instruction set on top of a memory made of 64 bit cells
//! which stores values of a fixed instruction width at arbitrary bit addresses.
//! Usage starts with writing a program via [`emulator::Emulator::write_program`] or
//! [`emulator::Emulator::load_image`], followed by [`emulator::Emulator::run`].
//!
//!  # Example
//! ```
//! use lc3_bitvm::console::StreamConsole;
//! use lc3_bitvm::emulator::Emulator;
//! let console = StreamConsole::new(&b""[..], Vec::new());
//! let mut emu = Emulator::with_console(console);
//! // AND R0, R0, #0 ; ADD R0, R0, #7 ; HALT
//! emu.load_image(&[0x30, 0x00, 0x50, 0x20, 0x10, 0x27, 0xF0, 0x25])
//!     .unwrap();
//! emu.run().unwrap();
//! assert_eq!(emu.registers().get(lc3_bitvm::hardware::RegisterId::R0).as_decimal(), 7);
//! ```
//! # Errors
//! - Program image is malformed or does not fit into memory
//! - Program leaves memory, executes an unknown trap or console I/O fails

pub mod console;
pub mod emulator;
pub mod errors;
pub mod hardware;
pub(crate) mod numbers;
