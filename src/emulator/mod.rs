pub mod instruction;
pub mod loader;
pub mod opcodes;
pub mod trap_routines;

#[cfg(test)]
pub(crate) mod test_helpers;

use crate::console::{Console, TerminalConsole};
use crate::emulator::instruction::{Instruction, Opcode};
use crate::emulator::loader::ProgramImage;
use crate::emulator::opcodes::read_word;
use crate::errors::{ExecutionError, LoadProgramError, MemoryError};
use crate::hardware::INSTRUCTION_WIDTH;
use crate::hardware::memory::Memory;
use crate::hardware::registers::Registers;
use std::fmt;
use std::ops::ControlFlow;
use std::path::Path;

/// Bit address execution starts at.
pub const PROGRAM_SECTION_START: u16 = 0x3000;

#[expect(clippy::cast_possible_truncation)]
const PC_INCREMENT: u16 = INSTRUCTION_WIDTH as u16;

/// Sizing of the emulated machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineConfig {
    /// Number of 64 bit memory cells.
    pub cell_count: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            cell_count: 1 << 14,
        }
    }
}

/// The public facing emulator used to run LC-3 programs.
pub struct Emulator<C: Console = TerminalConsole> {
    registers: Registers,
    memory: Memory,
    console: C,
    running: bool,
}

impl<C: Console> fmt::Debug for Emulator<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emulator")
            .field("registers", &self.registers)
            .field("memory", &self.memory)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Emulator {
    /// Emulator with the default memory size talking to stdin and stdout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_console(TerminalConsole::stdio())
    }
}

impl<C: Console> Emulator<C> {
    /// Emulator with the default memory size talking to `console`.
    ///
    /// # Panics
    /// Never, the default configuration is valid.
    pub fn with_console(console: C) -> Self {
        Self::with_config(MachineConfig::default(), console)
            .expect("default machine configuration is valid")
    }

    /// # Errors
    /// - `config.cell_count` is zero or cannot be allocated
    pub fn with_config(config: MachineConfig, console: C) -> Result<Self, MemoryError> {
        Ok(Self {
            registers: Registers::new(),
            memory: Memory::new(config.cell_count, INSTRUCTION_WIDTH)?,
            console,
            running: false,
        })
    }

    /// Writes a program given as binary digits to consecutive instruction slots starting at
    /// bit `origin`. Nothing is written unless the whole program is well formed.
    ///
    /// # Errors
    /// - length is not a multiple of the instruction width
    /// - a character other than `0` and `1`
    /// - program does not fit into memory
    pub fn write_program(&mut self, origin: u64, bits: &str) -> Result<(), LoadProgramError> {
        let instruction_width = self.memory.instruction_width();
        let width = instruction_width as usize;
        if bits.len() % width != 0 {
            return Err(LoadProgramError::ProgramLengthNotAligned {
                length: bits.len(),
                instruction_width,
            });
        }
        if let Some((position, found)) = bits.char_indices().find(|(_, c)| !matches!(c, '0' | '1'))
        {
            return Err(LoadProgramError::InvalidProgramDigit { position, found });
        }
        let instruction_count = bits.len() / width;
        if instruction_count > 0 {
            let last = (instruction_count as u64 - 1)
                .checked_mul(u64::from(instruction_width))
                .and_then(|offset| origin.checked_add(offset))
                .unwrap_or(u64::MAX);
            self.memory
                .checked_address(i64::try_from(last).unwrap_or(i64::MAX))?;
        }
        log::debug!("Writing {instruction_count} instructions at {origin:#06x}");

        let mut address = origin;
        for chunk in bits.as_bytes().chunks(width) {
            let value = chunk
                .iter()
                .fold(0_u64, |acc, digit| (acc << 1) | u64::from(digit - b'0'));
            self.memory.write(address, value)?;
            address += u64::from(instruction_width);
        }
        Ok(())
    }

    /// Writes a program image to the origin stored in its first word.
    ///
    /// # Errors
    /// - see [`loader::parse_image`] and [`Self::write_program`]
    pub fn load_image(&mut self, image: &[u8]) -> Result<(), LoadProgramError> {
        self.load_program_image(&loader::parse_image(image)?)
    }

    /// Writes an already parsed program image to its origin.
    ///
    /// # Errors
    /// - see [`Self::write_program`]
    pub fn load_program_image(&mut self, image: &ProgramImage) -> Result<(), LoadProgramError> {
        if image.origin != PROGRAM_SECTION_START {
            log::warn!(
                "Program origin {:#06x} differs from start address {PROGRAM_SECTION_START:#06x}",
                image.origin
            );
        }
        self.write_program(u64::from(image.origin), &image.bits)
    }

    /// Executes the program starting at [`PROGRAM_SECTION_START`] until HALT.
    ///
    /// # Errors
    /// - see [`Self::step`]
    pub fn run(&mut self) -> Result<(), ExecutionError> {
        self.registers.set_pc(PROGRAM_SECTION_START);
        self.running = true;
        while self.running {
            if let Err(e) = self.step() {
                self.running = false;
                return Err(e);
            }
        }
        Ok(())
    }

    /// Fetches, decodes and executes one instruction at the current PC.
    ///
    /// Breaks after HALT.
    ///
    /// # Errors
    /// - PC or an effective address outside of memory
    /// - unknown trap code
    /// - console I/O failed
    pub fn step(&mut self) -> Result<ControlFlow<()>, ExecutionError> {
        let pc = self.registers.pc();
        let address = self.memory.checked_address(i64::from(pc.as_decimal()))?;
        let i = Instruction::from(read_word(&self.memory, address)?);
        self.registers.set_pc(pc.as_binary().wrapping_add(PC_INCREMENT));
        let opcode = i.opcode()?;
        log::trace!("{:#06x}: {i:?}", pc.as_binary());

        let regs = &mut self.registers;
        let memory = &mut self.memory;
        match opcode {
            Opcode::Br => opcodes::br(i, regs),
            Opcode::Add => opcodes::add(i, regs)?,
            Opcode::Ld => opcodes::ld(i, regs, memory)?,
            Opcode::St => opcodes::st(i, regs, memory)?,
            Opcode::Jsr => opcodes::jsr(i, regs)?,
            Opcode::And => opcodes::and(i, regs)?,
            Opcode::Ldr => opcodes::ldr(i, regs, memory)?,
            Opcode::Str => opcodes::str(i, regs, memory)?,
            Opcode::Rti => opcodes::rti(i),
            Opcode::Not => opcodes::not(i, regs)?,
            Opcode::Ldi => opcodes::ldi(i, regs, memory)?,
            Opcode::Sti => opcodes::sti(i, regs, memory)?,
            Opcode::Jmp => opcodes::jmp_or_ret(i, regs)?,
            Opcode::Res => opcodes::res(i),
            Opcode::Lea => opcodes::lea(i, regs)?,
            Opcode::Trap => {
                let flow = trap_routines::trap(i, regs, memory, &mut self.console)?;
                if flow.is_break() {
                    self.running = false;
                }
                return Ok(flow);
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    pub const fn is_running(&self) -> bool {
        self.running
    }
    pub const fn registers(&self) -> &Registers {
        &self.registers
    }
    pub const fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }
    pub const fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }
    pub const fn console(&self) -> &C {
        &self.console
    }
    pub const fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }
    /// Zeroes all registers, the condition register included. Memory stays untouched.
    pub const fn reset_registers(&mut self) {
        self.registers = Registers::new();
    }
}

/// Emulator on stdin and stdout with the image at `path` loaded.
///
/// # Errors
/// - see [`loader::read_image`] and [`Emulator::load_image`]
pub fn from_program(path: impl AsRef<Path>) -> Result<Emulator, LoadProgramError> {
    let image = loader::read_image(path)?;
    let mut emu = Emulator::new();
    emu.load_program_image(&image)?;
    Ok(emu)
}

/// Emulator on stdin and stdout with `image` loaded.
///
/// # Errors
/// - see [`Emulator::load_image`]
pub fn from_program_bytes(image: &[u8]) -> Result<Emulator, LoadProgramError> {
    let mut emu = Emulator::new();
    emu.load_image(image)?;
    Ok(emu)
}
