use crate::console::Console;
use crate::emulator::instruction::Instruction;
use crate::emulator::opcodes::read_word;
use crate::errors::ExecutionError;
use crate::hardware::INSTRUCTION_WIDTH;
use crate::hardware::memory::Memory;
use crate::hardware::registers::{RegisterId, Registers, from_binary};
use std::ops::ControlFlow;

/// Service routines reachable through the TRAP opcode, keyed by trap vector.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, enumn::N, displaydoc::Display)]
pub enum TrapCode {
    /// GETC
    GetC = 0x20,
    /// OUT
    Out = 0x21,
    /// PUTS
    PutS = 0x22,
    /// IN
    In = 0x23,
    /// PUTSP
    PutSp = 0x24,
    /// HALT
    Halt = 0x25,
}

impl TryFrom<Instruction> for TrapCode {
    type Error = ExecutionError;

    fn try_from(i: Instruction) -> Result<Self, Self::Error> {
        let trap_code = i.trap_vector();
        Self::n(trap_code).ok_or(ExecutionError::UnknownTrapCode { trap_code })
    }
}

/// TRAP: Runs the service routine selected by the trap vector.
/// ```text
///  15__12__11__8___7_______0_
/// | 1111 | 0000 | trapvect8 |
///  -------------------------
/// ```
/// Breaks when the program halted.
pub fn trap(
    i: Instruction,
    regs: &mut Registers,
    mem: &Memory,
    console: &mut impl Console,
) -> Result<ControlFlow<()>, ExecutionError> {
    let trap_code = TrapCode::try_from(i)?;
    log::trace!("TRAP {trap_code}");
    match trap_code {
        TrapCode::GetC => get_c(regs, console)?,
        TrapCode::Out => out(regs, console)?,
        TrapCode::PutS => put_s(regs, mem, console)?,
        TrapCode::In => in_trap(regs, console)?,
        TrapCode::PutSp => put_sp(regs, mem, console)?,
        TrapCode::Halt => return Ok(halt()),
    }
    Ok(ControlFlow::Continue(()))
}

fn read_character_from_console(
    regs: &mut Registers,
    console: &mut impl Console,
) -> Result<(), ExecutionError> {
    let line = console.read_line()?;
    let c = line.first().copied().unwrap_or(0);
    regs.set(RegisterId::R0, from_binary(u16::from(c)));
    Ok(())
}

/// GETC: Read a line from the console and put its first character into R0.
///
/// R0 is 0 if the line was empty. The high eight bits of R0 are cleared.
pub fn get_c(regs: &mut Registers, console: &mut impl Console) -> Result<(), ExecutionError> {
    read_character_from_console(regs, console)
}

/// IN: Print a prompt on the screen, then like 0x20 GETC.
pub fn in_trap(regs: &mut Registers, console: &mut impl Console) -> Result<(), ExecutionError> {
    console.write_text("Input: ")?;
    read_character_from_console(regs, console)
}

/// OUT: Write a character in R0[7:0] to the console display.
pub fn out(regs: &Registers, console: &mut impl Console) -> Result<(), ExecutionError> {
    let [_, low] = regs.get(RegisterId::R0).as_binary().to_be_bytes();
    console.write_text(&String::from(char::from(low)))?;
    Ok(())
}

fn put_one_char_per_u16(input: u16, append_to: &mut String) {
    let [_, low] = input.to_be_bytes();
    append_to.push(char::from(low));
}

fn put_two_chars_per_u16(input: u16, append_to: &mut String) {
    let [high, low] = input.to_be_bytes();
    append_to.push(char::from(high));
    if low != 0 {
        append_to.push(char::from(low));
    }
}

fn put(
    regs: &Registers,
    mem: &Memory,
    console: &mut impl Console,
    handle_char: fn(u16, &mut String),
) -> Result<(), ExecutionError> {
    let mut address = i64::from(regs.get(RegisterId::R0).as_decimal());
    let mut s = String::with_capacity(120);
    loop {
        let word = read_word(mem, mem.checked_address(address)?)?;
        if word == 0 {
            break;
        }
        handle_char(word, &mut s);
        address += i64::from(INSTRUCTION_WIDTH);
    }
    console.write_text(&s)?;
    Ok(())
}

/// PUTS: print the zero terminated string starting at the address in R0, one character per word.
pub fn put_s(
    regs: &Registers,
    mem: &Memory,
    console: &mut impl Console,
) -> Result<(), ExecutionError> {
    put(regs, mem, console, put_one_char_per_u16)
}

/// PUTSP: Packed version of PUTS
///
/// Every word holds two characters, the one in bits [15:8] is written first.
/// The second character of the last word can be 0x00.
/// Writing terminates with a 0x0000 word.
pub fn put_sp(
    regs: &Registers,
    mem: &Memory,
    console: &mut impl Console,
) -> Result<(), ExecutionError> {
    put(regs, mem, console, put_two_chars_per_u16)
}

/// HALT: End program.
pub fn halt() -> ControlFlow<()> {
    log::info!("Program halted");
    ControlFlow::Break(())
}
