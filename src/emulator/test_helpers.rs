use crate::console::StreamConsole;
use crate::emulator::{Emulator, MachineConfig, loader};
use crate::hardware::INSTRUCTION_WIDTH;
use crate::hardware::memory::Memory;

pub type FakeConsole = StreamConsole<&'static [u8], Vec<u8>>;
pub type FakeEmulator = Emulator<FakeConsole>;

pub fn fake_console(stdin_data: &'static [u8]) -> FakeConsole {
    StreamConsole::new(stdin_data, Vec::with_capacity(120))
}

pub fn output_of(console: &FakeConsole) -> String {
    String::from_utf8(console.output().clone()).unwrap()
}

/// Reference sized memory with `words` stored one after the other from bit `origin`.
pub fn create_memory(origin: u64, words: &[u16]) -> Memory {
    let mut memory = Memory::new(MachineConfig::default().cell_count, INSTRUCTION_WIDTH).unwrap();
    for (address, word) in (origin..).step_by(16).zip(words) {
        memory.write(address, u64::from(*word)).unwrap();
    }
    memory
}

/// Emulator with `program` written to the start address.
pub fn fake_emulator(program: &[u16], stdin_data: &'static [u8]) -> FakeEmulator {
    let mut emu = Emulator::with_console(fake_console(stdin_data));
    emu.write_program(
        u64::from(super::PROGRAM_SECTION_START),
        &loader::words_to_bits(program.iter().copied()),
    )
    .unwrap();
    emu
}
