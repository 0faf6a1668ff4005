use clap::Parser;
use crossterm::style::Stylize;
use crossterm::tty::IsTty;
use lc3_bitvm::console::TerminalConsole;
use lc3_bitvm::emulator::{Emulator, MachineConfig, loader};
use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "lc3-bitvm",
    version,
    about = "Run an LC-3 program image on bit-packed memory"
)]
struct Args {
    /// Program image: big-endian origin word followed by big-endian instructions.
    program: PathBuf,

    /// Number of 64 bit memory cells.
    #[arg(long)]
    cells: Option<usize>,
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let config = args
        .cells
        .map_or_else(MachineConfig::default, |cell_count| MachineConfig { cell_count });
    let image = loader::read_image(&args.program)?;
    log::debug!(
        "Loaded {} instructions from {}",
        image.instruction_count(),
        args.program.display()
    );
    let mut emu = Emulator::with_config(config, TerminalConsole::stdio())?;
    emu.load_program_image(&image)?;
    emu.run()?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = format!("error: {e}");
            if io::stderr().is_tty() {
                eprintln!("{}", message.red());
            } else {
                eprintln!("{message}");
            }
            ExitCode::FAILURE
        }
    }
}
