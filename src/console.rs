//! Console the trap routines talk to.
use crossterm::{QueueableCommand, style::Print};
use std::io;
use std::io::{BufRead, StdinLock, Stdout, Write};

/// Character I/O of the emulated machine.
///
/// Opcode semantics do not depend on the implementation, tests swap in in-memory streams.
pub trait Console {
    /// Blocks until a full line is available and returns its raw bytes without the line
    /// terminator. Input does not need to be UTF-8.
    /// Returns an empty line once input is exhausted.
    ///
    /// # Errors
    /// - reading from the underlying input failed
    fn read_line(&mut self) -> io::Result<Vec<u8>>;
    /// Writes `text` and makes it visible.
    ///
    /// # Errors
    /// - writing to the underlying output failed
    fn write_text(&mut self, text: &str) -> io::Result<()>;
}

/// [`Console`] over a pair of streams.
#[derive(Debug)]
pub struct StreamConsole<R, W> {
    input: R,
    output: W,
}

/// The console of the process: stdin and stdout.
pub type TerminalConsole = StreamConsole<StdinLock<'static>, Stdout>;

impl<R: BufRead, W: Write> StreamConsole<R, W> {
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
    pub const fn output(&self) -> &W {
        &self.output
    }
    pub fn into_parts(self) -> (R, W) {
        (self.input, self.output)
    }
}

impl TerminalConsole {
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console for StreamConsole<R, W> {
    fn read_line(&mut self) -> io::Result<Vec<u8>> {
        let mut line = Vec::new();
        self.input.read_until(b'\n', &mut line)?;
        while matches!(line.last(), Some(b'\n' | b'\r')) {
            line.pop();
        }
        Ok(line)
    }
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        self.output.queue(Print(text))?;
        self.output.flush()
    }
}
