#![forbid(unsafe_code)]

//! Output target writing each published block to a byte stream.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::io::{self, Write};

use vireo_core::OutputTarget;

/// Writes every replacement to `W`, followed by a blank line.
///
/// The terminal has no notion of replacing content in place, so each
/// publish appends a fresh block. Write errors are logged and dropped.
pub struct TerminalTarget<W: Write> {
    out: RefCell<W>,
    blocks: Cell<u64>,
}

impl<W: Write> fmt::Debug for TerminalTarget<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalTarget")
            .field("blocks", &self.blocks.get())
            .finish()
    }
}

impl TerminalTarget<io::Stdout> {
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalTarget<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
            blocks: Cell::new(0),
        }
    }

    /// Blocks written successfully.
    #[must_use]
    pub fn blocks(&self) -> u64 {
        self.blocks.get()
    }

    /// Give back the underlying writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn write_block(&self, content: &str) -> io::Result<()> {
        let mut out = self.out.borrow_mut();
        writeln!(out, "{content}")?;
        writeln!(out)?;
        out.flush()
    }
}

impl<W: Write> OutputTarget for TerminalTarget<W> {
    fn replace_content(&self, content: &str) {
        match self.write_block(content) {
            Ok(()) => self.blocks.set(self.blocks.get() + 1),
            Err(error) => tracing::warn!(%error, "terminal write failed"),
        }
    }
}
