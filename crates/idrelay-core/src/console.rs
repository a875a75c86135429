//! Diagnostic text channel
//!
//! The serial line the operator types identifiers into. It also carries the
//! human-readable status lines (prompt, Orion status, response body). These
//! are user-facing output, separate from the `log` records.

use core::fmt::Debug;

use log::warn;

pub const FIRST_PROMPT: &str = "Type an ID: ";
pub const NEXT_PROMPT: &str = "Type another ID: ";

pub trait Console {
    type Error: Debug;

    /// Copy the bytes already received into `buf` without waiting.
    ///
    /// Returns `Ok(0)` when nothing is pending.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    fn write_str(&mut self, text: &str) -> Result<(), Self::Error>;

    fn write_line(&mut self, text: &str) -> Result<(), Self::Error> {
        self.write_str(text)?;
        self.write_str("\r\n")
    }
}

/// Write a line, logging instead of failing.
pub fn say<C: Console>(console: &mut C, text: &str) {
    if let Err(e) = console.write_line(text) {
        warn!("Console write failed: {:?}", e);
    }
}
