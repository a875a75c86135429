//! Operator identifiers and the serial line assembler

use core::fmt;
use core::ops::Deref;

use log::warn;

/// Largest identifier, in bytes, the line buffer accepts.
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Trimmed, non-empty identifier typed by the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier(heapless::String<MAX_IDENTIFIER_LEN>);

impl Identifier {
    /// Trim surrounding whitespace. Empty or oversized input gives `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let mut text = heapless::String::new();
        text.push_str(trimmed).ok()?;
        Some(Self(text))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Deref for Identifier {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assembles `'\n'`-terminated lines from serial bytes.
///
/// Bytes without a terminator stay buffered across calls. A line longer than
/// [`MAX_IDENTIFIER_LEN`] is dropped whole once its terminator arrives.
#[derive(Debug, Default)]
pub struct LineReader {
    buffer: heapless::Vec<u8, MAX_IDENTIFIER_LEN>,
    overflowed: bool,
}

impl LineReader {
    pub const fn new() -> Self {
        Self {
            buffer: heapless::Vec::new(),
            overflowed: false,
        }
    }

    /// Feed one byte. Returns an identifier when a non-empty line completes.
    pub fn push(&mut self, byte: u8) -> Option<Identifier> {
        if byte != b'\n' {
            if self.buffer.push(byte).is_err() {
                self.overflowed = true;
            }
            return None;
        }

        let line = if self.overflowed {
            warn!(
                "Discarding input line longer than {} bytes",
                MAX_IDENTIFIER_LEN
            );
            None
        } else {
            match core::str::from_utf8(&self.buffer) {
                Ok(text) => Identifier::parse(text),
                Err(_) => {
                    warn!("Discarding input line that is not valid UTF-8");
                    None
                }
            }
        };

        self.buffer.clear();
        self.overflowed = false;
        line
    }

    /// Bytes of the current, unterminated line.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}
