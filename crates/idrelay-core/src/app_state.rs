//! Application-wide run state and error types for idrelay

use core::fmt;

use thiserror_no_std::Error;

use crate::association::AssociationError;
use crate::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppRunState {
    Uninitialized,
    Booting,
    WifiConnecting,
    WifiConnected,
    WifiFailed,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(ConfigError),
    #[error("WiFi association failed: {0}")]
    Association(AssociationError),
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<AssociationError> for AppError {
    fn from(value: AssociationError) -> Self {
        Self::Association(value)
    }
}

/// Keeps whatever fits and silently drops the rest.
struct Truncating<'a, const N: usize>(&'a mut heapless::String<N>);

impl<const N: usize> fmt::Write for Truncating<'_, N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for ch in s.chars() {
            if self.0.push(ch).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Format into a fixed-capacity string, truncating instead of failing.
pub fn message<const N: usize>(args: fmt::Arguments<'_>) -> heapless::String<N> {
    let mut text = heapless::String::new();
    let _ = fmt::write(&mut Truncating(&mut text), args);
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_truncates() {
        let text: heapless::String<8> = message(format_args!("{}-{}", "abcdef", 12345));
        assert_eq!(text.as_str(), "abcdef-1");
    }

    #[test]
    fn message_keeps_whole_characters() {
        let text: heapless::String<4> = message(format_args!("ab{}", "çd"));
        assert_eq!(text.as_str(), "abç");
    }

    #[test]
    fn short_message_is_untouched() {
        let text: heapless::String<64> = message(format_args!("{:?}", "AP not found"));
        assert_eq!(text.as_str(), "\"AP not found\"");
    }
}
