//! Hardware-independent core library for idrelay
//!
//! This crate contains all platform-agnostic logic for the identifier relay:
//! the boot sequence, the serial poll loop, the Orion submission routine, the
//! HTTP/1.1 wire codec and the HD44780 character display driver. Hardware is
//! reached through small port traits ([`console::Console`],
//! [`display::CharacterDisplay`], [`association::WifiLink`],
//! [`transport::HttpTransport`]).
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets (ESP32-S3) and desktop hosts (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod app;
pub mod app_state;
pub mod association;
pub mod config;
pub mod console;
pub mod display;
pub mod http;
pub mod identifier;
pub mod payload;
pub mod submit;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use app::{App, PollOutcome};
pub use app_state::{AppError, AppRunState};
pub use config::Config;
pub use identifier::Identifier;
pub use transport::SubmissionResult;
