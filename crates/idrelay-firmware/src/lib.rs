//! ESP32-S3 firmware-specific modules for idrelay
//!
//! This crate contains hardware-specific code that cannot compile on desktop
//! targets: ESP32 peripheral initialization, the UART console, WiFi
//! association and the embassy-net HTTP transport. Everything else lives in
//! `idrelay-core`.

#![no_std]

extern crate alloc;

pub mod config;
pub mod console;
pub mod hardware;
pub mod http_client;
pub mod wifi;
