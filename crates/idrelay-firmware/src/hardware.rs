//! Peripheral setup for the idrelay board
//!
//! Wiring (ESP32-S3 DevKit):
//! - UART0: TX GPIO43, RX GPIO44 (the USB-UART bridge)
//! - I2C0: SDA GPIO8, SCL GPIO9, LCD backpack at 0x27

use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::peripherals::{GPIO8, GPIO9, GPIO43, GPIO44, I2C0, UART0};
use esp_hal::time::Rate;
use esp_hal::uart::{Config as UartConfig, Uart};
use esp_hal::{Async, Blocking};
use log::info;

use crate::console::UartConsole;

/// Open the diagnostic UART. Runs before anything can report a failure, so
/// a bad configuration panics.
pub fn create_console(
    uart0: UART0<'static>,
    tx: GPIO43<'static>,
    rx: GPIO44<'static>,
    baud_rate: u32,
) -> UartConsole<'static> {
    let uart: Uart<'static, Blocking> =
        Uart::new(uart0, UartConfig::default().with_baudrate(baud_rate))
            .expect("Failed to configure UART0")
            .with_tx(tx)
            .with_rx(rx);
    info!("Console on UART0 at {} baud", baud_rate);
    UartConsole::new(uart)
}

/// Initialize the I2C bus the LCD backpack sits on.
///
/// PCF8574 backpacks are only rated for standard mode, so the bus runs at
/// 100 kHz.
pub fn create_i2c_bus(
    i2c0: I2C0<'static>,
    sda: GPIO8<'static>,
    scl: GPIO9<'static>,
) -> I2c<'static, Async> {
    I2c::new(i2c0, I2cConfig::default().with_frequency(Rate::from_khz(100)))
        .expect("Failed to configure I2C0")
        .with_sda(sda)
        .with_scl(scl)
        .into_async()
}
