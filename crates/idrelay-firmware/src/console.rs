//! UART diagnostic channel

use esp_hal::Blocking;
use esp_hal::uart::{RxError, TxError, Uart};
use idrelay_core::console::Console;
use thiserror_no_std::Error;

#[derive(Error, Debug)]
pub enum UartConsoleError {
    #[error("UART receive error: {0:?}")]
    Rx(RxError),
    #[error("UART transmit error: {0:?}")]
    Tx(TxError),
}

pub struct UartConsole<'d> {
    uart: Uart<'d, Blocking>,
}

impl<'d> UartConsole<'d> {
    pub const fn new(uart: Uart<'d, Blocking>) -> Self {
        Self { uart }
    }
}

impl Console for UartConsole<'_> {
    type Error = UartConsoleError;

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        // Only what is already in the RX FIFO; never waits for more
        self.uart.read_buffered(buf).map_err(UartConsoleError::Rx)
    }

    fn write_str(&mut self, text: &str) -> Result<(), Self::Error> {
        let mut remaining = text.as_bytes();
        while !remaining.is_empty() {
            let written = self.uart.write(remaining).map_err(UartConsoleError::Tx)?;
            remaining = &remaining[written..];
        }
        self.uart.flush().map_err(UartConsoleError::Tx)
    }
}
