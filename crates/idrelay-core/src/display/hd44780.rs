//! HD44780 character LCD behind a PCF8574 I2C backpack
//!
//! The backpack maps its eight output pins as follows:
//!
//! | PCF8574 | P7 | P6 | P5 | P4 | P3        | P2 | P1 | P0 |
//! |---------|----|----|----|----|-----------|----|----|----|
//! | HD44780 | D7 | D6 | D5 | D4 | backlight | E  | RW | RS |
//!
//! The controller is driven in 4-bit mode, write-only (RW is held low).

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use log::debug;
use thiserror_no_std::Error;

use super::CharacterDisplay;

const RS: u8 = 0x01;
const ENABLE: u8 = 0x04;
const BACKLIGHT: u8 = 0x08;

const CMD_CLEAR: u8 = 0x01;
const CMD_HOME: u8 = 0x02;
const CMD_ENTRY_MODE: u8 = 0x04;
const CMD_DISPLAY_CONTROL: u8 = 0x08;
const CMD_FUNCTION_SET: u8 = 0x20;
const CMD_SET_DDRAM: u8 = 0x80;

const ENTRY_LEFT: u8 = 0x02;
const DISPLAY_ON: u8 = 0x04;
const TWO_LINES: u8 = 0x08;

/// DDRAM address of the first column of each row.
const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

#[derive(Error, Debug)]
pub enum DisplayError<E: core::fmt::Debug> {
    #[error("I2C bus error: {0:?}")]
    Bus(E),
    #[error("cursor ({column}, {row}) is outside the display")]
    OutOfBounds { column: u8, row: u8 },
}

pub struct Hd44780I2c<I, D> {
    i2c: I,
    delay: D,
    address: u8,
    columns: u8,
    rows: u8,
    backlight: u8,
}

impl<I, D> Hd44780I2c<I, D>
where
    I: I2c,
    D: DelayNs,
{
    pub const fn new(i2c: I, delay: D, address: u8, columns: u8, rows: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
            columns,
            rows,
            backlight: 0,
        }
    }

    /// Power-on initialization into 4-bit, two-line mode.
    pub async fn init(&mut self) -> Result<(), DisplayError<I::Error>> {
        // Wait for Vcc to settle, then drive every pin low
        self.delay.delay_ms(50).await;
        self.expander_write(0).await?;

        // Reset sequence from the HD44780 datasheet (figure 24)
        for wait_us in [4_500, 4_500, 150] {
            self.write_nibble(0x30).await?;
            self.delay.delay_us(wait_us).await;
        }
        self.write_nibble(0x20).await?;

        let function = if self.rows > 1 { TWO_LINES } else { 0 };
        self.command(CMD_FUNCTION_SET | function).await?;
        self.command(CMD_DISPLAY_CONTROL | DISPLAY_ON).await?;
        self.command(CMD_ENTRY_MODE | ENTRY_LEFT).await?;
        self.command(CMD_CLEAR).await?;
        self.delay.delay_us(2_000).await;
        self.command(CMD_HOME).await?;
        self.delay.delay_us(2_000).await;

        debug!(
            "HD44780 at {:#04x} ready ({}x{})",
            self.address, self.columns, self.rows
        );
        Ok(())
    }

    pub fn release(self) -> (I, D) {
        (self.i2c, self.delay)
    }

    async fn expander_write(&mut self, data: u8) -> Result<(), DisplayError<I::Error>> {
        self.i2c
            .write(self.address, &[data | self.backlight])
            .await
            .map_err(DisplayError::Bus)
    }

    /// Latch the upper four bits of `data` with one enable pulse.
    async fn write_nibble(&mut self, data: u8) -> Result<(), DisplayError<I::Error>> {
        let data = data | self.backlight;
        // One byte per expander update: setup, enable high, enable low
        self.i2c
            .write(self.address, &[data, data | ENABLE, data & !ENABLE])
            .await
            .map_err(DisplayError::Bus)?;
        self.delay.delay_us(50).await;
        Ok(())
    }

    async fn send(&mut self, value: u8, mode: u8) -> Result<(), DisplayError<I::Error>> {
        self.write_nibble((value & 0xf0) | mode).await?;
        self.write_nibble((value << 4) | mode).await
    }

    async fn command(&mut self, value: u8) -> Result<(), DisplayError<I::Error>> {
        self.send(value, 0).await
    }
}

impl<I, D> CharacterDisplay for Hd44780I2c<I, D>
where
    I: I2c,
    D: DelayNs,
{
    type Error = DisplayError<I::Error>;

    fn columns(&self) -> u8 {
        self.columns
    }

    fn rows(&self) -> u8 {
        self.rows
    }

    async fn clear(&mut self) -> Result<(), Self::Error> {
        self.command(CMD_CLEAR).await?;
        self.delay.delay_us(2_000).await;
        Ok(())
    }

    async fn set_cursor(&mut self, column: u8, row: u8) -> Result<(), Self::Error> {
        if column >= self.columns || row >= self.rows || usize::from(row) >= ROW_OFFSETS.len() {
            return Err(DisplayError::OutOfBounds { column, row });
        }
        self.command(CMD_SET_DDRAM | (ROW_OFFSETS[usize::from(row)] + column))
            .await
    }

    async fn print(&mut self, text: &str) -> Result<(), Self::Error> {
        for ch in text.chars() {
            let byte = if ch.is_ascii() && !ch.is_ascii_control() {
                ch as u8
            } else {
                b'?'
            };
            self.send(byte, RS).await?;
        }
        Ok(())
    }

    async fn set_backlight(&mut self, on: bool) -> Result<(), Self::Error> {
        self.backlight = if on { BACKLIGHT } else { 0 };
        self.expander_write(0).await
    }
}
