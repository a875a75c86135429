//! Character display port and the status screens shown on it
//!
//! Text is clipped to the columns left on the row; characters outside
//! printable ASCII are shown as `?`.

pub mod hd44780;

use core::fmt::Debug;

pub use hd44780::{DisplayError, Hd44780I2c};

pub const BOOTING_TEXT: &str = "Booting...";
pub const ASSOCIATING_TEXT: &str = "WiFi...";
pub const CONNECTED_TEXT: &str = "WiFi OK";
pub const FAILED_TEXT: &str = "WiFi failed";
pub const SENDING_LABEL: &str = "Sending ID:";

/// HD44780 lines are at most 40 characters wide.
pub const MAX_COLUMNS: usize = 40;

/// Character-matrix display with a cursor.
pub trait CharacterDisplay {
    type Error: Debug;

    fn columns(&self) -> u8;

    fn rows(&self) -> u8;

    fn clear(&mut self) -> impl Future<Output = Result<(), Self::Error>>;

    fn set_cursor(&mut self, column: u8, row: u8)
    -> impl Future<Output = Result<(), Self::Error>>;

    /// Print at the cursor, advancing it.
    fn print(&mut self, text: &str) -> impl Future<Output = Result<(), Self::Error>>;

    fn set_backlight(&mut self, on: bool) -> impl Future<Output = Result<(), Self::Error>>;
}

/// Map to the display's character set and clip to `columns`.
pub fn fit_to_columns(text: &str, columns: u8) -> heapless::String<MAX_COLUMNS> {
    let mut fitted = heapless::String::new();
    for ch in text.chars().take(usize::from(columns).min(MAX_COLUMNS)) {
        let shown = if ch.is_ascii() && !ch.is_ascii_control() {
            ch
        } else {
            '?'
        };
        // Capacity is bounded by the take() above
        let _ = fitted.push(shown);
    }
    fitted
}

/// The fixed screens the device shows, drawn on any [`CharacterDisplay`]
pub struct StatusScreen<D> {
    display: D,
}

impl<D: CharacterDisplay> StatusScreen<D> {
    pub const fn new(display: D) -> Self {
        Self { display }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub async fn power_on(&mut self) -> Result<(), D::Error> {
        self.display.set_backlight(true).await?;
        self.display.clear().await
    }

    pub async fn clear(&mut self) -> Result<(), D::Error> {
        self.display.clear().await
    }

    /// Write `text` from the start of `row`, clipped to the row width.
    pub async fn write_row(&mut self, row: u8, text: &str) -> Result<(), D::Error> {
        self.display.set_cursor(0, row).await?;
        let fitted = fit_to_columns(text, self.display.columns());
        self.display.print(&fitted).await
    }

    pub async fn show_booting(&mut self) -> Result<(), D::Error> {
        self.write_row(0, BOOTING_TEXT).await
    }

    pub async fn show_associating(&mut self) -> Result<(), D::Error> {
        self.write_row(1, ASSOCIATING_TEXT).await
    }

    pub async fn show_connected(&mut self) -> Result<(), D::Error> {
        self.display.clear().await?;
        self.write_row(0, CONNECTED_TEXT).await
    }

    pub async fn show_association_failed(&mut self, ssid: &str) -> Result<(), D::Error> {
        self.display.clear().await?;
        self.write_row(0, FAILED_TEXT).await?;
        self.write_row(1, ssid).await
    }

    pub async fn show_sending(&mut self, identifier: &str) -> Result<(), D::Error> {
        self.display.clear().await?;
        self.write_row(0, SENDING_LABEL).await?;
        self.write_row(1, identifier).await
    }
}
