//! Port doubles shared by the unit tests

use std::collections::VecDeque;
use std::convert::Infallible;

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{ErrorType, I2c, Operation};

use crate::association::{Connectivity, WifiLink};
use crate::console::Console;
use crate::display::CharacterDisplay;
use crate::http::{Method, Request, Response};
use crate::transport::{HttpTransport, TransportError};

/// Serial line: scripted input, captured output lines.
#[derive(Default)]
pub struct MockConsole {
    input: VecDeque<u8>,
    partial: String,
    pub lines: Vec<String>,
}

impl MockConsole {
    pub fn type_text(&mut self, text: &str) {
        self.input.extend(text.bytes());
    }
}

impl Console for MockConsole {
    type Error = Infallible;

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut count = 0;
        while count < buf.len() {
            match self.input.pop_front() {
                Some(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }

    fn write_str(&mut self, text: &str) -> Result<(), Self::Error> {
        self.partial.push_str(text);
        while let Some(end) = self.partial.find("\r\n") {
            let line = self.partial[..end].to_string();
            self.partial.drain(..end + 2);
            self.lines.push(line);
        }
        Ok(())
    }
}

/// In-memory character grid.
pub struct MockDisplay {
    columns: u8,
    rows: u8,
    grid: Vec<Vec<char>>,
    cursor: (u8, u8),
    pub backlight: bool,
    pub clears: usize,
    /// Set when a print ran past the end of a row.
    pub overflowed: bool,
}

impl MockDisplay {
    pub fn new(columns: u8, rows: u8) -> Self {
        Self {
            columns,
            rows,
            grid: vec![vec![' '; usize::from(columns)]; usize::from(rows)],
            cursor: (0, 0),
            backlight: false,
            clears: 0,
            overflowed: false,
        }
    }

    /// Row content without trailing blanks.
    pub fn row(&self, row: usize) -> String {
        self.grid[row].iter().collect::<String>().trim_end().to_string()
    }

    pub fn is_blank(&self) -> bool {
        (0..usize::from(self.rows)).all(|row| self.row(row).is_empty())
    }
}

impl CharacterDisplay for MockDisplay {
    type Error = Infallible;

    fn columns(&self) -> u8 {
        self.columns
    }

    fn rows(&self) -> u8 {
        self.rows
    }

    async fn clear(&mut self) -> Result<(), Self::Error> {
        for row in &mut self.grid {
            row.fill(' ');
        }
        self.cursor = (0, 0);
        self.clears += 1;
        Ok(())
    }

    async fn set_cursor(&mut self, column: u8, row: u8) -> Result<(), Self::Error> {
        self.cursor = (column, row);
        Ok(())
    }

    async fn print(&mut self, text: &str) -> Result<(), Self::Error> {
        let (mut column, row) = self.cursor;
        for ch in text.chars() {
            if column >= self.columns {
                self.overflowed = true;
                break;
            }
            self.grid[usize::from(row)][usize::from(column)] = ch;
            column += 1;
        }
        self.cursor = (column, row);
        Ok(())
    }

    async fn set_backlight(&mut self, on: bool) -> Result<(), Self::Error> {
        self.backlight = on;
        Ok(())
    }
}

/// WiFi link whose association completes after a number of status queries.
#[derive(Default)]
pub struct MockLink {
    connect_after: Option<u32>,
    failing_begins: u32,
    dropped: bool,
    pub begun_with: Option<String>,
    pub begin_calls: u32,
    pub status_queries: u32,
}

impl MockLink {
    pub fn connected() -> Self {
        Self::connecting_after(0)
    }

    pub fn connecting_after(queries: u32) -> Self {
        Self {
            connect_after: Some(queries),
            ..Self::default()
        }
    }

    pub fn never_connecting() -> Self {
        Self::default()
    }

    pub fn failing_begin() -> Self {
        Self {
            failing_begins: u32::MAX,
            ..Self::default()
        }
    }

    /// Already in range, but the first `count` starts fail.
    pub fn failing_first_begins(count: u32) -> Self {
        Self {
            connect_after: Some(0),
            failing_begins: count,
            ..Self::default()
        }
    }

    /// Simulate the access point going away.
    pub fn drop_link(&mut self) {
        self.dropped = true;
    }
}

impl Connectivity for MockLink {
    fn is_connected(&mut self) -> bool {
        self.status_queries += 1;
        if self.dropped {
            return false;
        }
        matches!(self.connect_after, Some(after) if self.status_queries > after)
    }
}

impl WifiLink for MockLink {
    type Error = &'static str;

    async fn begin(&mut self, ssid: &str, _password: &str) -> Result<(), Self::Error> {
        self.begin_calls += 1;
        if self.failing_begins > 0 {
            self.failing_begins -= 1;
            return Err("radio not started");
        }
        self.begun_with = Some(ssid.to_string());
        Ok(())
    }
}

/// What a transport saw, copied out of the borrowed [`Request`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub host: String,
    pub port: u16,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

pub struct MockTransport {
    reply: Result<Response, TransportError>,
    pub requests: Vec<RecordedRequest>,
}

impl MockTransport {
    pub fn replying(status: u16, body: &str) -> Self {
        Self {
            reply: Ok(Response {
                status,
                body: body.to_string(),
            }),
            requests: Vec::new(),
        }
    }

    pub fn failing(error: TransportError) -> Self {
        Self {
            reply: Err(error),
            requests: Vec::new(),
        }
    }
}

impl HttpTransport for MockTransport {
    async fn send(&mut self, request: &Request<'_>) -> Result<Response, TransportError> {
        self.requests.push(RecordedRequest {
            method: request.method,
            host: request.endpoint.host.to_string(),
            port: request.endpoint.port,
            path: request.endpoint.path.to_string(),
            headers: request
                .headers
                .iter()
                .map(|h| (h.name.to_string(), h.value.to_string()))
                .collect(),
            body: String::from_utf8(request.body.to_vec()).unwrap(),
        });
        self.reply.clone()
    }
}

/// Returns immediately, remembering how long it was asked to wait.
#[derive(Default)]
pub struct RecordingDelay {
    total_ns: u64,
}

impl RecordingDelay {
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }

    async fn delay_us(&mut self, us: u32) {
        self.total_ns += u64::from(us) * 1_000;
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.total_ns += u64::from(ms) * 1_000_000;
    }
}

/// I2C bus that records every write transaction.
#[derive(Default)]
pub struct MockI2c {
    pub writes: Vec<(u8, Vec<u8>)>,
}

impl ErrorType for MockI2c {
    type Error = Infallible;
}

impl I2c for MockI2c {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for operation in operations {
            if let Operation::Write(bytes) = operation {
                self.writes.push((address, bytes.to_vec()));
            }
        }
        Ok(())
    }
}
