//! Desktop simulator for the idrelay identifier relay.
//!
//! Runs the `idrelay-core` application against host stand-ins: stdin/stdout
//! play the serial console, the 16x2 LCD is drawn on stderr, and requests go
//! out over `std::net`. WiFi association is simulated.
//!
//! # Usage
//!
//! ```text
//! idrelay-simulator [CONFIG.json] [--no-wifi]
//! ```
//!
//! `CONFIG.json` uses the same keys as the firmware configuration; missing
//! keys keep their defaults. `--no-wifi` makes the access point unreachable
//! so the failure screen can be exercised. Set `RUST_LOG=debug` for more.

use std::convert::Infallible;
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Duration;

use embedded_hal_async::delay::DelayNs;
use log::{debug, error, info, warn};

use idrelay_core::App;
use idrelay_core::association::{Connectivity, WifiLink};
use idrelay_core::config::Config;
use idrelay_core::console::Console;
use idrelay_core::display::{CharacterDisplay, MAX_COLUMNS};
use idrelay_core::http::{Request, Response, message_complete};
use idrelay_core::transport::{HttpTransport, TransportError};

// ---------------------------------------------------------------------------
// Simulation constants
// ---------------------------------------------------------------------------

/// Status polls that report "down" before the simulated access point accepts
/// the station.
const POLLS_UNTIL_ASSOCIATED: u32 = 3;

const READ_CHUNK_LEN: usize = 256;
const MAX_RESPONSE_LEN: usize = 2048;

// ---------------------------------------------------------------------------
// Serial console on stdin/stdout
// ---------------------------------------------------------------------------

/// stdin is read on a helper thread so polling never blocks.
struct StdioConsole {
    input: Receiver<u8>,
    closed: bool,
}

impl StdioConsole {
    fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            for byte in io::stdin().lock().bytes() {
                match byte {
                    Ok(byte) => {
                        if tx.send(byte).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("stdin read failed: {}", e);
                        break;
                    }
                }
            }
        });
        Self {
            input: rx,
            closed: false,
        }
    }
}

impl Console for StdioConsole {
    type Error = io::Error;

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut count = 0;
        while count < buf.len() {
            match self.input.try_recv() {
                Ok(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.closed {
                        info!("stdin closed, no more identifiers will arrive");
                        self.closed = true;
                    }
                    break;
                }
            }
        }
        Ok(count)
    }

    fn write_str(&mut self, text: &str) -> Result<(), Self::Error> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()
    }
}

// ---------------------------------------------------------------------------
// Character LCD drawn on stderr
// ---------------------------------------------------------------------------

struct TerminalDisplay {
    columns: u8,
    rows: u8,
    cells: Vec<Vec<char>>,
    cursor: (u8, u8),
    backlight: bool,
}

impl TerminalDisplay {
    fn new(columns: u8, rows: u8) -> Self {
        let columns = columns.min(MAX_COLUMNS as u8);
        Self {
            columns,
            rows,
            cells: vec![vec![' '; usize::from(columns)]; usize::from(rows)],
            cursor: (0, 0),
            backlight: false,
        }
    }

    fn render(&self) {
        let border = format!("+{}+", "-".repeat(usize::from(self.columns)));
        let mut frame = String::new();
        frame.push_str(&border);
        frame.push('\n');
        for row in &self.cells {
            frame.push('|');
            frame.extend(row.iter());
            frame.push_str("|\n");
        }
        frame.push_str(&border);
        if !self.backlight {
            frame.push_str(" (backlight off)");
        }
        eprintln!("{frame}");
    }
}

impl CharacterDisplay for TerminalDisplay {
    type Error = Infallible;

    fn columns(&self) -> u8 {
        self.columns
    }

    fn rows(&self) -> u8 {
        self.rows
    }

    async fn clear(&mut self) -> Result<(), Self::Error> {
        for row in &mut self.cells {
            row.fill(' ');
        }
        self.cursor = (0, 0);
        self.render();
        Ok(())
    }

    async fn set_cursor(&mut self, column: u8, row: u8) -> Result<(), Self::Error> {
        self.cursor = (column.min(self.columns), row.min(self.rows.saturating_sub(1)));
        Ok(())
    }

    async fn print(&mut self, text: &str) -> Result<(), Self::Error> {
        let (mut column, row) = self.cursor;
        let Some(cells) = self.cells.get_mut(usize::from(row)) else {
            return Ok(());
        };
        for ch in text.chars() {
            let Some(cell) = cells.get_mut(usize::from(column)) else {
                break;
            };
            *cell = ch;
            column += 1;
        }
        self.cursor = (column, row);
        self.render();
        Ok(())
    }

    async fn set_backlight(&mut self, on: bool) -> Result<(), Self::Error> {
        self.backlight = on;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Simulated WiFi
// ---------------------------------------------------------------------------

struct SimulatedLink {
    reachable: bool,
    started: bool,
    polls: u32,
}

impl SimulatedLink {
    fn new(reachable: bool) -> Self {
        Self {
            reachable,
            started: false,
            polls: 0,
        }
    }
}

impl Connectivity for SimulatedLink {
    fn is_connected(&mut self) -> bool {
        if !self.started || !self.reachable {
            return false;
        }
        self.polls = self.polls.saturating_add(1);
        self.polls > POLLS_UNTIL_ASSOCIATED
    }
}

impl WifiLink for SimulatedLink {
    type Error = Infallible;

    async fn begin(&mut self, ssid: &str, _password: &str) -> Result<(), Self::Error> {
        debug!("Simulated association with \"{}\"", ssid);
        self.started = true;
        self.polls = 0;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// HTTP over std::net
// ---------------------------------------------------------------------------

struct StdHttpTransport {
    timeout: Duration,
}

impl StdHttpTransport {
    fn new(timeout_ms: u32) -> Self {
        Self {
            timeout: Duration::from_millis(u64::from(timeout_ms)),
        }
    }

    fn connect(&self, host: &str, port: u16) -> Result<TcpStream, TransportError> {
        let addresses = (host, port).to_socket_addrs().map_err(|e| {
            warn!("DNS lookup for {} failed: {}", host, e);
            TransportError::Dns
        })?;
        let mut last_error = None;
        for address in addresses {
            match TcpStream::connect_timeout(&address, self.timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_error = Some(e),
            }
        }
        match last_error {
            Some(e) => debug!("Connect to {}:{} failed: {}", host, port, e),
            None => debug!("{} resolved to no addresses", host),
        }
        Err(TransportError::ConnectionRefused)
    }

    fn exchange(&self, request: &Request<'_>) -> Result<Vec<u8>, TransportError> {
        let mut stream = self.connect(request.endpoint.host, request.endpoint.port)?;
        stream
            .set_read_timeout(Some(self.timeout))
            .and_then(|()| stream.set_write_timeout(Some(self.timeout)))
            .map_err(|_| TransportError::ConnectionLost)?;

        stream
            .write_all(request.encode_head().as_bytes())
            .map_err(|_| TransportError::SendHeaderFailed)?;
        stream
            .write_all(request.body)
            .and_then(|()| stream.flush())
            .map_err(|_| TransportError::SendPayloadFailed)?;

        let mut response = Vec::new();
        let mut chunk = [0u8; READ_CHUNK_LEN];
        loop {
            let read = match stream.read(&mut chunk) {
                Ok(read) => read,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    return Err(TransportError::ReadTimeout);
                }
                Err(_) => return Err(TransportError::ConnectionLost),
            };
            if read == 0 {
                break;
            }
            if response.len() + read > MAX_RESPONSE_LEN {
                return Err(TransportError::OutOfMemory);
            }
            response.extend_from_slice(&chunk[..read]);
            if message_complete(&response) {
                break;
            }
        }
        // The stream is dropped, and so closed, here
        Ok(response)
    }
}

impl HttpTransport for StdHttpTransport {
    async fn send(&mut self, request: &Request<'_>) -> Result<Response, TransportError> {
        let bytes = self.exchange(request)?;
        Response::parse(&bytes).map_err(|e| {
            warn!("Unusable response ({} bytes): {:?}", bytes.len(), e);
            TransportError::from(e)
        })
    }
}

// ---------------------------------------------------------------------------
// Delay
// ---------------------------------------------------------------------------

struct ThreadDelay;

impl DelayNs for ThreadDelay {
    async fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    async fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

struct Args {
    config_path: Option<String>,
    wifi_reachable: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        config_path: None,
        wifi_reachable: true,
    };
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--no-wifi" => args.wifi_reachable = false,
            other if other.starts_with("--") => warn!("Ignoring unknown option {}", other),
            path => args.config_path = Some(path.to_owned()),
        }
    }
    args
}

fn main() {
    env_logger::init();
    info!("Starting idrelay simulator");

    let args = parse_args();
    let config_text = match &args.config_path {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                error!("Cannot read {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => String::from("{}"),
    };
    let config = match Config::from_json(&config_text) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        "WiFi \"{}\", Orion at {}",
        config.wifi.ssid, config.orion.url
    );

    let display = TerminalDisplay::new(config.display.columns, config.display.rows);
    let transport = StdHttpTransport::new(config.orion.http_timeout_ms);
    let link = SimulatedLink::new(args.wifi_reachable);

    let mut app = match App::new(
        &config,
        StdioConsole::spawn(),
        display,
        link,
        transport,
        ThreadDelay,
    ) {
        Ok(app) => app,
        Err(e) => {
            error!("Cannot start: {}", e);
            std::process::exit(1);
        }
    };

    embassy_futures::block_on(async {
        if let Err(e) = app.boot().await {
            error!("Boot failed: {}", e);
            std::process::exit(2);
        }
        app.run().await
    })
}
