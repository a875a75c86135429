//! Minimal HTTP/1.1 client codec
//!
//! Only what talking to an Orion broker needs: URL splitting, request
//! encoding and response parsing for `GET` and `PATCH`. Every request is sent with
//! `Connection: close`, so a response ends either when `Content-Length` is
//! satisfied or when the peer closes the connection.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write as _;

use thiserror_no_std::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Patch,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Patch => "PATCH",
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlError {
    #[error("only plain http:// URLs are supported")]
    UnsupportedScheme,
    #[error("URL has no host")]
    MissingHost,
    #[error("URL port is not a number in 1..=65535")]
    InvalidPort,
}

/// Target of a request, borrowed from the configured URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint<'a> {
    pub host: &'a str,
    pub port: u16,
    pub path: &'a str,
}

impl<'a> Endpoint<'a> {
    pub fn parse(url: &'a str) -> Result<Self, UrlError> {
        let rest = url
            .strip_prefix("http://")
            .ok_or(UrlError::UnsupportedScheme)?;

        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, "/"),
        };

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| UrlError::InvalidPort)?;
                if port == 0 {
                    return Err(UrlError::InvalidPort);
                }
                (host, port)
            }
            None => (authority, 80),
        };

        if host.is_empty() {
            return Err(UrlError::MissingHost);
        }

        Ok(Self { host, port, path })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header<'a> {
    pub name: &'a str,
    pub value: &'a str,
}

impl<'a> Header<'a> {
    pub const fn new(name: &'a str, value: &'a str) -> Self {
        Self { name, value }
    }
}

pub const CONTENT_TYPE_JSON: Header<'static> = Header::new("Content-Type", "application/json");

/// A request ready to be written to a socket
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    pub method: Method,
    pub endpoint: &'a Endpoint<'a>,
    pub headers: &'a [Header<'a>],
    pub body: &'a [u8],
}

impl Request<'_> {
    /// Request line and headers, including the blank separator line.
    pub fn encode_head(&self) -> String {
        let mut head = String::new();
        // Writing into a String cannot fail
        let _ = write!(
            head,
            "{} {} HTTP/1.1\r\nHost: {}",
            self.method.as_str(),
            self.endpoint.path,
            self.endpoint.host
        );
        if self.endpoint.port != 80 {
            let _ = write!(head, ":{}", self.endpoint.port);
        }
        head.push_str("\r\n");
        for header in self.headers {
            let _ = write!(head, "{}: {}\r\n", header.name, header.value);
        }
        let _ = write!(
            head,
            "Content-Length: {}\r\nConnection: close\r\n\r\n",
            self.body.len()
        );
        head
    }

    /// Full request bytes: head followed by the body.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = self.encode_head().into_bytes();
        bytes.extend_from_slice(self.body);
        bytes
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpError {
    #[error("response ended before the header block")]
    Incomplete,
    #[error("response ended before the announced body length")]
    TruncatedBody,
    #[error("malformed status line")]
    MalformedStatusLine,
    #[error("malformed header line")]
    MalformedHeader,
    #[error("invalid Content-Length")]
    InvalidContentLength,
    #[error("malformed chunked body")]
    MalformedChunk,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

struct Head {
    status: u16,
    content_length: Option<usize>,
    chunked: bool,
    body_start: usize,
}

const HEADER_END: &[u8] = b"\r\n\r\n";

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn parse_head(bytes: &[u8]) -> Result<Head, HttpError> {
    let end = find(bytes, HEADER_END).ok_or(HttpError::Incomplete)?;
    let text = core::str::from_utf8(&bytes[..end]).map_err(|_| HttpError::MalformedHeader)?;
    let mut lines = text.split("\r\n");

    let status_line = lines.next().ok_or(HttpError::MalformedStatusLine)?;
    let mut parts = status_line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/1.") {
        return Err(HttpError::MalformedStatusLine);
    }
    let status = parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .filter(|code| (100..=999).contains(code))
        .ok_or(HttpError::MalformedStatusLine)?;

    let mut content_length = None;
    let mut chunked = false;
    for line in lines {
        let (name, value) = line.split_once(':').ok_or(HttpError::MalformedHeader)?;
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-length") {
            let length = value
                .parse::<usize>()
                .map_err(|_| HttpError::InvalidContentLength)?;
            content_length = Some(length);
        } else if name.eq_ignore_ascii_case("transfer-encoding") {
            chunked = value.eq_ignore_ascii_case("chunked");
        }
    }

    Ok(Head {
        status,
        content_length,
        chunked,
        body_start: end + HEADER_END.len(),
    })
}

/// Status codes that never carry a body.
const fn is_bodyless(status: u16) -> bool {
    matches!(status, 100..=199 | 204 | 304)
}

/// Whether `bytes` already holds a whole response.
///
/// Returns `false` when the end can only be detected by the peer closing the
/// connection.
pub fn message_complete(bytes: &[u8]) -> bool {
    let Ok(head) = parse_head(bytes) else {
        return false;
    };
    if is_bodyless(head.status) {
        return true;
    }
    if head.chunked {
        // More bytes can only help a body that is cut short
        return !matches!(
            decode_chunked(&bytes[head.body_start..]),
            Err(HttpError::TruncatedBody)
        );
    }
    match head.content_length {
        Some(length) => bytes.len() - head.body_start >= length,
        None => false,
    }
}

fn decode_chunked(mut body: &[u8]) -> Result<Vec<u8>, HttpError> {
    let mut decoded = Vec::new();
    loop {
        let line_end = find(body, b"\r\n").ok_or(HttpError::TruncatedBody)?;
        let size_line =
            core::str::from_utf8(&body[..line_end]).map_err(|_| HttpError::MalformedChunk)?;
        // Chunk extensions follow a ';'
        let size_hex = size_line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_hex, 16).map_err(|_| HttpError::MalformedChunk)?;
        body = &body[line_end + 2..];
        if size == 0 {
            return Ok(decoded);
        }
        let framed = size.checked_add(2).ok_or(HttpError::MalformedChunk)?;
        if body.len() < framed {
            return Err(HttpError::TruncatedBody);
        }
        if &body[size..framed] != b"\r\n" {
            return Err(HttpError::MalformedChunk);
        }
        decoded.extend_from_slice(&body[..size]);
        body = &body[framed..];
    }
}

impl Response {
    /// Parse a complete response as read from the socket.
    pub fn parse(bytes: &[u8]) -> Result<Self, HttpError> {
        let head = parse_head(bytes)?;
        let raw_body = &bytes[head.body_start..];

        let body = if is_bodyless(head.status) {
            String::new()
        } else if head.chunked {
            String::from_utf8_lossy(&decode_chunked(raw_body)?).into_owned()
        } else {
            let body = match head.content_length {
                Some(length) if raw_body.len() < length => return Err(HttpError::TruncatedBody),
                Some(length) => &raw_body[..length],
                None => raw_body,
            };
            String::from_utf8_lossy(body).into_owned()
        };

        Ok(Self {
            status: head.status,
            body,
        })
    }
}
