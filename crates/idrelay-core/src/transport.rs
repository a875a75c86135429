//! HTTP transport port and the per-submission result

use alloc::string::String;

use thiserror_no_std::Error;

use crate::http::{HttpError, Request, Response};

/// Transport-level failures.
///
/// Each variant maps to the fixed negative status code reported on the
/// diagnostic channel (see [`TransportError::code`]).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection refused")]
    ConnectionRefused,
    #[error("host name lookup failed")]
    Dns,
    #[error("sending request head failed")]
    SendHeaderFailed,
    #[error("sending request body failed")]
    SendPayloadFailed,
    #[error("network not connected")]
    NotConnected,
    #[error("connection lost")]
    ConnectionLost,
    #[error("peer is not an HTTP server")]
    NoHttpServer,
    #[error("response does not fit in memory")]
    OutOfMemory,
    #[error("payload encoding failed")]
    Encoding,
    #[error("read timeout")]
    ReadTimeout,
}

impl TransportError {
    /// Status code reported in place of an HTTP status.
    pub const fn code(self) -> i32 {
        match self {
            Self::ConnectionRefused | Self::Dns => -1,
            Self::SendHeaderFailed => -2,
            Self::SendPayloadFailed => -3,
            Self::NotConnected => -4,
            Self::ConnectionLost => -5,
            Self::NoHttpServer => -7,
            Self::OutOfMemory => -8,
            Self::Encoding => -9,
            Self::ReadTimeout => -11,
        }
    }
}

impl From<HttpError> for TransportError {
    fn from(value: HttpError) -> Self {
        match value {
            HttpError::Incomplete | HttpError::TruncatedBody => Self::ConnectionLost,
            _ => Self::NoHttpServer,
        }
    }
}

/// Blocking (awaited) HTTP exchange against one endpoint.
///
/// Implementations open a fresh connection per call and release it before
/// returning, on every path.
pub trait HttpTransport {
    fn send(
        &mut self,
        request: &Request<'_>,
    ) -> impl Future<Output = Result<Response, TransportError>>;
}

/// Outcome of one submission.
///
/// `status > 0` means the server answered; `status <= 0` is a transport
/// failure and carries no body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    pub status: i32,
    pub body: Option<String>,
}

impl SubmissionResult {
    pub fn failed(error: TransportError) -> Self {
        Self {
            status: error.code(),
            body: None,
        }
    }

    /// The server produced a response, whatever its status.
    pub const fn responded(&self) -> bool {
        self.status > 0
    }

    /// The server accepted the update (2xx).
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

impl From<Result<Response, TransportError>> for SubmissionResult {
    fn from(value: Result<Response, TransportError>) -> Self {
        match value {
            Ok(response) => Self {
                status: i32::from(response.status),
                body: Some(response.body),
            },
            Err(error) => Self::failed(error),
        }
    }
}
