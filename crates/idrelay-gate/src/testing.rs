//! Scripted Orion for the unit tests

use std::collections::VecDeque;

use idrelay_core::http::{Method, Request, Response};
use idrelay_core::transport::{HttpTransport, TransportError};

#[derive(Debug, Clone)]
pub struct SentRequest {
    pub method: Method,
    pub path: String,
    pub body: String,
}

/// Answers requests from a queue; an empty queue refuses the connection.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: VecDeque<Result<Response, TransportError>>,
    pub requests: Vec<SentRequest>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, status: u16, body: &str) -> Self {
        self.replies.push_back(Ok(Response {
            status,
            body: body.to_owned(),
        }));
        self
    }

    pub fn fail(mut self, error: TransportError) -> Self {
        self.replies.push_back(Err(error));
        self
    }

    pub fn requests_with(&self, method: Method) -> usize {
        self.requests.iter().filter(|r| r.method == method).count()
    }
}

impl HttpTransport for ScriptedTransport {
    async fn send(&mut self, request: &Request<'_>) -> Result<Response, TransportError> {
        self.requests.push(SentRequest {
            method: request.method,
            path: request.endpoint.path.to_owned(),
            body: String::from_utf8_lossy(request.body).into_owned(),
        });
        self.replies
            .pop_front()
            .unwrap_or(Err(TransportError::ConnectionRefused))
    }
}
