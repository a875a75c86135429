//! Orion client: read the relayed identifier, write the verdict back

use std::time::Duration;

use idrelay_core::http::{
    CONTENT_TYPE_JSON, Endpoint, Header, Method, Request, Response, UrlError, message_complete,
};
use idrelay_core::payload::{AccessReply, received_id};
use idrelay_core::transport::{HttpTransport, TransportError};
use log::debug;
use thiserror_no_std::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, lookup_host};
use tokio::time::timeout;

use crate::access::Decision;

const ACCEPT_JSON: Header<'static> = Header::new("Accept", "application/json");
const READ_CHUNK_LEN: usize = 1024;
/// Entities carry a handful of attributes; anything bigger is not ours.
const MAX_RESPONSE_LEN: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum OrionError {
    #[error("invalid Orion URL: {0}")]
    Url(UrlError),
    #[error("Orion unreachable: {0}")]
    Transport(TransportError),
    #[error("Orion answered {0}")]
    Status(u16),
    #[error("unexpected entity document: {0}")]
    Json(serde_json::Error),
}

impl From<UrlError> for OrionError {
    fn from(value: UrlError) -> Self {
        Self::Url(value)
    }
}

impl From<TransportError> for OrionError {
    fn from(value: TransportError) -> Self {
        Self::Transport(value)
    }
}

impl From<serde_json::Error> for OrionError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// HTTP/1.1 over tokio TCP, one connection per request.
pub struct TokioTransport {
    timeout: Duration,
}

impl TokioTransport {
    pub fn new(timeout_ms: u32) -> Self {
        Self {
            timeout: Duration::from_millis(u64::from(timeout_ms)),
        }
    }

    async fn connect(&self, host: &str, port: u16) -> Result<TcpStream, TransportError> {
        let addresses = lookup_host((host, port))
            .await
            .map_err(|_| TransportError::Dns)?;
        for address in addresses {
            match timeout(self.timeout, TcpStream::connect(address)).await {
                Ok(Ok(stream)) => return Ok(stream),
                Ok(Err(e)) => debug!("Connect to {} failed: {}", address, e),
                Err(_) => debug!("Connect to {} timed out", address),
            }
        }
        Err(TransportError::ConnectionRefused)
    }
}

impl HttpTransport for TokioTransport {
    async fn send(&mut self, request: &Request<'_>) -> Result<Response, TransportError> {
        let mut stream = self
            .connect(request.endpoint.host, request.endpoint.port)
            .await?;

        let head = request.encode_head();
        match timeout(self.timeout, stream.write_all(head.as_bytes())).await {
            Ok(Ok(())) => {}
            _ => return Err(TransportError::SendHeaderFailed),
        }
        match timeout(self.timeout, stream.write_all(request.body)).await {
            Ok(Ok(())) => {}
            _ => return Err(TransportError::SendPayloadFailed),
        }

        let mut response = Vec::new();
        let mut chunk = [0u8; READ_CHUNK_LEN];
        loop {
            let read = timeout(self.timeout, stream.read(&mut chunk))
                .await
                .map_err(|_| TransportError::ReadTimeout)?
                .map_err(|_| TransportError::ConnectionLost)?;
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

        Ok(Response::parse(&response)?)
    }
}

pub struct OrionClient<T> {
    entity_url: String,
    attrs_url: String,
    transport: T,
}

impl<T: HttpTransport> OrionClient<T> {
    /// Both the entity URL and its `/attrs` URL are checked up front.
    pub fn new(entity_url: &str, transport: T) -> Result<Self, UrlError> {
        let entity_url = entity_url.trim_end_matches('/').to_owned();
        let attrs_url = format!("{entity_url}/attrs");
        Endpoint::parse(&entity_url)?;
        Endpoint::parse(&attrs_url)?;
        Ok(Self {
            entity_url,
            attrs_url,
            transport,
        })
    }

    pub fn entity_url(&self) -> &str {
        &self.entity_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Current value of the entity's `idRecebido` attribute.
    pub async fn fetch_received_id(&mut self) -> Result<Option<String>, OrionError> {
        let endpoint = Endpoint::parse(&self.entity_url)?;
        let request = Request {
            method: Method::Get,
            endpoint: &endpoint,
            headers: &[ACCEPT_JSON],
            body: &[],
        };
        let response = self.transport.send(&request).await?;
        if response.status != 200 {
            return Err(OrionError::Status(response.status));
        }
        Ok(received_id(response.body.as_bytes())?)
    }

    /// PATCH the verdict onto the entity. Returns the (2xx) status.
    pub async fn report(&mut self, decision: &Decision) -> Result<u16, OrionError> {
        let body = AccessReply::new(
            decision.status.as_str(),
            &decision.name,
            &decision.department,
        )
        .to_json()?;
        let endpoint = Endpoint::parse(&self.attrs_url)?;
        let request = Request {
            method: Method::Patch,
            endpoint: &endpoint,
            headers: &[CONTENT_TYPE_JSON],
            body: &body,
        };
        let response = self.transport.send(&request).await?;
        match response.status {
            200 | 204 => Ok(response.status),
            other => Err(OrionError::Status(other)),
        }
    }
}
