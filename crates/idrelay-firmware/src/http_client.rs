//! HTTP/1.1 over embassy-net TCP
//!
//! One connection per request, closed before `send` returns. Request
//! encoding and response parsing come from `idrelay_core::http`.

use alloc::vec::Vec;
use core::net::Ipv4Addr;

use embassy_net::dns::DnsQueryType;
use embassy_net::tcp::{ConnectError, TcpSocket};
use embassy_net::{IpAddress, Stack};
use embassy_time::{Duration, with_timeout};
use idrelay_core::http::{Request, Response, message_complete};
use idrelay_core::transport::{HttpTransport, TransportError};
use log::{debug, warn};

const RX_BUFFER_LEN: usize = 1024;
const TX_BUFFER_LEN: usize = 1024;
const READ_CHUNK_LEN: usize = 256;
/// Context broker replies to an attribute PATCH are empty or a short error
/// document.
const MAX_RESPONSE_LEN: usize = 2048;

pub struct TcpHttpTransport {
    stack: Stack<'static>,
    timeout: Duration,
}

impl TcpHttpTransport {
    pub const fn new(stack: Stack<'static>, timeout_ms: u32) -> Self {
        Self {
            stack,
            timeout: Duration::from_millis(timeout_ms as u64),
        }
    }

    async fn resolve(&self, host: &str) -> Result<IpAddress, TransportError> {
        if let Ok(address) = host.parse::<Ipv4Addr>() {
            return Ok(IpAddress::Ipv4(address));
        }
        let addresses = self
            .stack
            .dns_query(host, DnsQueryType::A)
            .await
            .map_err(|e| {
                warn!("DNS lookup for {} failed: {:?}", host, e);
                TransportError::Dns
            })?;
        addresses.first().copied().ok_or(TransportError::Dns)
    }

    async fn exchange(
        &self,
        socket: &mut TcpSocket<'_>,
        request: &Request<'_>,
    ) -> Result<Vec<u8>, TransportError> {
        let address = self.resolve(request.endpoint.host).await?;
        debug!("Connecting to {}:{}", address, request.endpoint.port);

        with_timeout(self.timeout, socket.connect((address, request.endpoint.port)))
            .await
            .map_err(|_| TransportError::ConnectionRefused)?
            .map_err(|e| match e {
                ConnectError::InvalidState => TransportError::ConnectionLost,
                _ => TransportError::ConnectionRefused,
            })?;

        let head = request.encode_head();
        write_all(socket, head.as_bytes(), self.timeout)
            .await
            .map_err(|_| TransportError::SendHeaderFailed)?;
        write_all(socket, request.body, self.timeout)
            .await
            .map_err(|_| TransportError::SendPayloadFailed)?;

        let mut response = Vec::new();
        let mut chunk = [0u8; READ_CHUNK_LEN];
        loop {
            let read = with_timeout(self.timeout, socket.read(&mut chunk))
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
        Ok(response)
    }
}

async fn write_all(
    socket: &mut TcpSocket<'_>,
    mut bytes: &[u8],
    timeout: Duration,
) -> Result<(), ()> {
    while !bytes.is_empty() {
        match with_timeout(timeout, socket.write(bytes)).await {
            Ok(Ok(0)) | Ok(Err(_)) | Err(_) => return Err(()),
            Ok(Ok(written)) => bytes = &bytes[written..],
        }
    }
    match with_timeout(timeout, socket.flush()).await {
        Ok(Ok(())) => Ok(()),
        _ => Err(()),
    }
}

impl HttpTransport for TcpHttpTransport {
    async fn send(&mut self, request: &Request<'_>) -> Result<Response, TransportError> {
        if !(self.stack.is_link_up() && self.stack.is_config_up()) {
            return Err(TransportError::NotConnected);
        }

        let mut rx_buffer = [0u8; RX_BUFFER_LEN];
        let mut tx_buffer = [0u8; TX_BUFFER_LEN];
        let mut socket = TcpSocket::new(self.stack, &mut rx_buffer, &mut tx_buffer);
        socket.set_timeout(Some(self.timeout));

        let result = self.exchange(&mut socket, request).await;

        // Release the connection on every path
        socket.close();
        if with_timeout(Duration::from_millis(500), socket.flush())
            .await
            .is_err()
        {
            socket.abort();
        }

        let bytes = result?;
        Response::parse(&bytes).map_err(|e| {
            warn!("Unusable response ({} bytes): {:?}", bytes.len(), e);
            TransportError::from(e)
        })
    }
}
