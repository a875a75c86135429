//! Orion submission routine
//!
//! One identifier, at most one `PATCH`. Every outcome is reported on the
//! diagnostic channel; nothing is propagated to the caller as an error.

use alloc::format;

use log::{info, warn};

use crate::association::Connectivity;
use crate::console::{Console, say};
use crate::http::{CONTENT_TYPE_JSON, Endpoint, Method, Request};
use crate::identifier::Identifier;
use crate::payload::IdUpdate;
use crate::transport::{HttpTransport, SubmissionResult, TransportError};

pub const FAILURE_MESSAGE: &str = "Failed to send to FIWARE";
pub const NOT_CONNECTED_MESSAGE: &str = "WiFi not connected, ID not sent";

pub struct Submitter<'a, T> {
    endpoint: Endpoint<'a>,
    transport: T,
}

impl<'a, T: HttpTransport> Submitter<'a, T> {
    pub const fn new(endpoint: Endpoint<'a>, transport: T) -> Self {
        Self {
            endpoint,
            transport,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `identifier` to Orion and report the outcome on `console`.
    ///
    /// Returns `None` when the network was down and nothing was sent.
    pub async fn submit<L, C>(
        &mut self,
        identifier: &Identifier,
        link: &mut L,
        console: &mut C,
    ) -> Option<SubmissionResult>
    where
        L: Connectivity,
        C: Console,
    {
        if !link.is_connected() {
            warn!("WiFi down, not sending \"{}\"", identifier);
            say(console, NOT_CONNECTED_MESSAGE);
            return None;
        }

        let result = self.exchange(identifier).await;

        say(console, &format!("Status Orion: {}", result.status));
        match &result.body {
            Some(body) if result.responded() => say(console, body),
            _ => say(console, FAILURE_MESSAGE),
        }

        if result.is_success() {
            info!("Orion accepted \"{}\" ({})", identifier, result.status);
        } else if result.responded() {
            warn!("Orion rejected \"{}\" ({})", identifier, result.status);
        } else {
            warn!("Sending \"{}\" failed ({})", identifier, result.status);
        }

        Some(result)
    }

    async fn exchange(&mut self, identifier: &Identifier) -> SubmissionResult {
        let body = match IdUpdate::new(identifier).to_json() {
            Ok(body) => body,
            Err(e) => {
                warn!("Payload encoding failed: {}", e);
                return SubmissionResult::failed(TransportError::Encoding);
            }
        };

        let request = Request {
            method: Method::Patch,
            endpoint: &self.endpoint,
            headers: &[CONTENT_TYPE_JSON],
            body: &body,
        };

        self.transport.send(&request).await.into()
    }
}
