//! Orion polling loop

use std::time::Duration;

use idrelay_core::transport::HttpTransport;
use log::{info, warn};

use crate::access::{AccessStatus, Decision, local_timestamp};
use crate::orion::OrionClient;
use crate::state::GateState;

/// Watches `idRecebido` and answers every new identifier once.
///
/// An identifier equal to the previous one is not a new attempt: the relay
/// overwrites the attribute, so a repeat cannot be told apart from the old
/// value still sitting there.
pub struct Monitor<T> {
    client: OrionClient<T>,
    state: GateState,
    interval: Duration,
    last_seen: Option<String>,
}

impl<T: HttpTransport> Monitor<T> {
    pub fn new(client: OrionClient<T>, state: GateState, interval: Duration) -> Self {
        Self {
            client,
            state,
            interval,
            last_seen: None,
        }
    }

    pub fn client(&self) -> &OrionClient<T> {
        &self.client
    }

    /// One poll. Returns the decision when a new identifier was processed.
    pub async fn tick(&mut self) -> Option<Decision> {
        let id = match self.client.fetch_received_id().await {
            Ok(Some(id)) => id,
            Ok(None) => return None,
            Err(e) => {
                warn!("Polling {} failed: {}", self.client.entity_url(), e);
                return None;
            }
        };
        if self.last_seen.as_deref() == Some(id.as_str()) {
            return None;
        }
        self.last_seen = Some(id.clone());

        let decision = self.state.record(&id, local_timestamp()).await;
        match decision.status {
            AccessStatus::Granted => info!(
                "Access granted to {} ({}, {}) at {}",
                decision.id, decision.name, decision.department, decision.timestamp
            ),
            AccessStatus::Denied => warn!(
                "Access denied to {} at {}: not authorized",
                decision.id, decision.timestamp
            ),
        }

        match self.client.report(&decision).await {
            Ok(status) => info!("Verdict {} sent to Orion ({})", decision.status.as_str(), status),
            Err(e) => warn!("Sending verdict to Orion failed: {}", e),
        }
        Some(decision)
    }

    /// Poll forever.
    pub async fn run(&mut self) {
        info!("Monitoring {}", self.client.entity_url());
        loop {
            self.tick().await;
            tokio::time::sleep(self.interval).await;
        }
    }
}
