//! State shared by the Orion monitor and the API handlers

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::access::{AccessLog, Decision};
use crate::registry::Registry;

#[derive(Clone)]
pub struct GateState {
    log: Arc<RwLock<AccessLog>>,
    registry: Arc<Registry>,
    recent_limit: usize,
}

impl GateState {
    pub fn new(registry: Registry, recent_limit: usize) -> Self {
        Self {
            log: Arc::new(RwLock::new(AccessLog::new())),
            registry: Arc::new(registry),
            recent_limit,
        }
    }

    pub fn log(&self) -> &RwLock<AccessLog> {
        &self.log
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn recent_limit(&self) -> usize {
        self.recent_limit
    }

    /// Decide on `id` and log the attempt.
    pub async fn record(&self, id: &str, timestamp: String) -> Decision {
        self.log
            .write()
            .await
            .decide(id, &self.registry, timestamp)
    }
}
