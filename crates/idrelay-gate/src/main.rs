//! Access-control service for the idrelay identifier relay.
//!
//! Polls the Orion entity the relay writes to, answers each new identifier
//! with an access verdict and serves the attempt log as JSON.
//!
//! # Usage
//!
//! ```text
//! idrelay-gate [CONFIG.json]
//! ```
//!
//! `CONFIG.json` may set `entity_url`, `poll_interval_ms`,
//! `http_timeout_ms`, `listen`, `recent_limit` and `authorized`; missing keys
//! keep their defaults. Set `RUST_LOG=info` to see each decision.

use std::future::IntoFuture;
use std::time::Duration;

use log::{error, info};
use tokio::net::TcpListener;

use idrelay_gate::api;
use idrelay_gate::config::GateConfig;
use idrelay_gate::monitor::Monitor;
use idrelay_gate::orion::{OrionClient, TokioTransport};
use idrelay_gate::state::GateState;

fn load_config() -> GateConfig {
    let Some(path) = std::env::args().nth(1) else {
        return GateConfig::default();
    };
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) => {
            error!("Cannot read {}: {}", path, e);
            std::process::exit(1);
        }
    };
    match GateConfig::from_json(&text) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration in {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let config = load_config();

    info!("Starting idrelay access gate");
    info!("{} authorized IDs:", config.authorized.len());
    for (id, person) in config.authorized.iter() {
        info!("  {}: {} ({})", id, person.name, person.department);
    }

    let state = GateState::new(config.authorized.clone(), config.recent_limit);

    let client = match OrionClient::new(
        &config.entity_url,
        TokioTransport::new(config.http_timeout_ms),
    ) {
        Ok(client) => client,
        Err(e) => {
            error!("Invalid entity URL {}: {}", config.entity_url, e);
            std::process::exit(1);
        }
    };
    let mut monitor = Monitor::new(
        client,
        state.clone(),
        Duration::from_millis(config.poll_interval_ms),
    );

    let listener = match TcpListener::bind(&config.listen).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Cannot listen on {}: {}", config.listen, e);
            std::process::exit(1);
        }
    };
    info!("API listening on http://{}", config.listen);

    // Both halves share this task; neither returns under normal operation
    tokio::select! {
        () = monitor.run() => {}
        result = axum::serve(listener, api::router(state)).into_future() => {
            if let Err(e) = result {
                error!("API server stopped: {}", e);
                std::process::exit(1);
            }
        }
    }
}
