//! Service settings, read from an optional JSON file

use serde::Deserialize;

use crate::registry::Registry;

/// The entity the relay writes to.
pub const DEFAULT_ENTITY_URL: &str = "http://130.131.19.158:1026/v2/entities/TesteESP32";

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct GateConfig {
    /// Orion entity to watch; the verdict goes to `<entity_url>/attrs`.
    pub entity_url: String,
    pub poll_interval_ms: u64,
    pub http_timeout_ms: u32,
    /// Address the JSON API binds to.
    pub listen: String,
    /// Entries returned by the recent-history endpoint.
    pub recent_limit: usize,
    pub authorized: Registry,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            entity_url: DEFAULT_ENTITY_URL.to_owned(),
            poll_interval_ms: 2_000,
            http_timeout_ms: 5_000,
            listen: "0.0.0.0:5000".to_owned(),
            recent_limit: 10,
            authorized: Registry::default(),
        }
    }
}

impl GateConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_keeps_defaults() {
        assert_eq!(GateConfig::from_json("{}").unwrap(), GateConfig::default());
    }

    #[test]
    fn partial_override() {
        let config = GateConfig::from_json(
            r#"{"listen":"127.0.0.1:8080","authorized":{"7":{"nome":"Bia","departamento":"TI"}}}"#,
        )
        .unwrap();
        assert_eq!(config.listen, "127.0.0.1:8080");
        assert_eq!(config.poll_interval_ms, 2_000);
        assert_eq!(config.authorized.len(), 1);
        assert!(config.authorized.lookup("12345").is_none());
    }

    #[test]
    fn wrong_types_are_rejected() {
        assert!(GateConfig::from_json(r#"{"poll_interval_ms":"fast"}"#).is_err());
    }
}
