//! Process-wide configuration
//!
//! A single [`Config`] value is built at startup and handed by reference to
//! every component that needs it. It is never mutated afterwards.

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::http::{Endpoint, UrlError};

pub const DEFAULT_WIFI_SSID: &str = "Wokwi-GUEST";
pub const DEFAULT_WIFI_PASSWORD: &str = "";
pub const DEFAULT_ORION_URL: &str = "http://130.131.19.158:1026/v2/entities/TesteESP32/attrs";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Config<'a> {
    #[serde(borrow)]
    pub wifi: WifiConfig<'a>,
    #[serde(borrow)]
    pub orion: OrionConfig<'a>,
    pub serial: SerialConfig,
    pub display: DisplayConfig,
    pub association: AssociationPolicy,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct WifiConfig<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct OrionConfig<'a> {
    /// Full `http://` URL of the entity attributes resource
    pub url: &'a str,
    /// Upper bound for one request/response exchange
    pub http_timeout_ms: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct SerialConfig {
    pub baud_rate: u32,
    /// Pause between two polls of the serial input
    pub poll_interval_ms: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    pub i2c_address: u8,
    pub columns: u8,
    pub rows: u8,
}

/// How long boot waits for the WiFi association
///
/// `max_attempts: None` waits forever, which is how the device historically
/// behaved. `Some(n)` gives up after `n` polls.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct AssociationPolicy {
    pub poll_interval_ms: u32,
    pub max_attempts: Option<u32>,
}

impl Default for WifiConfig<'_> {
    fn default() -> Self {
        Self {
            ssid: DEFAULT_WIFI_SSID,
            password: DEFAULT_WIFI_PASSWORD,
        }
    }
}

impl Default for OrionConfig<'_> {
    fn default() -> Self {
        Self {
            url: DEFAULT_ORION_URL,
            http_timeout_ms: 5_000,
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            poll_interval_ms: 10,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            i2c_address: 0x27,
            columns: 16,
            rows: 2,
        }
    }
}

impl Default for AssociationPolicy {
    fn default() -> Self {
        Self {
            poll_interval_ms: 300,
            // 300 ms * 200 = one minute
            max_attempts: Some(200),
        }
    }
}

impl AssociationPolicy {
    /// Poll until connected with no upper bound.
    pub const fn unbounded(poll_interval_ms: u32) -> Self {
        Self {
            poll_interval_ms,
            max_attempts: None,
        }
    }
}

impl Default for Config<'_> {
    fn default() -> Self {
        Self {
            wifi: WifiConfig::default(),
            orion: OrionConfig::default(),
            serial: SerialConfig::default(),
            display: DisplayConfig::default(),
            association: AssociationPolicy::default(),
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid Orion URL: {0}")]
    Url(UrlError),
    #[error("config parse error at line {line}, column {column}")]
    Parse { line: usize, column: usize },
}

impl From<UrlError> for ConfigError {
    fn from(value: UrlError) -> Self {
        Self::Url(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse {
            line: value.line(),
            column: value.column(),
        }
    }
}

impl<'a> Config<'a> {
    /// Parse a JSON document. Missing sections fall back to their defaults.
    ///
    /// Strings are borrowed from `json`, so they must not contain escape
    /// sequences.
    pub fn from_json(json: &'a str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parsed Orion endpoint.
    pub fn orion_endpoint(&self) -> Result<Endpoint<'a>, ConfigError> {
        Ok(Endpoint::parse(self.orion.url)?)
    }
}
