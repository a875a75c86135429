//! Build-time deployment settings
//!
//! `build.rs` exports the `IDRELAY_*` keys found in `.env` or the build
//! environment. Keys that are not set keep the defaults from
//! [`idrelay_core::config::Config`].

use idrelay_core::config::Config;
use log::warn;

pub fn load() -> Config<'static> {
    let mut config = Config::default();

    if let Some(ssid) = option_env!("IDRELAY_WIFI_SSID") {
        config.wifi.ssid = ssid;
    }
    if let Some(password) = option_env!("IDRELAY_WIFI_PASSWORD") {
        config.wifi.password = password;
    }
    if let Some(url) = option_env!("IDRELAY_ORION_URL") {
        config.orion.url = url;
    }
    if let Some(attempts) = option_env!("IDRELAY_WIFI_MAX_ATTEMPTS") {
        match attempts.trim().parse::<u32>() {
            Ok(0) => config.association.max_attempts = None,
            Ok(n) => config.association.max_attempts = Some(n),
            Err(_) => warn!(
                "Ignoring IDRELAY_WIFI_MAX_ATTEMPTS={:?}, not a number",
                attempts
            ),
        }
    }

    config
}
