//! Bakes deployment settings from `.env` (or the build environment) into the
//! firmware image.

const KEYS: [&str; 4] = [
    "IDRELAY_WIFI_SSID",
    "IDRELAY_WIFI_PASSWORD",
    "IDRELAY_ORION_URL",
    "IDRELAY_WIFI_MAX_ATTEMPTS",
];

fn main() {
    println!("cargo:rustc-link-arg=-Tlinkall.x");
    println!("cargo:rerun-if-changed=.env");
    for key in KEYS {
        println!("cargo:rerun-if-env-changed={key}");
    }

    // A missing .env is fine: unset keys fall back to the built-in defaults
    let _ = dotenvy::dotenv();

    for key in KEYS {
        if let Ok(value) = std::env::var(key) {
            println!("cargo:rustc-env={key}={value}");
        }
    }
}
