//! Constants for station configuration defaults and platform limits.
//!
//! These mirror the field sizes and defaults the radio platform expects for
//! station-mode configuration.

/// Default station configuration values.
pub mod defaults {
    pub const SSID: &str = "YOUR_SSID";
    pub const PASSWORD: &str = "WIFI_PASSWORD";
    pub const MAX_RETRIES: u32 = 3;
}

/// Station config field limits (bytes)
pub mod limits {
    pub const SSID_MAX_LEN: usize = 32;
    pub const PASSWORD_MAX_LEN: usize = 64;
}

/// Environment variables read by `StationConfig::from_env`
pub mod env {
    pub const SSID: &str = "WIFI_SSID";
    pub const PASSWORD: &str = "WIFI_PASSWORD";
    pub const MAX_RETRIES: &str = "WIFI_MAX_RETRIES";
}

