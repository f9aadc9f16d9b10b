use std::fmt::{Display, Formatter};
use thiserror::Error;

use crate::constants::{defaults, env, limits};
use crate::platform::{PlatformError, StorageError};

/// Station connection state as seen by the notification consumer.
///
/// Exactly one value is current at any instant. It is delivered through the
/// callback passed to [`Station::init`](crate::Station::init), never polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// A connection attempt has been requested from the driver.
    Connecting,
    /// The station is associated and has acquired an address.
    Connected,
    /// The link was lost; a reconnect may be in progress.
    Disconnected,
    /// The retry budget is exhausted for the current attempt cycle.
    Failed,
}

impl Display for ConnectionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Which pending signals wake the supervisor.
///
/// `Terminal` waits only for the two signals that end an attempt (address
/// acquired, retries exhausted); link-loss and connect requests are then
/// observed only when they coincide with one of those. `AnySignal` wakes on
/// every pending signal so disconnects are reported as they happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WakeCondition {
    /// Wake only on address-acquired or retries-exhausted.
    Terminal,
    /// Wake on any pending signal.
    #[default]
    AnySignal,
}

/// Station-mode configuration.
///
/// Every field has a default, so the common case is
/// `StationConfig::default().with_ssid(..).with_password(..)`.
///
/// # Example
///
/// ```rust
/// use wifi_sta::StationConfig;
///
/// let config = StationConfig::new()
///     .with_ssid("HomeWiFi")
///     .with_password("hunter22")
///     .with_max_retries(5);
///
/// assert_eq!(config.max_retries, 5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationConfig {
    /// Network name to join.
    pub ssid: String,
    /// Network secret.
    pub password: String,
    /// Automatic reconnects allowed after a link loss before giving up.
    pub max_retries: u32,
    /// Supervisor wake policy.
    pub wake_on: WakeCondition,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            ssid: defaults::SSID.to_string(),
            password: defaults::PASSWORD.to_string(),
            max_retries: defaults::MAX_RETRIES,
            wake_on: WakeCondition::default(),
        }
    }
}

impl StationConfig {
    /// Creates a config populated with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a config from the defaults overlaid with `WIFI_SSID`,
    /// `WIFI_PASSWORD` and `WIFI_MAX_RETRIES` when they are set.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `WIFI_MAX_RETRIES` is not a non-negative
    /// integer.
    pub fn from_env() -> crate::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(ssid) = lookup(env::SSID) {
            config.ssid = ssid;
        }
        if let Some(password) = lookup(env::PASSWORD) {
            config.password = password;
        }
        if let Some(raw) = lookup(env::MAX_RETRIES) {
            config.max_retries = raw.trim().parse().map_err(|_| {
                ConnectionError::InvalidConfig(format!(
                    "{} must be a non-negative integer, got '{raw}'",
                    env::MAX_RETRIES
                ))
            })?;
        }
        Ok(config)
    }

    pub fn with_ssid(mut self, ssid: impl Into<String>) -> Self {
        self.ssid = ssid.into();
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_wake_on(mut self, wake_on: WakeCondition) -> Self {
        self.wake_on = wake_on;
        self
    }

    /// Checks the credentials fit the platform's station config fields.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an empty SSID, an SSID longer than 32
    /// bytes, or a password longer than 64 bytes.
    pub fn validate(&self) -> crate::Result<()> {
        if self.ssid.is_empty() {
            return Err(ConnectionError::InvalidConfig("SSID is empty".into()));
        }
        if self.ssid.len() > limits::SSID_MAX_LEN {
            return Err(ConnectionError::InvalidConfig(format!(
                "SSID is {} bytes, limit is {}",
                self.ssid.len(),
                limits::SSID_MAX_LEN
            )));
        }
        if self.password.len() > limits::PASSWORD_MAX_LEN {
            return Err(ConnectionError::InvalidConfig(format!(
                "password is {} bytes, limit is {}",
                self.password.len(),
                limits::PASSWORD_MAX_LEN
            )));
        }
        Ok(())
    }
}

/// Errors that can occur while bringing the station up or tearing it down.
///
/// Everything here is fatal to [`Station::init`](crate::Station::init):
/// runtime link problems are reported through [`ConnectionState`] instead.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The station configuration was rejected before touching the platform.
    #[error("invalid station config: {0}")]
    InvalidConfig(String),

    /// Persistent storage could not be initialized, even after a reinit.
    #[error("storage init failed: {0}")]
    Storage(#[from] StorageError),

    /// No tokio runtime was available to host the supervisor task.
    #[error("no tokio runtime available for the supervisor task")]
    NoRuntime,

    /// Network interface bring-up failed.
    #[error("network interface init failed: {0}")]
    Netif(PlatformError),

    /// The default event loop could not be created.
    #[error("event loop init failed: {0}")]
    EventLoop(PlatformError),

    /// The radio driver rejected an init, mode, config, start or stop call.
    #[error("Wi-Fi driver error: {0}")]
    Driver(PlatformError),

    /// Registering or unregistering the event adapter failed.
    #[error("event handler registration failed: {0}")]
    HandlerRegistration(PlatformError),

    /// The supervisor task panicked or was cancelled.
    #[error("supervisor task failed: {0}")]
    SupervisorJoin(String),
}
