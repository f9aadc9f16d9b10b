//! Platform collaborators.
//!
//! The radio driver, the network stack and persistent storage are provided by
//! the target platform. This module defines the traits a platform implements
//! and the raw events it feeds back into the [`EventAdapter`].

use std::net::Ipv4Addr;
use std::sync::Arc;
use thiserror::Error;

use crate::adapter::EventAdapter;

/// A raw error reported by a platform call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{context} (code {code:#x})")]
pub struct PlatformError {
    /// Platform-specific error code.
    pub code: i32,
    /// What the platform was doing when it failed.
    pub context: String,
}

impl PlatformError {
    pub fn new(code: i32, context: impl Into<String>) -> Self {
        Self {
            code,
            context: context.into(),
        }
    }
}

/// Persistent storage failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The storage partition is full or truncated. Recoverable by erasing
    /// and initializing again.
    #[error("storage partition has no free pages")]
    NoFreePages,

    /// Any other storage failure.
    #[error("{0}")]
    Platform(PlatformError),
}

/// Link-layer events emitted by the radio driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiEvent {
    /// Station mode has started.
    StaStart,
    /// The station lost (or failed to establish) its association.
    StaDisconnected {
        /// Driver reason code.
        reason: u8,
    },
    /// Any other link-layer event id.
    Other(i32),
}

/// IP-layer events emitted by the network stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpEvent {
    /// The station interface acquired an IPv4 address.
    StaGotIp { ip: Ipv4Addr },
    /// Any other IP-layer event id.
    Other(i32),
}

/// An event as delivered by the platform's event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEvent {
    Wifi(WifiEvent),
    Ip(IpEvent),
}

/// Registration key for event handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventFilter {
    /// Every link-layer event, whatever its subtype.
    AnyWifi,
    /// Only the station "address acquired" IP event.
    StaGotIp,
}

impl EventFilter {
    /// Returns whether this registration should receive `event`.
    pub fn matches(&self, event: &RawEvent) -> bool {
        match self {
            Self::AnyWifi => matches!(event, RawEvent::Wifi(_)),
            Self::StaGotIp => matches!(event, RawEvent::Ip(IpEvent::StaGotIp { .. })),
        }
    }
}

/// Key-value storage used by the radio for calibration data.
pub trait PersistentStorage: Send + Sync {
    /// Initializes the storage partition.
    fn init(&self) -> Result<(), StorageError>;

    /// Erases the storage partition so it can be initialized from scratch.
    fn erase(&self) -> Result<(), StorageError>;
}

/// Network interface and event loop bring-up.
pub trait NetStack: Send + Sync {
    fn init_netif(&self) -> Result<(), PlatformError>;

    fn create_default_event_loop(&self) -> Result<(), PlatformError>;

    fn create_default_sta_netif(&self) -> Result<(), PlatformError>;

    /// Registers `adapter` to receive every raw event matching `filter`.
    ///
    /// The platform may invoke the adapter from interrupt-class context.
    fn register_handler(
        &self,
        filter: EventFilter,
        adapter: Arc<EventAdapter>,
    ) -> Result<(), PlatformError>;

    fn unregister_handler(&self, filter: EventFilter) -> Result<(), PlatformError>;
}

/// The station-mode radio driver.
pub trait WifiDriver: Send + Sync {
    fn init(&self) -> Result<(), PlatformError>;

    fn set_mode_station(&self) -> Result<(), PlatformError>;

    fn set_station_config(&self, ssid: &str, password: &str) -> Result<(), PlatformError>;

    /// Starts the radio. The driver reports completion with
    /// [`WifiEvent::StaStart`].
    fn start(&self) -> Result<(), PlatformError>;

    fn stop(&self) -> Result<(), PlatformError>;

    /// Asks the driver to associate. Fire-and-forget: the outcome arrives
    /// later as a raw event. Must be callable from interrupt context.
    fn request_connect(&self);
}

/// The platform collaborators a station is built on.
#[derive(Clone)]
pub struct Platform {
    pub storage: Arc<dyn PersistentStorage>,
    pub net: Arc<dyn NetStack>,
    pub driver: Arc<dyn WifiDriver>,
}

impl Platform {
    pub fn new(
        storage: Arc<dyn PersistentStorage>,
        net: Arc<dyn NetStack>,
        driver: Arc<dyn WifiDriver>,
    ) -> Self {
        Self {
            storage,
            net,
            driver,
        }
    }
}
