//! A Rust library for supervising a station-mode Wi-Fi connection on a
//! constrained device.
//!
//! The crate owns the connection state machine and nothing else. The radio
//! driver, network stack and persistent storage are supplied by the platform
//! through the traits in [`platform`]; credentials come from
//! [`StationConfig`].
//!
//! - Starting station mode and requesting a connection
//! - Reconnecting automatically after a link loss, within a retry budget
//! - Reporting `Connecting`, `Connected`, `Disconnected` and `Failed` to a
//!   single callback
//!
//! # Example
//!
//! ```ignore
//! use wifi_sta::{Platform, Station, StationConfig};
//!
//! # async fn example(platform: Platform) -> wifi_sta::Result<()> {
//! let config = StationConfig::new()
//!     .with_ssid("MyNetwork")
//!     .with_password("password123");
//!
//! let station = Station::init(platform, config, |state| {
//!     println!("Wi-Fi is {state}");
//! })?;
//! # Ok(())
//! # }
//! ```
//!
//! # Event Handoff
//!
//! The platform delivers raw link and address events to an
//! [`EventAdapter`], possibly from interrupt context. The adapter only sets
//! bits in a shared [`SignalGroup`] and posts a wake; it never blocks, logs
//! or calls back into application code. A background supervisor task drains
//! the bits, resolves them to one [`ConnectionState`] per iteration and
//! invokes the callback on its own task, never concurrently with itself.
//!
//! # Error Handling
//!
//! [`Station::init`] returns `Result<Station, ConnectionError>`. Every
//! bring-up failure is fatal to initialization. Once running, link problems
//! are not errors: they show up as `Disconnected` and `Failed`
//! notifications.
//!
//! # Logging
//!
//! This crate uses the [`log`](https://docs.rs/log) facade for logging. To see
//! log output, add a logging implementation like `env_logger`.

mod adapter;
mod constants;
mod models;
mod signals;
mod station;
mod supervisor;

pub mod platform;

pub use adapter::EventAdapter;
pub use models::{ConnectionError, ConnectionState, StationConfig, WakeCondition};
pub use platform::{
    EventFilter, IpEvent, NetStack, PersistentStorage, Platform, PlatformError, RawEvent,
    StorageError, WifiDriver, WifiEvent,
};
pub use signals::{SignalGroup, SignalSet};
pub use station::Station;
pub use supervisor::resolve;

/// A specialized `Result` type for station operations.
pub type Result<T> = std::result::Result<T, ConnectionError>;
