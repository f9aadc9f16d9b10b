//! Station bring-up and teardown.
//!
//! [`Station::init`] brings the platform up in a fixed order, wires the event
//! adapter into the platform's event loop and spawns the supervisor task.
//! Any failure along the way aborts initialization: nothing is spawned and
//! the callback is never invoked.

use log::{debug, warn};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::Result;
use crate::adapter::EventAdapter;
use crate::models::{ConnectionError, ConnectionState, StationConfig};
use crate::platform::{EventFilter, PersistentStorage, Platform, StorageError};
use crate::signals::{SignalGroup, SignalSet};
use crate::supervisor::{Callback, Supervisor};

/// Event registrations made by `init` and removed by `shutdown`.
const HANDLER_FILTERS: [EventFilter; 2] = [EventFilter::AnyWifi, EventFilter::StaGotIp];

/// A running station-mode connection subsystem.
///
/// Holds the shared signal group, the registered event adapter and the
/// supervisor task. Dropping the handle leaves the supervisor running for the
/// rest of the process; call [`shutdown`](Station::shutdown) to stop it.
///
/// # Example
///
/// ```ignore
/// use wifi_sta::{Platform, Station, StationConfig};
///
/// # async fn example(platform: Platform) -> wifi_sta::Result<()> {
/// let config = StationConfig::from_env()?;
/// let station = Station::init(platform, config, |state| {
///     println!("wifi: {state}");
/// })?;
///
/// // ... later
/// station.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct Station {
    config: StationConfig,
    platform: Platform,
    signals: Arc<SignalGroup>,
    adapter: Arc<EventAdapter>,
    task: JoinHandle<()>,
}

impl Station {
    /// Brings up storage, the network stack and the radio, then starts the
    /// supervisor.
    ///
    /// Must be called from within a tokio runtime; the supervisor is spawned
    /// onto it. Intended to be called once per process.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if the credentials do not fit the station config
    /// - `Storage` if storage cannot be initialized, even after an erase
    /// - `NoRuntime` if called outside a tokio runtime
    /// - `Netif`, `EventLoop`, `Driver` or `HandlerRegistration` when the
    ///   matching platform call fails
    pub fn init<F>(platform: Platform, config: StationConfig, callback: F) -> Result<Self>
    where
        F: Fn(ConnectionState) + Send + Sync + 'static,
    {
        config.validate()?;
        init_storage(platform.storage.as_ref())?;

        let runtime = Handle::try_current().map_err(|_| ConnectionError::NoRuntime)?;

        platform.net.init_netif().map_err(ConnectionError::Netif)?;
        platform
            .net
            .create_default_event_loop()
            .map_err(ConnectionError::EventLoop)?;
        platform
            .net
            .create_default_sta_netif()
            .map_err(ConnectionError::Netif)?;
        platform.driver.init().map_err(ConnectionError::Driver)?;
        debug!("Network stack and driver initialized");

        let signals = Arc::new(SignalGroup::new());
        let adapter = Arc::new(EventAdapter::new(
            Arc::clone(&signals),
            Arc::clone(&platform.driver),
            config.max_retries,
        ));

        register_handlers(&platform, &adapter)?;

        if let Err(e) = start_driver(&platform, &config) {
            unregister_handlers(&platform);
            return Err(e);
        }
        debug!(
            "Station mode started for '{}' (max retries {})",
            config.ssid, config.max_retries
        );

        let callback: Callback = Arc::new(callback);
        let supervisor = Supervisor::new(
            Arc::clone(&signals),
            callback,
            config.wake_on,
            config.ssid.clone(),
        );
        let task = runtime.spawn(supervisor.run());

        Ok(Self {
            config,
            platform,
            signals,
            adapter,
            task,
        })
    }

    /// The adapter registered with the platform's event loop.
    pub fn adapter(&self) -> &Arc<EventAdapter> {
        &self.adapter
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    /// Signals raised by the adapter and not yet consumed by the supervisor.
    pub fn pending_signals(&self) -> SignalSet {
        self.signals.snapshot()
    }

    /// Stops the subsystem: unregisters the adapter, stops the radio, then
    /// closes the signal group and waits for the supervisor to exit.
    ///
    /// Signals still pending at this point are discarded without a
    /// notification. Every teardown step runs even if an earlier one fails;
    /// the first failure is returned.
    pub async fn shutdown(self) -> Result<()> {
        let mut first_err = None;

        for filter in HANDLER_FILTERS {
            if let Err(e) = self.platform.net.unregister_handler(filter) {
                warn!("Failed to unregister {filter:?} handler: {e}");
                first_err.get_or_insert(ConnectionError::HandlerRegistration(e));
            }
        }
        if let Err(e) = self.platform.driver.stop() {
            warn!("Failed to stop Wi-Fi driver: {e}");
            first_err.get_or_insert(ConnectionError::Driver(e));
        }

        self.signals.close();
        if let Err(e) = self.task.await {
            first_err.get_or_insert(ConnectionError::SupervisorJoin(e.to_string()));
        }
        debug!("Station for '{}' shut down", self.config.ssid);

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Initializes storage, erasing and retrying once when it reports no free
/// pages. Any other failure, or a second failure, is fatal.
fn init_storage(storage: &dyn PersistentStorage) -> Result<()> {
    match storage.init() {
        Ok(()) => Ok(()),
        Err(StorageError::NoFreePages) => {
            warn!("Storage has no free pages, erasing and reinitializing");
            storage.erase()?;
            storage.init()?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn register_handlers(platform: &Platform, adapter: &Arc<EventAdapter>) -> Result<()> {
    for (i, filter) in HANDLER_FILTERS.iter().enumerate() {
        if let Err(e) = platform.net.register_handler(*filter, Arc::clone(adapter)) {
            unregister_filters(platform, &HANDLER_FILTERS[..i]);
            return Err(ConnectionError::HandlerRegistration(e));
        }
        debug!("Registered event adapter for {filter:?}");
    }
    Ok(())
}

fn unregister_handlers(platform: &Platform) {
    unregister_filters(platform, &HANDLER_FILTERS);
}

fn unregister_filters(platform: &Platform, filters: &[EventFilter]) {
    for &filter in filters {
        if let Err(e) = platform.net.unregister_handler(filter) {
            warn!("Failed to unregister {filter:?} handler: {e}");
        }
    }
}

fn start_driver(platform: &Platform, config: &StationConfig) -> Result<()> {
    let driver = &platform.driver;
    driver.set_mode_station().map_err(ConnectionError::Driver)?;
    driver
        .set_station_config(&config.ssid, &config.password)
        .map_err(ConnectionError::Driver)?;
    driver.start().map_err(ConnectionError::Driver)?;
    Ok(())
}
