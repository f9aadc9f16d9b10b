//! An in-process platform that fakes the radio, network stack and storage.
//!
//! Events are not generated on their own: the simulator script decides when
//! the station starts, loses its link or acquires an address.

use log::debug;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use wifi_sta::{
    EventAdapter, EventFilter, IpEvent, NetStack, PersistentStorage, Platform, PlatformError,
    RawEvent, StorageError, WifiDriver, WifiEvent,
};

/// Driver reason code reported for scripted disconnects (no AP found).
const REASON_NO_AP_FOUND: u8 = 201;
const ESP_FAIL: i32 = -1;

/// How the simulated storage partition behaves on init.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Healthy,
    /// Reports no free pages until erased.
    Full,
    /// Fails every init.
    Broken,
}

/// A scripted raw event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ScriptEvent {
    Start,
    Disconnect,
    GotIp,
}

impl ScriptEvent {
    pub fn to_raw(self, lease: u8) -> RawEvent {
        match self {
            Self::Start => RawEvent::Wifi(WifiEvent::StaStart),
            Self::Disconnect => RawEvent::Wifi(WifiEvent::StaDisconnected {
                reason: REASON_NO_AP_FOUND,
            }),
            Self::GotIp => RawEvent::Ip(IpEvent::StaGotIp {
                ip: Ipv4Addr::new(192, 168, 4, lease),
            }),
        }
    }
}

pub struct SimPlatform {
    storage: StorageMode,
    erased: AtomicBool,
    handlers: Mutex<Vec<(EventFilter, Arc<EventAdapter>)>>,
    connects: AtomicU32,
}

impl SimPlatform {
    pub fn new(storage: StorageMode) -> Arc<Self> {
        Arc::new(Self {
            storage,
            erased: AtomicBool::new(false),
            handlers: Mutex::new(Vec::new()),
            connects: AtomicU32::new(0),
        })
    }

    pub fn platform(self: &Arc<Self>) -> Platform {
        Platform::new(self.clone(), self.clone(), self.clone())
    }

    /// Delivers `event` to the adapters registered for it, the way the
    /// platform's event loop would.
    pub fn emit(&self, event: RawEvent) {
        let targets: Vec<Arc<EventAdapter>> = match self.handlers.lock() {
            Ok(handlers) => handlers
                .iter()
                .filter(|(filter, _)| filter.matches(&event))
                .map(|(_, adapter)| Arc::clone(adapter))
                .collect(),
            Err(_) => return,
        };
        for adapter in targets {
            adapter.handle(&event);
        }
    }

    pub fn connect_requests(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }
}

impl PersistentStorage for SimPlatform {
    fn init(&self) -> Result<(), StorageError> {
        match self.storage {
            StorageMode::Healthy => Ok(()),
            StorageMode::Full if self.erased.load(Ordering::SeqCst) => Ok(()),
            StorageMode::Full => Err(StorageError::NoFreePages),
            StorageMode::Broken => Err(StorageError::Platform(PlatformError::new(
                ESP_FAIL,
                "storage partition not found",
            ))),
        }
    }

    fn erase(&self) -> Result<(), StorageError> {
        debug!("sim: erasing storage");
        self.erased.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl NetStack for SimPlatform {
    fn init_netif(&self) -> Result<(), PlatformError> {
        Ok(())
    }

    fn create_default_event_loop(&self) -> Result<(), PlatformError> {
        Ok(())
    }

    fn create_default_sta_netif(&self) -> Result<(), PlatformError> {
        Ok(())
    }

    fn register_handler(
        &self,
        filter: EventFilter,
        adapter: Arc<EventAdapter>,
    ) -> Result<(), PlatformError> {
        let mut handlers = self
            .handlers
            .lock()
            .map_err(|_| PlatformError::new(ESP_FAIL, "handler table poisoned"))?;
        handlers.push((filter, adapter));
        Ok(())
    }

    fn unregister_handler(&self, filter: EventFilter) -> Result<(), PlatformError> {
        let mut handlers = self
            .handlers
            .lock()
            .map_err(|_| PlatformError::new(ESP_FAIL, "handler table poisoned"))?;
        handlers.retain(|(registered, _)| *registered != filter);
        Ok(())
    }
}

impl WifiDriver for SimPlatform {
    fn init(&self) -> Result<(), PlatformError> {
        Ok(())
    }

    fn set_mode_station(&self) -> Result<(), PlatformError> {
        Ok(())
    }

    fn set_station_config(&self, ssid: &str, _password: &str) -> Result<(), PlatformError> {
        debug!("sim: station config set for '{ssid}'");
        Ok(())
    }

    fn start(&self) -> Result<(), PlatformError> {
        Ok(())
    }

    fn stop(&self) -> Result<(), PlatformError> {
        Ok(())
    }

    fn request_connect(&self) {
        self.connects.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wifi_sta::{ConnectionError, Station, StationConfig};

    #[tokio::test]
    async fn full_storage_is_recovered() {
        let sim = SimPlatform::new(StorageMode::Full);
        let station = Station::init(sim.platform(), StationConfig::default(), |_| {}).unwrap();
        assert!(sim.erased.load(Ordering::SeqCst));
        station.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn broken_storage_aborts() {
        let sim = SimPlatform::new(StorageMode::Broken);
        let result = Station::init(sim.platform(), StationConfig::default(), |_| {});
        assert!(matches!(result, Err(ConnectionError::Storage(_))));
        assert!(sim.handlers.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn scripted_events_reach_adapter() {
        let sim = SimPlatform::new(StorageMode::Healthy);
        let station = Station::init(sim.platform(), StationConfig::default(), |_| {}).unwrap();

        sim.emit(ScriptEvent::Start.to_raw(2));
        sim.emit(ScriptEvent::Disconnect.to_raw(2));
        assert_eq!(sim.connect_requests(), 2);
        assert_eq!(station.adapter().retry_count(), 1);

        sim.emit(ScriptEvent::GotIp.to_raw(2));
        assert_eq!(station.adapter().retry_count(), 0);

        station.shutdown().await.unwrap();
        assert!(sim.handlers.lock().unwrap().is_empty());
    }
}
