//! In-memory platform for driving a station from tests.
//!
//! Records every platform call in order, lets a test script storage and
//! driver failures, and delivers raw events to whichever adapters are
//! currently registered.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use wifi_sta::{
    ConnectionState, EventAdapter, EventFilter, IpEvent, NetStack, PersistentStorage, Platform,
    PlatformError, RawEvent, StorageError, WifiDriver, WifiEvent,
};

pub const START: RawEvent = RawEvent::Wifi(WifiEvent::StaStart);
pub const DISCONNECT: RawEvent = RawEvent::Wifi(WifiEvent::StaDisconnected { reason: 201 });
pub const GOT_IP: RawEvent = RawEvent::Ip(IpEvent::StaGotIp {
    ip: Ipv4Addr::new(192, 168, 1, 42),
});

#[derive(Default)]
pub struct MockPlatform {
    calls: Mutex<Vec<String>>,
    handlers: Mutex<HashMap<EventFilter, Arc<EventAdapter>>>,
    storage_results: Mutex<VecDeque<Result<(), StorageError>>>,
    failing: Mutex<Option<(&'static str, usize)>>,
    connects: AtomicU32,
}

impl MockPlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues results for successive `PersistentStorage::init` calls; once
    /// the queue is empty, init succeeds.
    pub fn with_storage_results(
        self: Arc<Self>,
        results: Vec<Result<(), StorageError>>,
    ) -> Arc<Self> {
        *self.storage_results.lock().unwrap() = results.into();
        self
    }

    /// Makes the named platform call fail.
    pub fn failing_on(self: Arc<Self>, call: &'static str) -> Arc<Self> {
        self.failing_on_after(call, 0)
    }

    /// Lets the named call succeed `skip` times, then fails it.
    pub fn failing_on_after(self: Arc<Self>, call: &'static str, skip: usize) -> Arc<Self> {
        *self.failing.lock().unwrap() = Some((call, skip));
        self
    }

    pub fn platform(self: &Arc<Self>) -> Platform {
        Platform::new(self.clone(), self.clone(), self.clone())
    }

    /// Delivers `event` to every registered adapter whose filter matches.
    pub fn emit(&self, event: RawEvent) {
        let handlers: Vec<_> = self
            .handlers
            .lock()
            .unwrap()
            .iter()
            .filter(|(filter, _)| filter.matches(&event))
            .map(|(_, adapter)| Arc::clone(adapter))
            .collect();
        for adapter in handlers {
            adapter.handle(&event);
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn connect_requests(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn registered(&self) -> Vec<EventFilter> {
        self.handlers.lock().unwrap().keys().copied().collect()
    }

    fn record(&self, call: &'static str) -> Result<(), PlatformError> {
        self.calls.lock().unwrap().push(call.to_string());
        match self.failing.lock().unwrap().as_mut() {
            Some((failing, 0)) if *failing == call => Err(PlatformError::new(-1, call)),
            Some((failing, skip)) if *failing == call => {
                *skip -= 1;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl PersistentStorage for MockPlatform {
    fn init(&self) -> Result<(), StorageError> {
        self.calls.lock().unwrap().push("storage.init".into());
        self.storage_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }

    fn erase(&self) -> Result<(), StorageError> {
        self.record("storage.erase").map_err(StorageError::Platform)
    }
}

impl NetStack for MockPlatform {
    fn init_netif(&self) -> Result<(), PlatformError> {
        self.record("netif.init")
    }

    fn create_default_event_loop(&self) -> Result<(), PlatformError> {
        self.record("event_loop.create")
    }

    fn create_default_sta_netif(&self) -> Result<(), PlatformError> {
        self.record("netif.create_sta")
    }

    fn register_handler(
        &self,
        filter: EventFilter,
        adapter: Arc<EventAdapter>,
    ) -> Result<(), PlatformError> {
        self.record("handler.register")?;
        self.handlers.lock().unwrap().insert(filter, adapter);
        Ok(())
    }

    fn unregister_handler(&self, filter: EventFilter) -> Result<(), PlatformError> {
        self.handlers.lock().unwrap().remove(&filter);
        self.record("handler.unregister")
    }
}

impl WifiDriver for MockPlatform {
    fn init(&self) -> Result<(), PlatformError> {
        self.record("wifi.init")
    }

    fn set_mode_station(&self) -> Result<(), PlatformError> {
        self.record("wifi.set_mode")
    }

    fn set_station_config(&self, _ssid: &str, _password: &str) -> Result<(), PlatformError> {
        self.record("wifi.set_config")
    }

    fn start(&self) -> Result<(), PlatformError> {
        self.record("wifi.start")
    }

    fn stop(&self) -> Result<(), PlatformError> {
        self.record("wifi.stop")
    }

    fn request_connect(&self) {
        self.connects.fetch_add(1, Ordering::SeqCst);
    }
}

/// A callback that forwards every notification into a channel.
pub fn recorder() -> (
    impl Fn(ConnectionState) + Send + Sync + 'static,
    UnboundedReceiver<ConnectionState>,
) {
    let (tx, rx) = unbounded_channel();
    let callback = move |state: ConnectionState| {
        let _ = tx.send(state);
    };
    (callback, rx)
}

/// Receives exactly `n` notifications.
pub async fn take(rx: &mut UnboundedReceiver<ConnectionState>, n: usize) -> Vec<ConnectionState> {
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        let state = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for notification")
            .expect("notification channel closed");
        out.push(state);
    }
    out
}

/// Asserts no further notification arrives within a short window.
pub async fn assert_quiet(rx: &mut UnboundedReceiver<ConnectionState>) {
    let next = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await;
    assert!(next.is_err(), "unexpected notification: {next:?}");
}
