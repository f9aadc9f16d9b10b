//! Raw platform events to signal bits.
//!
//! The adapter is registered with the platform's event loop and may be
//! invoked from interrupt-class context. It only touches atomics and asks the
//! driver to reconnect; it never logs, allocates, or calls the consumer's
//! callback. The supervisor picks the signals up from the shared group.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::platform::{IpEvent, RawEvent, WifiDriver, WifiEvent};
use crate::signals::{SignalGroup, SignalSet};

/// Translates link and address events into pending signals and drives the
/// reconnect budget.
pub struct EventAdapter {
    signals: Arc<SignalGroup>,
    driver: Arc<dyn WifiDriver>,
    retries: AtomicU32,
    max_retries: u32,
}

impl EventAdapter {
    pub(crate) fn new(
        signals: Arc<SignalGroup>,
        driver: Arc<dyn WifiDriver>,
        max_retries: u32,
    ) -> Self {
        Self {
            signals,
            driver,
            retries: AtomicU32::new(0),
            max_retries,
        }
    }

    /// Handles one raw event.
    ///
    /// Returns `true` when signals were posted and the caller should yield
    /// to let the supervisor run, `false` for events this adapter ignores.
    pub fn handle(&self, event: &RawEvent) -> bool {
        match event {
            RawEvent::Wifi(WifiEvent::StaStart) => {
                self.driver.request_connect();
                self.signals.set(SignalSet::CONNECTING);
                true
            }
            RawEvent::Wifi(WifiEvent::StaDisconnected { .. }) => {
                self.signals.set(SignalSet::LINK_LOST);
                // Claim the attempt before asking the driver, so an address
                // event delivered meanwhile resets a counter that is final.
                let claimed = self
                    .retries
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                        (n < self.max_retries).then_some(n + 1)
                    });
                match claimed {
                    Ok(_) => {
                        self.driver.request_connect();
                        self.signals.set(SignalSet::CONNECTING);
                    }
                    Err(_) => {
                        self.signals.set(SignalSet::RETRIES_EXHAUSTED);
                    }
                }
                true
            }
            RawEvent::Ip(IpEvent::StaGotIp { .. }) => {
                self.retries.store(0, Ordering::Release);
                self.signals.set(SignalSet::ADDRESS_ACQUIRED);
                true
            }
            RawEvent::Wifi(WifiEvent::Other(_)) | RawEvent::Ip(IpEvent::Other(_)) => false,
        }
    }

    /// Reconnect attempts made since the last address acquisition.
    pub fn retry_count(&self) -> u32 {
        self.retries.load(Ordering::Acquire)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}
