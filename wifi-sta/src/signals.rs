//! Signal handoff between the event adapter and the supervisor.
//!
//! The adapter runs in whatever context the platform delivers events from,
//! possibly interrupt-class, so setting a signal must never block. Signals
//! live in a single atomic word and are OR-ed in place; the supervisor is the
//! only consumer and clears exactly the flag it acted on.
//!
//! Waking uses [`tokio::sync::Notify`]. A wake posted while the supervisor is
//! busy is stored as a permit, so the next wait returns immediately and
//! re-reads the word rather than sleeping through the update.

use bitflags::bitflags;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio::sync::Notify;

bitflags! {
    /// Pending raw conditions, one bit per signal.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SignalSet: u32 {
        /// A connection attempt was requested from the driver.
        const CONNECTING = 1 << 0;
        /// The station acquired an address.
        const ADDRESS_ACQUIRED = 1 << 1;
        /// The link was lost.
        const LINK_LOST = 1 << 2;
        /// A link loss arrived with no retry budget left.
        const RETRIES_EXHAUSTED = 1 << 3;
    }
}

impl SignalSet {
    /// Signals that end a connection attempt one way or the other.
    pub const TERMINAL: Self = Self::ADDRESS_ACQUIRED.union(Self::RETRIES_EXHAUSTED);
}

/// Shared signal word plus the wake primitive for its single waiter.
#[derive(Debug, Default)]
pub struct SignalGroup {
    bits: AtomicU32,
    closed: AtomicBool,
    notify: Notify,
}

impl SignalGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// ORs `signals` into the group and wakes the waiter.
    ///
    /// Never blocks and never allocates. Returns the set as it was before
    /// this call.
    pub fn set(&self, signals: SignalSet) -> SignalSet {
        let prev = self.bits.fetch_or(signals.bits(), Ordering::AcqRel);
        self.notify.notify_one();
        SignalSet::from_bits_truncate(prev)
    }

    /// Clears exactly `signals`, leaving every other pending flag intact.
    pub fn clear(&self, signals: SignalSet) {
        self.bits.fetch_and(!signals.bits(), Ordering::AcqRel);
    }

    /// Returns the currently pending signals.
    pub fn snapshot(&self) -> SignalSet {
        SignalSet::from_bits_truncate(self.bits.load(Ordering::Acquire))
    }

    /// Waits until any signal in `mask` is pending, then returns the full
    /// pending set (not only the bits in `mask`).
    ///
    /// There is no timeout. Returns `None` once the group is closed.
    pub async fn wait_any(&self, mask: SignalSet) -> Option<SignalSet> {
        loop {
            // Register interest before reading so a concurrent `set` is not missed.
            let notified = self.notify.notified();

            if self.is_closed() {
                return None;
            }
            let pending = self.snapshot();
            if pending.intersects(mask) {
                return Some(pending);
            }

            notified.await;
        }
    }

    /// Closes the group, releasing the waiter with `None`.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
