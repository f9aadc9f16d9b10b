//! Connection supervisor.
//!
//! The single consumer of the signal group. Each iteration waits for the
//! configured wake condition, resolves the pending set to one transition
//! with a fixed priority, clears only the consumed flag, and hands the
//! transition to the notification callback.
//!
//! Priority is `CONNECTING > ADDRESS_ACQUIRED > RETRIES_EXHAUSTED > LINK_LOST`
//! and is applied to the whole pending set, not just the bits that caused
//! the wake. Flags that were not consumed stay pending for the next
//! iteration, so coalesced signals are never dropped, though a link loss can
//! be reported after a later connect request or terminal signal.

use log::{debug, error, info};
use std::sync::Arc;

use crate::models::{ConnectionState, WakeCondition};
use crate::signals::{SignalGroup, SignalSet};

/// Callback invoked with every resolved transition.
pub(crate) type Callback = Arc<dyn Fn(ConnectionState) + Send + Sync>;

const PRIORITY: [(SignalSet, ConnectionState); 4] = [
    (SignalSet::CONNECTING, ConnectionState::Connecting),
    (SignalSet::ADDRESS_ACQUIRED, ConnectionState::Connected),
    (SignalSet::RETRIES_EXHAUSTED, ConnectionState::Failed),
    (SignalSet::LINK_LOST, ConnectionState::Disconnected),
];

/// Picks the transition to report for a pending signal set.
///
/// Returns the flag to consume together with the state it maps to, or `None`
/// when no recognized flag is pending.
///
/// # Example
///
/// ```rust
/// use wifi_sta::{ConnectionState, SignalSet, resolve};
///
/// let pending = SignalSet::LINK_LOST | SignalSet::ADDRESS_ACQUIRED;
/// assert_eq!(
///     resolve(pending),
///     Some((SignalSet::ADDRESS_ACQUIRED, ConnectionState::Connected))
/// );
/// ```
pub fn resolve(pending: SignalSet) -> Option<(SignalSet, ConnectionState)> {
    PRIORITY
        .iter()
        .find(|(flag, _)| pending.contains(*flag))
        .copied()
}

impl WakeCondition {
    /// The signals that release the supervisor's wait.
    pub fn mask(self) -> SignalSet {
        match self {
            Self::Terminal => SignalSet::TERMINAL,
            Self::AnySignal => SignalSet::all(),
        }
    }
}

pub(crate) struct Supervisor {
    signals: Arc<SignalGroup>,
    callback: Callback,
    wake_mask: SignalSet,
    ssid: String,
}

impl Supervisor {
    pub(crate) fn new(
        signals: Arc<SignalGroup>,
        callback: Callback,
        wake_on: WakeCondition,
        ssid: String,
    ) -> Self {
        Self {
            signals,
            callback,
            wake_mask: wake_on.mask(),
            ssid,
        }
    }

    /// Runs until the signal group is closed.
    pub(crate) async fn run(self) {
        debug!(
            "Supervisor started for '{}' (wake mask {:?})",
            self.ssid, self.wake_mask
        );
        while let Some(pending) = self.signals.wait_any(self.wake_mask).await {
            self.step(pending);
        }
        debug!("Supervisor for '{}' stopped", self.ssid);
    }

    /// Resolves one pending set, clears the consumed flag and notifies.
    fn step(&self, pending: SignalSet) -> Option<ConnectionState> {
        let Some((flag, state)) = resolve(pending) else {
            error!("Supervisor woke with no recognized signal pending ({pending:?})");
            return None;
        };

        self.signals.clear(flag);
        debug!("Resolved {pending:?} to {state}, consumed {flag:?}");

        match state {
            ConnectionState::Connecting => info!("Connecting to AP '{}'", self.ssid),
            ConnectionState::Connected => info!("Connected to AP '{}'", self.ssid),
            ConnectionState::Failed => info!("Failed to connect to '{}'", self.ssid),
            ConnectionState::Disconnected => info!("Disconnected from '{}'", self.ssid),
        }

        (self.callback)(state);
        Some(state)
    }
}
