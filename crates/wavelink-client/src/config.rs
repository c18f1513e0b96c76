//! Client configuration.

use std::time::Duration;

use wavelink_core::SessionConfig;

/// How deep the event delivery queue runs before the read side backpressures.
pub const DEFAULT_EVENT_QUEUE_DEPTH: usize = 256;

/// How often the driver ticks the session for deadline sweeps.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Settings for one [`crate::Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Identity this client logs in as.
    pub user_id: String,
    /// Session timing policy.
    pub session: SessionConfig,
    /// Tick cadence for timeout processing.
    pub tick_interval: Duration,
    /// Bound on the event delivery queue.
    pub event_queue_depth: usize,
    /// Also report link transitions through the deprecated
    /// connection-state callback.
    pub legacy_connection_events: bool,
}

impl ClientConfig {
    /// Defaults for the given identity.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session: SessionConfig::default(),
            tick_interval: DEFAULT_TICK_INTERVAL,
            event_queue_depth: DEFAULT_EVENT_QUEUE_DEPTH,
            legacy_connection_events: false,
        }
    }
}
