//! Session core for the Wavelink messaging client.
//!
//! The [`Session`] is a sans-io state machine that owns the single logical
//! link to the backend. It receives events ([`SessionEvent`]: decoded frames,
//! transport signals, time ticks), processes them through pure state machine
//! logic, and returns actions ([`SessionAction`]) for the driver to execute.
//! No I/O and no runtime dependency live here; time is passed in as a generic
//! instant so the core runs identically under real and virtual clocks.
//!
//! # Components
//!
//! - [`RequestCorrelator`]: assigns strictly increasing request ids, tracks
//!   outstanding requests, matches results, enforces deadlines
//! - [`SubscriptionRegistry`]: durable record of channel subscriptions and
//!   topic memberships, restored after reconnects, gates inbound events
//! - [`LinkStateMachine`]: per-service link lifecycle and restoration
//!   progress, emitting one [`LinkStateEvent`] per transition
//! - [`Session`]: ties the three together with per-service transmit queues
//!   and the inbound frame dispatch
//!
//! # Guarantees
//!
//! Every issued request completes exactly once, whether by result, timeout,
//! or session-wide cancellation. Events for one channel are delivered in
//! arrival order. Stale or duplicate results are logged and dropped.

use std::{
    ops::{Add, Sub},
    time::Duration,
};

mod correlator;
mod dispatch;
mod error;
mod event;
mod link;
mod registry;
mod session;

pub use correlator::{PendingRequest, RequestCorrelator, RequestOrigin};
pub use error::SessionError;
pub use event::{OperationOutcome, PushEvent, SessionAction, SessionEvent};
pub use link::{LinkOperation, LinkReason, LinkState, LinkStateEvent, LinkStateMachine};
pub use registry::{ChannelSubscription, SubscriptionRegistry, SubscriptionState, TopicMembership};
pub use session::{DEFAULT_REQUEST_TIMEOUT, DEFAULT_RESUME_TIMEOUT, Session, SessionConfig};

/// Point on a monotonic clock.
///
/// Production drivers use [`std::time::Instant`]; tests use any ordered
/// instant type, which keeps the core deterministic under virtual time.
pub trait TimePoint:
    Copy + Ord + Send + Sync + Add<Duration, Output = Self> + Sub<Self, Output = Duration>
{
}

impl<T> TimePoint for T where
    T: Copy + Ord + Send + Sync + Add<Duration, Output = T> + Sub<T, Output = Duration>
{
}
