//! Link lifecycle state machine.
//!
//! One machine per service type: the message service and the stream service
//! connect, suspend, and resume independently. Methods take time as input and
//! return the events for the session to emit, keeping the machine pure.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐ login/join ┌────────────┐ transport up ┌───────────┐
//! │ Idle │───────────>│ Connecting │─────────────>│ Connected │
//! └──────┘            └────────────┘              └───────────┘
//!                                                   │       ↑
//!                                     transport loss│       │resume
//!                                                   ↓       │
//!                    ┌──────────────┐  timeout   ┌───────────┐
//!                    │ Disconnected │<───────────│ Suspended │
//!                    └──────────────┘  /logout   └───────────┘
//!
//! Connected/Suspended/Disconnected ──unrecoverable──> Aborted (terminal)
//! ```
//!
//! Every transition produces exactly one [`LinkStateEvent`]. A reconnect that
//! has subscriptions to replay holds its event until the last channel's
//! restoration resolves, so the event reports restored and unrestored
//! channels together.

use std::{collections::BTreeMap, time::Duration};

use wavelink_proto::{RequestId, ServiceType, Timestamp};

use crate::TimePoint;

/// State of one service's link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Never connected.
    Idle,
    /// Link requested, transport not yet up.
    Connecting,
    /// Link usable.
    Connected,
    /// Transient transport loss; the transport may auto-resume.
    Suspended,
    /// Link down; a fresh login can bring it back.
    Disconnected,
    /// Unrecoverable failure; terminal.
    Aborted,
}

/// Operation that triggered a link transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOperation {
    /// Application login.
    Login,
    /// Application logout.
    Logout,
    /// First stream operation opening the stream service.
    Join,
    /// Transport-driven reconnect handling.
    AutoReconnect,
    /// Resume window elapsed without the transport coming back.
    ReconnectTimeout,
    /// Session-wide abort.
    Abort,
}

/// Why a link transition happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkReason {
    /// No specific reason recorded.
    Unknown,
    /// Link opening was requested.
    Connecting,
    /// Transport handshake completed.
    TransportUp,
    /// Transport dropped; resume possible.
    TransportLost,
    /// Transport re-established after a suspension.
    TransportResumed,
    /// Suspension outlived the resume window.
    ResumeTimeout,
    /// Application closed the session.
    Logout,
    /// Server revoked the session token.
    TokenRevoked,
    /// Server rejected or banned the session.
    ServerReject,
}

/// One link transition, delivered to the application's event sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkStateEvent {
    /// State after the transition.
    pub current: LinkState,
    /// State before the transition.
    pub previous: LinkState,
    /// Service whose link transitioned.
    pub service: ServiceType,
    /// Operation that triggered the transition.
    pub operation: LinkOperation,
    /// Why the transition happened.
    pub reason: LinkReason,
    /// Channels whose subscriptions were restored by a reconnect.
    pub affected_channels: Vec<String>,
    /// Channels whose restoration was rejected.
    pub unrestored_channels: Vec<String>,
    /// True when the transition resumed a suspended link.
    pub is_resumed: bool,
    /// Last observed server UTC time, milliseconds; `0` before any frame
    /// carried one.
    pub timestamp: Timestamp,
}

/// Restoration in progress after a reconnect.
#[derive(Debug)]
struct Restoration {
    previous: LinkState,
    resumed: bool,
    awaiting: BTreeMap<RequestId, String>,
    restored: Vec<String>,
    failed: Vec<String>,
}

/// Lifecycle state machine for one service's link.
#[derive(Debug)]
pub struct LinkStateMachine<I> {
    service: ServiceType,
    state: LinkState,
    suspended_since: Option<I>,
    restoration: Option<Restoration>,
}

impl<I: TimePoint> LinkStateMachine<I> {
    /// Machine in the Idle state.
    pub fn new(service: ServiceType) -> Self {
        Self { service, state: LinkState::Idle, suspended_since: None, restoration: None }
    }

    /// Current state.
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Service this machine tracks.
    pub fn service(&self) -> ServiceType {
        self.service
    }

    /// True when requests can be transmitted right now.
    pub fn is_usable(&self) -> bool {
        self.state == LinkState::Connected
    }

    /// True when requests should be queued for a link that is on its way up
    /// or expected back.
    pub fn is_pending(&self) -> bool {
        matches!(self.state, LinkState::Connecting | LinkState::Suspended)
    }

    fn transition(
        &mut self,
        to: LinkState,
        operation: LinkOperation,
        reason: LinkReason,
        timestamp: Timestamp,
    ) -> LinkStateEvent {
        let previous = self.state;
        self.state = to;
        LinkStateEvent {
            current: to,
            previous,
            service: self.service,
            operation,
            reason,
            affected_channels: Vec::new(),
            unrestored_channels: Vec::new(),
            is_resumed: false,
            timestamp,
        }
    }

    /// Open the link: Idle/Disconnected → Connecting.
    ///
    /// Returns `None` when the link is already opening, open, or aborted.
    pub fn open(&mut self, operation: LinkOperation, timestamp: Timestamp) -> Option<LinkStateEvent> {
        match self.state {
            LinkState::Idle | LinkState::Disconnected => {
                Some(self.transition(LinkState::Connecting, operation, LinkReason::Connecting, timestamp))
            },
            _ => None,
        }
    }

    /// Transport handshake completed; returns the pre-transition state and
    /// whether this is a resume.
    ///
    /// The transition event is not built here: the session first decides
    /// whether subscriptions must be replayed. With nothing to replay it calls
    /// [`Self::connected_event`]; otherwise [`Self::begin_restoration`] holds
    /// the event until the replay resolves.
    pub fn on_transport_up(&mut self) -> Option<(LinkState, bool)> {
        match self.state {
            LinkState::Connecting | LinkState::Suspended => {
                let previous = self.state;
                let resumed = previous == LinkState::Suspended;
                self.state = LinkState::Connected;
                self.suspended_since = None;
                Some((previous, resumed))
            },
            _ => None,
        }
    }

    /// Event for a connect with no subscriptions to replay.
    pub fn connected_event(
        &self,
        previous: LinkState,
        resumed: bool,
        timestamp: Timestamp,
    ) -> LinkStateEvent {
        LinkStateEvent {
            current: LinkState::Connected,
            previous,
            service: self.service,
            operation: if resumed { LinkOperation::AutoReconnect } else { LinkOperation::Login },
            reason: if resumed { LinkReason::TransportResumed } else { LinkReason::TransportUp },
            affected_channels: Vec::new(),
            unrestored_channels: Vec::new(),
            is_resumed: resumed,
            timestamp,
        }
    }

    /// Hold the connected event until every channel in `awaiting` resolves.
    pub fn begin_restoration(
        &mut self,
        previous: LinkState,
        resumed: bool,
        awaiting: BTreeMap<RequestId, String>,
    ) {
        debug_assert!(!awaiting.is_empty());
        self.restoration = Some(Restoration {
            previous,
            resumed,
            awaiting,
            restored: Vec::new(),
            failed: Vec::new(),
        });
    }

    /// Record one channel's restoration outcome.
    ///
    /// Returns the held connected event once the last channel resolves; one
    /// channel's failure never blocks the others.
    pub fn restore_result(
        &mut self,
        request_id: RequestId,
        ok: bool,
        timestamp: Timestamp,
    ) -> Option<LinkStateEvent> {
        let restoration = self.restoration.as_mut()?;
        let channel = restoration.awaiting.remove(&request_id)?;
        if ok {
            restoration.restored.push(channel);
        } else {
            restoration.failed.push(channel);
        }

        if !restoration.awaiting.is_empty() {
            return None;
        }

        let done = self.restoration.take()?;
        Some(LinkStateEvent {
            current: self.state,
            previous: done.previous,
            service: self.service,
            operation: LinkOperation::AutoReconnect,
            reason: if done.resumed { LinkReason::TransportResumed } else { LinkReason::TransportUp },
            affected_channels: done.restored,
            unrestored_channels: done.failed,
            is_resumed: done.resumed,
            timestamp,
        })
    }

    /// Transient transport loss: Connected → Suspended.
    pub fn suspend(&mut self, now: I, timestamp: Timestamp) -> Option<LinkStateEvent> {
        if self.state != LinkState::Connected {
            return None;
        }
        self.suspended_since = Some(now);
        Some(self.transition(
            LinkState::Suspended,
            LinkOperation::AutoReconnect,
            LinkReason::TransportLost,
            timestamp,
        ))
    }

    /// True when a suspension has outlived the resume window.
    pub fn resume_expired(&self, now: I, resume_timeout: Duration) -> bool {
        self.state == LinkState::Suspended
            && self.suspended_since.is_some_and(|since| now - since >= resume_timeout)
    }

    /// Close the link: → Disconnected.
    ///
    /// Any in-flight restoration is abandoned; its held event will never
    /// fire, the disconnect event replaces it.
    pub fn disconnect(
        &mut self,
        operation: LinkOperation,
        reason: LinkReason,
        timestamp: Timestamp,
    ) -> Option<LinkStateEvent> {
        match self.state {
            LinkState::Idle | LinkState::Disconnected | LinkState::Aborted => None,
            _ => {
                self.restoration = None;
                self.suspended_since = None;
                Some(self.transition(LinkState::Disconnected, operation, reason, timestamp))
            },
        }
    }

    /// Terminal failure: → Aborted.
    pub fn abort(&mut self, reason: LinkReason, timestamp: Timestamp) -> Option<LinkStateEvent> {
        if self.state == LinkState::Aborted {
            return None;
        }
        self.restoration = None;
        self.suspended_since = None;
        Some(self.transition(LinkState::Aborted, LinkOperation::Abort, reason, timestamp))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Instant;

    use super::*;

    fn machine() -> LinkStateMachine<Instant> {
        LinkStateMachine::new(ServiceType::Message)
    }

    #[test]
    fn open_connect_cycle() {
        let mut link = machine();
        let event = link.open(LinkOperation::Login, 0).unwrap();
        assert_eq!(event.previous, LinkState::Idle);
        assert_eq!(event.current, LinkState::Connecting);

        // Opening again is a no-op.
        assert!(link.open(LinkOperation::Login, 0).is_none());

        let (previous, resumed) = link.on_transport_up().unwrap();
        assert_eq!(previous, LinkState::Connecting);
        assert!(!resumed);
        assert!(link.is_usable());
    }

    #[test]
    fn suspend_resume_is_flagged() {
        let now = Instant::now();
        let mut link = machine();
        link.open(LinkOperation::Login, 0);
        link.on_transport_up();

        let event = link.suspend(now, 0).unwrap();
        assert_eq!(event.current, LinkState::Suspended);

        let (previous, resumed) = link.on_transport_up().unwrap();
        assert_eq!(previous, LinkState::Suspended);
        assert!(resumed);

        let event = link.connected_event(previous, resumed, 7);
        assert!(event.is_resumed);
        assert_eq!(event.timestamp, 7);
    }

    #[test]
    fn restoration_holds_the_event_until_last_result() {
        let mut link = machine();
        link.open(LinkOperation::Login, 0);
        link.on_transport_up();
        link.suspend(Instant::now(), 0);
        let (previous, resumed) = link.on_transport_up().unwrap();

        let awaiting =
            BTreeMap::from([(10, "a".to_owned()), (11, "b".to_owned())]);
        link.begin_restoration(previous, resumed, awaiting);

        assert!(link.restore_result(10, true, 0).is_none());
        let event = link.restore_result(11, false, 0).unwrap();
        assert_eq!(event.affected_channels, ["a"]);
        assert_eq!(event.unrestored_channels, ["b"]);
        assert!(event.is_resumed);
    }

    #[test]
    fn resume_window_expiry() {
        let now = Instant::now();
        let mut link = machine();
        link.open(LinkOperation::Login, 0);
        link.on_transport_up();
        link.suspend(now, 0);

        let timeout = Duration::from_secs(30);
        assert!(!link.resume_expired(now + Duration::from_secs(10), timeout));
        assert!(link.resume_expired(now + Duration::from_secs(30), timeout));

        let event =
            link.disconnect(LinkOperation::ReconnectTimeout, LinkReason::ResumeTimeout, 0).unwrap();
        assert_eq!(event.previous, LinkState::Suspended);
        assert_eq!(event.current, LinkState::Disconnected);
    }

    #[test]
    fn abort_is_terminal() {
        let mut link = machine();
        link.open(LinkOperation::Login, 0);
        link.on_transport_up();

        assert!(link.abort(LinkReason::TokenRevoked, 0).is_some());
        assert_eq!(link.state(), LinkState::Aborted);

        // No transition leaves Aborted.
        assert!(link.abort(LinkReason::TokenRevoked, 0).is_none());
        assert!(link.open(LinkOperation::Login, 0).is_none());
        assert!(link.on_transport_up().is_none());
        assert!(link.disconnect(LinkOperation::Logout, LinkReason::Logout, 0).is_none());
    }
}
