//! The session: single owner of the logical link.
//!
//! Exactly one `Session` exists per application-visible client. It owns the
//! correlator, the registry, and one link state machine per service, and is
//! the only writer to any of them; the driver serializes access (mutex or
//! actor) and executes the returned actions. Issue methods hand back the
//! request id synchronously, before any network write, so callers can use it
//! at once even though the outcome arrives later.

use std::{collections::VecDeque, time::Duration};

use bytes::Bytes;
use tracing::debug;
use wavelink_proto::{
    ChannelRef, ChannelType, ErrorCode, OpKind, RequestFrame, RequestId, ServiceType, Timestamp,
};

use crate::{
    TimePoint,
    correlator::{PendingRequest, RequestCorrelator, RequestOrigin},
    error::SessionError,
    event::{OperationOutcome, PushEvent, SessionAction, SessionEvent},
    link::{LinkOperation, LinkReason, LinkState, LinkStateMachine},
    registry::SubscriptionRegistry,
};

/// Deadline applied to every issued request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a suspended link may wait for the transport to resume before the
/// session gives up and fails that service's pending requests.
pub const DEFAULT_RESUME_TIMEOUT: Duration = Duration::from_secs(30);

/// Session policy knobs.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Deadline for individual requests.
    pub request_timeout: Duration,
    /// Resume window for a suspended link.
    pub resume_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { request_timeout: DEFAULT_REQUEST_TIMEOUT, resume_timeout: DEFAULT_RESUME_TIMEOUT }
    }
}

/// Sans-io session state machine.
///
/// Generic over the instant type so deadlines and resume windows run under
/// real or virtual time.
#[derive(Debug)]
pub struct Session<I> {
    pub(crate) config: SessionConfig,
    pub(crate) correlator: RequestCorrelator<I>,
    pub(crate) registry: SubscriptionRegistry,
    pub(crate) message_link: LinkStateMachine<I>,
    pub(crate) stream_link: LinkStateMachine<I>,
    pub(crate) queued_message: VecDeque<RequestFrame>,
    pub(crate) queued_stream: VecDeque<RequestFrame>,
    pub(crate) logged_in: bool,
    pub(crate) last_server_time: Timestamp,
}

impl<I: TimePoint> Session<I> {
    /// Fresh session; both links Idle, no pending work.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            correlator: RequestCorrelator::new(),
            registry: SubscriptionRegistry::new(),
            message_link: LinkStateMachine::new(ServiceType::Message),
            stream_link: LinkStateMachine::new(ServiceType::Stream),
            queued_message: VecDeque::new(),
            queued_stream: VecDeque::new(),
            logged_in: false,
            last_server_time: 0,
        }
    }

    /// Current state of one service's link.
    pub fn link_state(&self, service: ServiceType) -> LinkState {
        self.link(service).state()
    }

    /// True after a login result confirmed the session.
    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    /// Number of requests awaiting results.
    pub fn outstanding_requests(&self) -> usize {
        self.correlator.outstanding()
    }

    /// The subscription registry, read-only.
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    pub(crate) fn link(&self, service: ServiceType) -> &LinkStateMachine<I> {
        match service {
            ServiceType::Message => &self.message_link,
            ServiceType::Stream => &self.stream_link,
        }
    }

    pub(crate) fn link_mut(&mut self, service: ServiceType) -> &mut LinkStateMachine<I> {
        match service {
            ServiceType::Message => &mut self.message_link,
            ServiceType::Stream => &mut self.stream_link,
        }
    }

    pub(crate) fn queue_mut(&mut self, service: ServiceType) -> &mut VecDeque<RequestFrame> {
        match service {
            ServiceType::Message => &mut self.queued_message,
            ServiceType::Stream => &mut self.queued_stream,
        }
    }

    /// Process one event and return the actions for the driver to execute.
    ///
    /// Infallible by design: every failure mode surfaces as a completion or a
    /// link-state event, never as a lost request.
    pub fn handle(&mut self, now: I, event: SessionEvent) -> Vec<SessionAction> {
        match event {
            SessionEvent::FrameReceived(frame) => self.on_frame(now, frame),
            SessionEvent::Tick => self.on_tick(now),
            SessionEvent::TransportConnected { service } => self.on_transport_up(now, service),
            SessionEvent::TransportSuspended { service } => self.on_transport_suspended(now, service),
            SessionEvent::TransportDisconnected { service } => {
                self.on_transport_disconnected(service)
            },
        }
    }

    // ---- issuing ----------------------------------------------------------

    /// Start a login. The payload is the opaque token envelope built by the
    /// caller.
    ///
    /// Opens the message service link when it is down; a second login while
    /// one is in flight (or while logged in) completes with
    /// [`ErrorCode::DuplicateOperation`].
    pub fn login(&mut self, now: I, payload: Bytes) -> (RequestId, Vec<SessionAction>) {
        let request_id = self.issue(now, OpKind::Login, None, None);

        match self.message_link.state() {
            LinkState::Idle | LinkState::Disconnected => {
                let mut actions = Vec::new();
                if let Some(event) = self.message_link.open(LinkOperation::Login, self.last_server_time)
                {
                    actions.push(SessionAction::Deliver(PushEvent::LinkState(event)));
                }
                actions.push(SessionAction::OpenLink { service: ServiceType::Message });
                self.queued_message.push_back(RequestFrame {
                    request_id,
                    op: OpKind::Login,
                    channel: None,
                    payload,
                });
                (request_id, actions)
            },
            LinkState::Connecting | LinkState::Connected | LinkState::Suspended => {
                (request_id, self.fail_now(request_id, ErrorCode::DuplicateOperation))
            },
            LinkState::Aborted => (request_id, self.fail_now(request_id, ErrorCode::LinkAborted)),
        }
    }

    /// Close the session.
    ///
    /// Fails every other pending request with
    /// [`ErrorCode::OperationCancelled`], clears the registry, moves both
    /// links to Disconnected, and completes the logout itself successfully.
    pub fn logout(&mut self, now: I) -> (RequestId, Vec<SessionAction>) {
        let request_id = self.issue(now, OpKind::Logout, None, None);
        let mut actions = Vec::new();

        // Best effort: tell the server before tearing down.
        if self.message_link.is_usable() {
            actions.push(SessionAction::Transmit(RequestFrame {
                request_id,
                op: OpKind::Logout,
                channel: None,
                payload: Bytes::new(),
            }));
        }

        // The logout entry itself resolves below, not through the cancel.
        let logout_pending = self.correlator.resolve(request_id);

        for pending in self.correlator.cancel_all() {
            if pending.origin == RequestOrigin::Application {
                actions.push(SessionAction::Complete(Self::outcome(
                    &pending,
                    ErrorCode::OperationCancelled,
                    Bytes::new(),
                )));
            }
        }

        self.registry.clear();
        self.queued_message.clear();
        self.queued_stream.clear();
        self.logged_in = false;

        let ts = self.last_server_time;
        for service in [ServiceType::Message, ServiceType::Stream] {
            if let Some(event) =
                self.link_mut(service).disconnect(LinkOperation::Logout, LinkReason::Logout, ts)
            {
                actions.push(SessionAction::Deliver(PushEvent::LinkState(event)));
                actions.push(SessionAction::CloseLink { service });
            }
        }

        if let Some(pending) = logout_pending {
            actions.push(SessionAction::Complete(Self::outcome(
                &pending,
                ErrorCode::Ok,
                Bytes::new(),
            )));
        }

        (request_id, actions)
    }

    /// Subscribe to a message channel.
    ///
    /// The opaque options payload is kept in the registry and replayed on
    /// restoration. Idempotent at the registry level: a concurrent second
    /// subscribe keeps a single record.
    pub fn subscribe(
        &mut self,
        now: I,
        channel: &str,
        options: Bytes,
    ) -> Result<(RequestId, Vec<SessionAction>), SessionError> {
        Self::check_channel(channel)?;
        self.registry.add(channel, ChannelType::Message, options.clone());

        let channel_ref = ChannelRef::message(channel);
        let request_id = self.issue(now, OpKind::Subscribe, Some(channel_ref.clone()), None);
        let actions = self.route(
            request_id,
            RequestFrame {
                request_id,
                op: OpKind::Subscribe,
                channel: Some(channel_ref),
                payload: options,
            },
        );
        Ok((request_id, actions))
    }

    /// Unsubscribe from a message channel.
    ///
    /// The registry record survives until the server confirms, so a
    /// concurrent disconnect never loses track of the channel.
    pub fn unsubscribe(
        &mut self,
        now: I,
        channel: &str,
    ) -> Result<(RequestId, Vec<SessionAction>), SessionError> {
        Self::check_channel(channel)?;
        self.registry.begin_removal(channel, ChannelType::Message);

        let channel_ref = ChannelRef::message(channel);
        let request_id = self.issue(now, OpKind::Unsubscribe, Some(channel_ref.clone()), None);
        let actions = self.route(
            request_id,
            RequestFrame {
                request_id,
                op: OpKind::Unsubscribe,
                channel: Some(channel_ref),
                payload: Bytes::new(),
            },
        );
        Ok((request_id, actions))
    }

    /// Join a stream channel. Opens the stream service link on first use.
    pub fn join(
        &mut self,
        now: I,
        channel: &str,
        options: Bytes,
    ) -> Result<(RequestId, Vec<SessionAction>), SessionError> {
        Self::check_channel(channel)?;
        self.registry.add(channel, ChannelType::Stream, options.clone());

        let channel_ref = ChannelRef::stream(channel);
        let request_id = self.issue(now, OpKind::Join, Some(channel_ref.clone()), None);
        let actions = self.route(
            request_id,
            RequestFrame {
                request_id,
                op: OpKind::Join,
                channel: Some(channel_ref),
                payload: options,
            },
        );
        Ok((request_id, actions))
    }

    /// Leave a stream channel.
    pub fn leave(
        &mut self,
        now: I,
        channel: &str,
    ) -> Result<(RequestId, Vec<SessionAction>), SessionError> {
        Self::check_channel(channel)?;
        self.registry.begin_removal(channel, ChannelType::Stream);

        let channel_ref = ChannelRef::stream(channel);
        let request_id = self.issue(now, OpKind::Leave, Some(channel_ref.clone()), None);
        let actions = self.route(
            request_id,
            RequestFrame {
                request_id,
                op: OpKind::Leave,
                channel: Some(channel_ref),
                payload: Bytes::new(),
            },
        );
        Ok((request_id, actions))
    }

    /// Register as publisher on a topic of a joined stream channel.
    pub fn join_topic(
        &mut self,
        now: I,
        channel: &str,
        topic: &str,
        options: Bytes,
    ) -> Result<(RequestId, Vec<SessionAction>), SessionError> {
        Self::check_channel(channel)?;
        Self::check_topic(topic)?;
        self.registry.add_topic(channel, topic, options.clone());

        let channel_ref = ChannelRef::stream(channel);
        let request_id =
            self.issue(now, OpKind::JoinTopic, Some(channel_ref.clone()), Some(topic.to_owned()));
        let actions = self.route(
            request_id,
            RequestFrame {
                request_id,
                op: OpKind::JoinTopic,
                channel: Some(channel_ref),
                payload: options,
            },
        );
        Ok((request_id, actions))
    }

    /// Deregister from a topic. The payload names the topic on the wire.
    pub fn leave_topic(
        &mut self,
        now: I,
        channel: &str,
        topic: &str,
        payload: Bytes,
    ) -> Result<(RequestId, Vec<SessionAction>), SessionError> {
        Self::check_channel(channel)?;
        Self::check_topic(topic)?;

        let channel_ref = ChannelRef::stream(channel);
        let request_id =
            self.issue(now, OpKind::LeaveTopic, Some(channel_ref.clone()), Some(topic.to_owned()));
        let actions = self.route(
            request_id,
            RequestFrame {
                request_id,
                op: OpKind::LeaveTopic,
                channel: Some(channel_ref),
                payload,
            },
        );
        Ok((request_id, actions))
    }

    /// Issue any other operation as a correlated request.
    ///
    /// This is the path the stateless module façades use: the caller has
    /// already validated arguments and encoded the payload; the session only
    /// correlates and routes.
    pub fn request(
        &mut self,
        now: I,
        op: OpKind,
        channel: Option<ChannelRef>,
        topic: Option<String>,
        payload: Bytes,
    ) -> Result<(RequestId, Vec<SessionAction>), SessionError> {
        if let Some(channel_ref) = &channel {
            Self::check_channel(&channel_ref.name)?;
        }
        if let Some(topic_name) = &topic {
            Self::check_topic(topic_name)?;
        }

        let request_id = self.issue(now, op, channel.clone(), topic);
        let actions =
            self.route(request_id, RequestFrame { request_id, op, channel, payload });
        Ok((request_id, actions))
    }

    /// Terminal, session-wide abort (revoked token, ban, release).
    ///
    /// Every pending request completes with [`ErrorCode::LinkAborted`] and
    /// both links move to Aborted; no further operation will be transmitted.
    pub fn abort(&mut self, reason: LinkReason) -> Vec<SessionAction> {
        let mut actions = Vec::new();

        for pending in self.correlator.cancel_all() {
            if pending.origin == RequestOrigin::Application {
                actions.push(SessionAction::Complete(Self::outcome(
                    &pending,
                    ErrorCode::LinkAborted,
                    Bytes::new(),
                )));
            }
        }

        self.registry.clear();
        self.queued_message.clear();
        self.queued_stream.clear();
        self.logged_in = false;

        let ts = self.last_server_time;
        for service in [ServiceType::Message, ServiceType::Stream] {
            if let Some(event) = self.link_mut(service).abort(reason, ts) {
                actions.push(SessionAction::Deliver(PushEvent::LinkState(event)));
                actions.push(SessionAction::CloseLink { service });
            }
        }

        actions
    }

    // ---- internals --------------------------------------------------------

    fn issue(
        &mut self,
        now: I,
        op: OpKind,
        channel: Option<ChannelRef>,
        topic: Option<String>,
    ) -> RequestId {
        self.correlator.issue(
            now,
            op,
            channel,
            topic,
            RequestOrigin::Application,
            Some(self.config.request_timeout),
        )
    }

    /// Apply the transmission policy for a freshly issued request.
    ///
    /// Connected transmits; Connecting/Suspended queues (flushed in id order
    /// once the transport is up); anything else completes the request
    /// immediately with the matching failure code.
    fn route(&mut self, request_id: RequestId, frame: RequestFrame) -> Vec<SessionAction> {
        let service = frame.service();
        match self.link(service).state() {
            LinkState::Connected => vec![SessionAction::Transmit(frame)],
            LinkState::Connecting | LinkState::Suspended => {
                self.queue_mut(service).push_back(frame);
                Vec::new()
            },
            LinkState::Idle => {
                if service == ServiceType::Stream && self.logged_in {
                    // First stream operation brings up the stream service.
                    let mut actions = Vec::new();
                    if let Some(event) =
                        self.stream_link.open(LinkOperation::Join, self.last_server_time)
                    {
                        actions.push(SessionAction::Deliver(PushEvent::LinkState(event)));
                    }
                    actions.push(SessionAction::OpenLink { service });
                    self.queued_stream.push_back(frame);
                    actions
                } else {
                    self.fail_now(request_id, ErrorCode::NotLoggedIn)
                }
            },
            LinkState::Disconnected => self.fail_now(request_id, ErrorCode::NotConnected),
            LinkState::Aborted => self.fail_now(request_id, ErrorCode::LinkAborted),
        }
    }

    /// Complete a just-issued request without transmitting it.
    fn fail_now(&mut self, request_id: RequestId, code: ErrorCode) -> Vec<SessionAction> {
        match self.correlator.resolve(request_id) {
            Some(pending) => {
                self.rollback_registry(&pending, code);
                vec![SessionAction::Complete(Self::outcome(&pending, code, Bytes::new()))]
            },
            None => Vec::new(),
        }
    }

    /// Undo the registry bookkeeping of a request that failed.
    pub(crate) fn rollback_registry(&mut self, pending: &PendingRequest<I>, code: ErrorCode) {
        debug_assert!(!code.is_ok());
        let Some(channel_ref) = &pending.channel else { return };
        match pending.op {
            OpKind::Subscribe | OpKind::Join => {
                self.registry.subscribe_failed(&channel_ref.name, channel_ref.channel_type);
            },
            OpKind::Unsubscribe | OpKind::Leave => {
                self.registry.cancel_removal(&channel_ref.name, channel_ref.channel_type);
            },
            OpKind::JoinTopic => {
                if let Some(topic) = &pending.topic {
                    self.registry.remove_topic(&channel_ref.name, topic);
                }
            },
            _ => {},
        }
    }

    pub(crate) fn outcome(
        pending: &PendingRequest<I>,
        code: ErrorCode,
        payload: Bytes,
    ) -> OperationOutcome {
        OperationOutcome {
            request_id: pending.request_id,
            op: pending.op,
            channel: pending.channel.clone(),
            topic: pending.topic.clone(),
            code,
            payload,
        }
    }

    /// Failure code used when a request's deadline passes.
    pub(crate) fn timeout_code(op: OpKind) -> ErrorCode {
        match op {
            OpKind::Login => ErrorCode::LoginTimeout,
            OpKind::Subscribe | OpKind::Join => ErrorCode::ChannelSubscribeTimeout,
            _ => ErrorCode::OperationTimeout,
        }
    }

    fn check_channel(channel: &str) -> Result<(), SessionError> {
        if channel.is_empty() {
            return Err(SessionError::InvalidChannelName { reason: "empty name".to_owned() });
        }
        Ok(())
    }

    fn check_topic(topic: &str) -> Result<(), SessionError> {
        if topic.is_empty() {
            return Err(SessionError::InvalidTopicName { reason: "empty name".to_owned() });
        }
        Ok(())
    }

    fn on_transport_suspended(&mut self, now: I, service: ServiceType) -> Vec<SessionAction> {
        let ts = self.last_server_time;
        match self.link_mut(service).suspend(now, ts) {
            Some(event) => {
                debug!(?service, "link suspended, holding pending requests");
                vec![SessionAction::Deliver(PushEvent::LinkState(event))]
            },
            None => Vec::new(),
        }
    }

    fn on_transport_disconnected(&mut self, service: ServiceType) -> Vec<SessionAction> {
        let ts = self.last_server_time;
        let Some(event) = self.link_mut(service).disconnect(
            LinkOperation::AutoReconnect,
            LinkReason::TransportLost,
            ts,
        ) else {
            return Vec::new();
        };

        let mut actions = vec![SessionAction::Deliver(PushEvent::LinkState(event))];
        actions.extend(self.fail_service(service, ErrorCode::NotConnected));
        actions
    }

    /// Fail everything pending on one service after its link is gone.
    pub(crate) fn fail_service(
        &mut self,
        service: ServiceType,
        code: ErrorCode,
    ) -> Vec<SessionAction> {
        self.queue_mut(service).clear();
        if service == ServiceType::Message {
            self.logged_in = false;
        }

        let mut actions = Vec::new();
        for pending in self.correlator.cancel_service(service) {
            if pending.origin == RequestOrigin::Application {
                self.rollback_registry(&pending, code);
                actions.push(SessionAction::Complete(Self::outcome(&pending, code, Bytes::new())));
            }
        }
        actions
    }
}
