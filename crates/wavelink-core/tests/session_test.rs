//! End-to-end session behavior against a scripted transport.
//!
//! Each test drives the session with events exactly as a driver would and
//! asserts on the returned actions.

#![allow(clippy::unwrap_used)]

use std::time::Instant;

use bytes::Bytes;
use wavelink_core::{
    LinkState, LinkStateEvent, OperationOutcome, PushEvent, Session, SessionAction, SessionConfig,
    SessionEvent,
};
use wavelink_proto::{
    ChannelRef, ErrorCode, EventFrame, EventKind, InboundFrame, OpKind, RequestFrame, RequestId,
    ResultFrame, ServiceType,
};

fn transmits(actions: &[SessionAction]) -> Vec<RequestFrame> {
    actions
        .iter()
        .filter_map(|action| match action {
            SessionAction::Transmit(frame) => Some(frame.clone()),
            _ => None,
        })
        .collect()
}

fn completions(actions: &[SessionAction]) -> Vec<OperationOutcome> {
    actions
        .iter()
        .filter_map(|action| match action {
            SessionAction::Complete(outcome) => Some(outcome.clone()),
            _ => None,
        })
        .collect()
}

fn link_events(actions: &[SessionAction]) -> Vec<LinkStateEvent> {
    actions
        .iter()
        .filter_map(|action| match action {
            SessionAction::Deliver(PushEvent::LinkState(event)) => Some(event.clone()),
            _ => None,
        })
        .collect()
}

fn delivered_frames(actions: &[SessionAction]) -> Vec<EventFrame> {
    actions
        .iter()
        .filter_map(|action| match action {
            SessionAction::Deliver(PushEvent::Frame(frame)) => Some(frame.clone()),
            _ => None,
        })
        .collect()
}

fn result_ok(request_id: RequestId) -> SessionEvent {
    SessionEvent::FrameReceived(InboundFrame::Result(ResultFrame::ok(request_id)))
}

fn result_err(request_id: RequestId, code: ErrorCode) -> SessionEvent {
    SessionEvent::FrameReceived(InboundFrame::Result(ResultFrame::err(request_id, code)))
}

fn message_event(channel: &str) -> SessionEvent {
    SessionEvent::FrameReceived(InboundFrame::Event(EventFrame {
        kind: EventKind::Message,
        channel: Some(channel.to_owned()),
        payload: Bytes::from_static(b"payload"),
        timestamp: 1,
    }))
}

/// Session driven through a successful login handshake.
fn logged_in_session(now: Instant) -> Session<Instant> {
    let mut session = Session::new(SessionConfig::default());

    let (login_id, actions) = session.login(now, Bytes::from_static(b"token"));
    assert!(actions.iter().any(|a| matches!(
        a,
        SessionAction::OpenLink { service: ServiceType::Message }
    )));

    let actions =
        session.handle(now, SessionEvent::TransportConnected { service: ServiceType::Message });
    assert_eq!(transmits(&actions).len(), 1, "queued login flushes on connect");

    let actions = session.handle(now, result_ok(login_id));
    assert!(completions(&actions)[0].is_ok());
    assert!(session.is_logged_in());
    assert_eq!(session.link_state(ServiceType::Message), LinkState::Connected);

    session
}

/// Logged-in session with an active message channel subscription.
fn subscribed_session(now: Instant, channel: &str) -> Session<Instant> {
    let mut session = logged_in_session(now);
    let (id, actions) = session.subscribe(now, channel, Bytes::new()).unwrap();
    assert_eq!(transmits(&actions).len(), 1);
    let actions = session.handle(now, result_ok(id));
    assert!(completions(&actions)[0].is_ok());
    session
}

#[test]
fn login_handshake_delivers_connected_event() {
    let now = Instant::now();
    let mut session = Session::new(SessionConfig::default());

    let (login_id, actions) = session.login(now, Bytes::from_static(b"token"));
    let events = link_events(&actions);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].current, LinkState::Connecting);

    let actions =
        session.handle(now, SessionEvent::TransportConnected { service: ServiceType::Message });
    let events = link_events(&actions);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].current, LinkState::Connected);
    assert!(!events[0].is_resumed);

    let frames = transmits(&actions);
    assert_eq!(frames[0].request_id, login_id);
    assert_eq!(frames[0].op, OpKind::Login);
}

#[test]
fn second_login_while_pending_is_a_duplicate() {
    let now = Instant::now();
    let mut session = Session::new(SessionConfig::default());

    let _ = session.login(now, Bytes::from_static(b"token"));
    let (_, actions) = session.login(now, Bytes::from_static(b"token"));
    let outcomes = completions(&actions);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].code, ErrorCode::DuplicateOperation);
}

#[test]
fn result_resolves_only_the_matching_request() {
    let now = Instant::now();
    let mut session = logged_in_session(now);

    let (first, _) = session
        .request(now, OpKind::Publish, Some(ChannelRef::message("room")), None, Bytes::new())
        .unwrap();
    let (second, _) = session
        .request(now, OpKind::Publish, Some(ChannelRef::message("room")), None, Bytes::new())
        .unwrap();
    assert_ne!(first, second);

    let actions = session.handle(now, result_ok(second));
    let outcomes = completions(&actions);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].request_id, second);
    assert_eq!(session.outstanding_requests(), 1);
}

#[test]
fn duplicate_result_is_dropped() {
    let now = Instant::now();
    let mut session = logged_in_session(now);

    let (id, _) = session
        .request(now, OpKind::Publish, Some(ChannelRef::message("room")), None, Bytes::new())
        .unwrap();

    let first = session.handle(now, result_ok(id));
    assert_eq!(completions(&first).len(), 1);

    let second = session.handle(now, result_ok(id));
    assert!(second.is_empty(), "replayed result must produce nothing");
}

#[test]
fn requests_queue_while_connecting_and_flush_in_order() {
    let now = Instant::now();
    let mut session = Session::new(SessionConfig::default());

    let (login_id, _) = session.login(now, Bytes::from_static(b"token"));
    let (sub_id, actions) = session.subscribe(now, "room", Bytes::new()).unwrap();
    assert!(transmits(&actions).is_empty(), "nothing transmits before the link is up");

    let actions =
        session.handle(now, SessionEvent::TransportConnected { service: ServiceType::Message });
    let frames = transmits(&actions);
    let ids: Vec<_> = frames.iter().map(|f| f.request_id).collect();
    assert_eq!(ids, [login_id, sub_id]);
}

#[test]
fn operations_before_login_fail_immediately() {
    let now = Instant::now();
    let mut session = Session::new(SessionConfig::default());

    let (_, actions) = session
        .request(now, OpKind::Publish, Some(ChannelRef::message("room")), None, Bytes::new())
        .unwrap();
    let outcomes = completions(&actions);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].code, ErrorCode::NotLoggedIn);
    assert_eq!(session.outstanding_requests(), 0);
}

#[test]
fn empty_channel_name_is_rejected_locally() {
    let now = Instant::now();
    let mut session = logged_in_session(now);
    assert!(session.subscribe(now, "", Bytes::new()).is_err());
}

#[test]
fn request_deadline_completes_with_timeout() {
    let now = Instant::now();
    let config = SessionConfig::default();
    let timeout = config.request_timeout;
    let mut session = logged_in_session(now);

    let (id, _) = session
        .request(now, OpKind::Publish, Some(ChannelRef::message("room")), None, Bytes::new())
        .unwrap();

    let actions = session.handle(now + timeout, SessionEvent::Tick);
    let outcomes = completions(&actions);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].request_id, id);
    assert_eq!(outcomes[0].code, ErrorCode::OperationTimeout);

    // A result racing in after the deadline finds nothing.
    assert!(session.handle(now + timeout, result_ok(id)).is_empty());
}

#[test]
fn subscribe_timeout_uses_the_channel_code() {
    let now = Instant::now();
    let timeout = SessionConfig::default().request_timeout;
    let mut session = logged_in_session(now);

    let (_, actions) = session.subscribe(now, "room", Bytes::new()).unwrap();
    assert_eq!(transmits(&actions).len(), 1);

    let actions = session.handle(now + timeout, SessionEvent::Tick);
    assert_eq!(completions(&actions)[0].code, ErrorCode::ChannelSubscribeTimeout);
}

#[test]
fn suspend_then_resume_restores_subscriptions() {
    let now = Instant::now();
    let mut session = subscribed_session(now, "alpha");
    let (id, actions) = session.subscribe(now, "beta", Bytes::new()).unwrap();
    assert_eq!(transmits(&actions).len(), 1);
    session.handle(now, result_ok(id));

    let actions =
        session.handle(now, SessionEvent::TransportSuspended { service: ServiceType::Message });
    assert_eq!(link_events(&actions)[0].current, LinkState::Suspended);

    // Transport comes back. Both channels reissue; the connected event is
    // held until the round resolves.
    let actions =
        session.handle(now, SessionEvent::TransportConnected { service: ServiceType::Message });
    let frames = transmits(&actions);
    assert_eq!(frames.len(), 2);
    assert!(frames.iter().all(|f| f.op == OpKind::Subscribe));
    assert!(link_events(&actions).is_empty());

    let by_channel = |name: &str| {
        frames
            .iter()
            .find(|f| f.channel.as_ref().is_some_and(|c| c.name == name))
            .map(|f| f.request_id)
            .unwrap()
    };

    let actions = session.handle(now, result_ok(by_channel("alpha")));
    assert!(link_events(&actions).is_empty(), "event held until the last channel");

    let actions =
        session.handle(now, result_err(by_channel("beta"), ErrorCode::ChannelSubscribeFailed));
    let events = link_events(&actions);
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.current, LinkState::Connected);
    assert!(event.is_resumed);
    assert_eq!(event.affected_channels, ["alpha"]);
    assert_eq!(event.unrestored_channels, ["beta"]);

    // Restoration rounds never surface as caller completions.
    assert_eq!(completions(&actions).len(), 0);
}

#[test]
fn requests_queued_while_suspended_flush_on_resume() {
    let now = Instant::now();
    let mut session = subscribed_session(now, "room");

    session.handle(now, SessionEvent::TransportSuspended { service: ServiceType::Message });
    let (id, actions) = session
        .request(now, OpKind::Publish, Some(ChannelRef::message("room")), None, Bytes::new())
        .unwrap();
    assert!(actions.is_empty(), "held while suspended");

    let actions =
        session.handle(now, SessionEvent::TransportConnected { service: ServiceType::Message });
    let frames = transmits(&actions);
    assert!(frames.iter().any(|f| f.request_id == id && f.op == OpKind::Publish));
}

#[test]
fn resume_window_expiry_disconnects_and_fails_pending() {
    let now = Instant::now();
    let config = SessionConfig::default();
    let mut session = subscribed_session(now, "room");

    session.handle(now, SessionEvent::TransportSuspended { service: ServiceType::Message });
    let (id, _) = session
        .request(now, OpKind::Publish, Some(ChannelRef::message("room")), None, Bytes::new())
        .unwrap();

    let later = now + config.resume_timeout;
    let actions = session.handle(later, SessionEvent::Tick);

    let events = link_events(&actions);
    assert!(events.iter().any(|e| e.current == LinkState::Disconnected));
    assert!(actions.iter().any(|a| matches!(
        a,
        SessionAction::CloseLink { service: ServiceType::Message }
    )));

    let outcomes = completions(&actions);
    assert!(outcomes.iter().any(|o| o.request_id == id && !o.is_ok()));
    assert!(!session.is_logged_in());
    assert_eq!(session.outstanding_requests(), 0);
}

#[test]
fn abort_fails_every_pending_request_once() {
    let now = Instant::now();
    let mut session = logged_in_session(now);

    let (first, _) = session
        .request(now, OpKind::Publish, Some(ChannelRef::message("room")), None, Bytes::new())
        .unwrap();
    let (second, _) = session
        .request(now, OpKind::SetChannelMetadata, Some(ChannelRef::message("room")), None, Bytes::new())
        .unwrap();

    let actions = session.abort(wavelink_core::LinkReason::TokenRevoked);
    let outcomes = completions(&actions);
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.code == ErrorCode::LinkAborted));
    let mut ids: Vec<_> = outcomes.iter().map(|o| o.request_id).collect();
    ids.sort_unstable();
    assert_eq!(ids, [first, second]);

    assert_eq!(session.link_state(ServiceType::Message), LinkState::Aborted);
    assert_eq!(session.link_state(ServiceType::Stream), LinkState::Aborted);

    // Results arriving after the abort resolve nothing.
    assert!(session.handle(now, result_ok(first)).is_empty());

    // New work is refused terminally.
    let (_, actions) = session
        .request(now, OpKind::Publish, Some(ChannelRef::message("room")), None, Bytes::new())
        .unwrap();
    assert_eq!(completions(&actions)[0].code, ErrorCode::LinkAborted);
}

#[test]
fn events_for_unsubscribed_channels_are_dropped() {
    let now = Instant::now();
    let mut session = subscribed_session(now, "room");

    let actions = session.handle(now, message_event("room"));
    assert_eq!(delivered_frames(&actions).len(), 1);

    let (id, _) = session.unsubscribe(now, "room").unwrap();
    session.handle(now, result_ok(id));

    // A frame that raced the unsubscribe confirmation.
    let actions = session.handle(now, message_event("room"));
    assert!(delivered_frames(&actions).is_empty());
}

#[test]
fn session_scoped_events_bypass_channel_routing() {
    let now = Instant::now();
    let mut session = logged_in_session(now);

    let actions = session.handle(
        now,
        SessionEvent::FrameReceived(InboundFrame::Event(EventFrame {
            kind: EventKind::Token,
            channel: None,
            payload: Bytes::new(),
            timestamp: 5,
        })),
    );
    assert_eq!(delivered_frames(&actions).len(), 1);
}

#[test]
fn double_subscribe_keeps_one_registry_record() {
    let now = Instant::now();
    let mut session = logged_in_session(now);

    let (first, _) = session.subscribe(now, "room", Bytes::new()).unwrap();
    let (second, _) = session.subscribe(now, "room", Bytes::new()).unwrap();
    assert_ne!(first, second);
    assert_eq!(session.registry().len(), 1);

    // Both requests still complete independently.
    session.handle(now, result_ok(first));
    let actions = session.handle(now, result_ok(second));
    assert_eq!(completions(&actions).len(), 1);
}

#[test]
fn failed_subscribe_drops_the_pending_record() {
    let now = Instant::now();
    let mut session = logged_in_session(now);

    let (id, _) = session.subscribe(now, "room", Bytes::new()).unwrap();
    let actions = session.handle(now, result_err(id, ErrorCode::ChannelSubscribeFailed));
    assert!(!completions(&actions)[0].is_ok());
    assert!(session.registry().is_empty());
}

#[test]
fn logout_cancels_pending_and_completes_itself() {
    let now = Instant::now();
    let mut session = subscribed_session(now, "room");

    let (publish_id, _) = session
        .request(now, OpKind::Publish, Some(ChannelRef::message("room")), None, Bytes::new())
        .unwrap();

    let (logout_id, actions) = session.logout(now);
    let outcomes = completions(&actions);

    let publish = outcomes.iter().find(|o| o.request_id == publish_id).unwrap();
    assert_eq!(publish.code, ErrorCode::OperationCancelled);

    let logout = outcomes.iter().find(|o| o.request_id == logout_id).unwrap();
    assert!(logout.is_ok());

    assert!(!session.is_logged_in());
    assert!(session.registry().is_empty());
    assert_eq!(session.link_state(ServiceType::Message), LinkState::Disconnected);
    assert_eq!(session.outstanding_requests(), 0);
}

#[test]
fn stream_join_opens_the_stream_link() {
    let now = Instant::now();
    let mut session = logged_in_session(now);

    let (join_id, actions) = session.join(now, "arena", Bytes::new()).unwrap();
    assert!(actions.iter().any(|a| matches!(
        a,
        SessionAction::OpenLink { service: ServiceType::Stream }
    )));
    assert_eq!(session.link_state(ServiceType::Stream), LinkState::Connecting);

    let actions =
        session.handle(now, SessionEvent::TransportConnected { service: ServiceType::Stream });
    let frames = transmits(&actions);
    assert_eq!(frames[0].request_id, join_id);

    let actions = session.handle(now, result_ok(join_id));
    assert!(completions(&actions)[0].is_ok());
    assert_eq!(session.link_state(ServiceType::Stream), LinkState::Connected);
}

#[test]
fn stream_restoration_replays_confirmed_topics() {
    let now = Instant::now();
    let mut session = logged_in_session(now);

    let (join_id, _) = session.join(now, "arena", Bytes::new()).unwrap();
    session.handle(now, SessionEvent::TransportConnected { service: ServiceType::Stream });
    session.handle(now, result_ok(join_id));

    let (topic_id, actions) =
        session.join_topic(now, "arena", "motion", Bytes::from_static(b"qos")).unwrap();
    assert_eq!(transmits(&actions).len(), 1);
    session.handle(now, result_ok(topic_id));

    session.handle(now, SessionEvent::TransportSuspended { service: ServiceType::Stream });
    let actions =
        session.handle(now, SessionEvent::TransportConnected { service: ServiceType::Stream });
    let frames = transmits(&actions);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].op, OpKind::Join);
    let rejoin_id = frames[0].request_id;

    // The channel restore triggers the topic replay, then releases the held
    // link event.
    let actions = session.handle(now, result_ok(rejoin_id));
    let frames = transmits(&actions);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].op, OpKind::JoinTopic);
    assert_eq!(frames[0].payload, Bytes::from_static(b"qos"));
    let events = link_events(&actions);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].affected_channels, ["arena"]);
}

#[test]
fn rejected_login_brings_the_link_down() {
    let now = Instant::now();
    let mut session = Session::new(SessionConfig::default());

    let (login_id, _) = session.login(now, Bytes::from_static(b"bad"));
    session.handle(now, SessionEvent::TransportConnected { service: ServiceType::Message });

    let actions = session.handle(now, result_err(login_id, ErrorCode::InvalidToken));
    let outcomes = completions(&actions);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].code, ErrorCode::InvalidToken);
    assert!(!session.is_logged_in());
    assert_eq!(session.link_state(ServiceType::Message), LinkState::Disconnected);
}
