//! Application event sink.
//!
//! Implement [`EventSink`] for the callbacks you care about; every method has
//! a no-op default. Callbacks run on a dedicated delivery task, in arrival
//! order, decoupled from the transport read loops.

use tracing::warn;
use wavelink_core::{LinkReason, LinkState, LinkStateEvent, PushEvent};
use wavelink_proto::{
    EventFrame, EventKind,
    events::{LockEvent, MessageEvent, PresenceEvent, StorageEvent, TokenEvent, TokenEventType, TopicEvent},
    payload::from_payload,
};

/// Receiver for unsolicited events.
#[allow(unused_variables)]
pub trait EventSink: Send + Sync {
    /// Link state transition on either service.
    fn on_link_state(&self, event: &LinkStateEvent) {}

    /// Message published to a subscribed channel or topic.
    fn on_message(&self, event: &MessageEvent) {}

    /// Presence change in a watched channel.
    fn on_presence(&self, event: &PresenceEvent) {}

    /// Topic registration change in a joined stream channel.
    fn on_topic(&self, event: &TopicEvent) {}

    /// Lock lifecycle change.
    fn on_lock(&self, event: &LockEvent) {}

    /// Metadata change on a watched channel or user.
    fn on_storage(&self, event: &StorageEvent) {}

    /// Token lifecycle notification.
    fn on_token(&self, event: &TokenEvent) {}

    /// Coarse connection callback kept for callers migrating from it.
    ///
    /// Fires only when [`crate::ClientConfig::legacy_connection_events`] is
    /// set; [`on_link_state`](EventSink::on_link_state) is the replacement.
    fn on_connection_state_changed(&self, state: LinkState, reason: LinkReason) {}
}

/// Sink that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {}

/// Decode and deliver one push event.
///
/// Returns true when the event revoked the session's token and the driver
/// must abort.
pub(crate) fn deliver(sink: &dyn EventSink, legacy: bool, event: &PushEvent) -> bool {
    match event {
        PushEvent::LinkState(link) => {
            sink.on_link_state(link);
            if legacy {
                sink.on_connection_state_changed(link.current, link.reason);
            }
            false
        },
        PushEvent::Frame(frame) => deliver_frame(sink, frame),
    }
}

fn deliver_frame(sink: &dyn EventSink, frame: &EventFrame) -> bool {
    match frame.kind {
        EventKind::Message => {
            if let Some(event) = decode::<MessageEvent>(frame) {
                sink.on_message(&event);
            }
        },
        EventKind::Presence => {
            if let Some(event) = decode::<PresenceEvent>(frame) {
                sink.on_presence(&event);
            }
        },
        EventKind::Topic => {
            if let Some(event) = decode::<TopicEvent>(frame) {
                sink.on_topic(&event);
            }
        },
        EventKind::Lock => {
            if let Some(event) = decode::<LockEvent>(frame) {
                sink.on_lock(&event);
            }
        },
        EventKind::Storage => {
            if let Some(event) = decode::<StorageEvent>(frame) {
                sink.on_storage(&event);
            }
        },
        EventKind::Token => {
            if let Some(event) = decode::<TokenEvent>(frame) {
                let revoked = event.event_type == TokenEventType::Revoked;
                sink.on_token(&event);
                return revoked;
            }
        },
    }
    false
}

fn decode<T: serde::de::DeserializeOwned>(frame: &EventFrame) -> Option<T> {
    match from_payload(&frame.payload) {
        Ok(event) => Some(event),
        Err(error) => {
            warn!(kind = ?frame.kind, %error, "dropping undecodable event payload");
            None
        },
    }
}
