//! Frame envelopes exchanged with the transport.
//!
//! The transport hands the core fully decoded frames and accepts fully built
//! request frames; byte formats never cross this boundary. Payloads stay as
//! opaque [`Bytes`] so routing touches only the envelope.

use bytes::Bytes;

use crate::{ChannelType, ErrorCode, OpKind, RequestId, ServiceType, Timestamp};

/// Channel reference on a request envelope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelRef {
    /// Channel name.
    pub name: String,
    /// Channel dimension.
    pub channel_type: ChannelType,
}

impl ChannelRef {
    /// Reference to a message channel.
    pub fn message(name: impl Into<String>) -> Self {
        Self { name: name.into(), channel_type: ChannelType::Message }
    }

    /// Reference to a stream channel.
    pub fn stream(name: impl Into<String>) -> Self {
        Self { name: name.into(), channel_type: ChannelType::Stream }
    }
}

/// Outbound correlated operation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFrame {
    /// Correlates the eventual result frame.
    pub request_id: RequestId,
    /// Operation this frame carries.
    pub op: OpKind,
    /// Target channel, absent for session-scoped operations.
    pub channel: Option<ChannelRef>,
    /// Opaque CBOR payload (operation arguments).
    pub payload: Bytes,
}

impl RequestFrame {
    /// Service whose link must carry this request.
    pub fn service(&self) -> ServiceType {
        self.op.service()
    }
}

/// Inbound unit from the transport: either a correlated result or a push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// Answer to a previously issued request.
    Result(ResultFrame),
    /// Unsolicited server push.
    Event(EventFrame),
}

/// Result of a correlated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultFrame {
    /// Request this result answers.
    pub request_id: RequestId,
    /// Outcome reported by the server.
    pub code: ErrorCode,
    /// Opaque CBOR payload (operation-specific result data).
    pub payload: Bytes,
}

impl ResultFrame {
    /// Success result with no payload.
    pub fn ok(request_id: RequestId) -> Self {
        Self { request_id, code: ErrorCode::Ok, payload: Bytes::new() }
    }

    /// Failure result with no payload.
    pub fn err(request_id: RequestId, code: ErrorCode) -> Self {
        Self { request_id, code, payload: Bytes::new() }
    }
}

/// Kind tag for push events.
///
/// Link-state events are produced locally by the session core when its state
/// machine transitions; they never arrive as frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Message published to a subscribed channel or topic.
    Message,
    /// Presence change in a watched channel.
    Presence,
    /// Topic joined or left in a stream channel.
    Topic,
    /// Lock set, acquired, released, or expired.
    Lock,
    /// Metadata changed on a watched channel or user.
    Storage,
    /// Token lifecycle notification (will expire, revoked).
    Token,
}

/// Unsolicited server push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFrame {
    /// What the payload describes.
    pub kind: EventKind,
    /// Channel the event belongs to; `None` for session-scoped events.
    pub channel: Option<String>,
    /// Opaque CBOR payload (see [`crate::events`] for the decoded shapes).
    pub payload: Bytes,
    /// Server UTC time of the event in milliseconds.
    pub timestamp: Timestamp,
}

impl EventFrame {
    /// True when this event must be routed through the subscription registry.
    ///
    /// Token events are session-scoped and bypass channel routing.
    pub fn is_channel_scoped(&self) -> bool {
        self.channel.is_some() && self.kind != EventKind::Token
    }
}
