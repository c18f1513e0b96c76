//! Decoded frame model for the Wavelink messaging protocol.
//!
//! The session core and the client driver exchange *decoded* frames with the
//! transport: the transport owns the byte format, this crate owns the shapes.
//! Three envelopes cover everything on the link:
//!
//! - [`RequestFrame`]: an outbound correlated operation
//! - [`ResultFrame`]: the inbound answer to a request, matched by request id
//! - [`EventFrame`]: an inbound unsolicited server push, matched by event kind
//!
//! Payloads inside the envelopes are opaque CBOR ([`bytes::Bytes`]); the core
//! routes on the envelope alone and never interprets payload contents. The
//! typed value and event payloads ([`types`], [`events`]) are encoded and
//! decoded at the edges with [`payload::to_payload`] / [`payload::from_payload`].

mod codes;
mod errors;
mod frame;
mod op;

pub mod events;
pub mod payload;
pub mod results;
pub mod types;

pub use codes::{ErrorCode, error_reason};
pub use errors::{ProtocolError, Result};
pub use frame::{ChannelRef, EventFrame, EventKind, InboundFrame, RequestFrame, ResultFrame};
pub use op::{ChannelType, OpKind, ServiceType};

/// Request identifier, unique and strictly increasing within one session.
pub type RequestId = u64;

/// Server UTC time in milliseconds.
pub type Timestamp = u64;

/// Largest payload accepted for a message-channel publish (32 KiB).
pub const MAX_MESSAGE_PAYLOAD: usize = 32 * 1024;

/// Largest payload accepted for a stream-topic publish (1 KiB).
pub const MAX_STREAM_PAYLOAD: usize = 1024;

/// Version of the protocol model, from the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
