//! Session events and actions.
//!
//! The driver feeds [`SessionEvent`]s into [`crate::Session::handle`] and
//! executes the returned [`SessionAction`]s. The caller is responsible for:
//!
//! - receiving decoded frames from the transport
//! - forwarding transport link signals (up, suspended, down)
//! - driving time forward via ticks for timeout processing

use wavelink_proto::{
    ChannelRef, ErrorCode, EventFrame, InboundFrame, OpKind, RequestId, ServiceType,
};

use crate::link::LinkStateEvent;

/// Input to the session state machine.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Decoded frame received from the transport.
    FrameReceived(InboundFrame),

    /// Periodic tick for deadline sweeps and suspension timeouts.
    Tick,

    /// Transport handshake for a service completed.
    TransportConnected {
        /// Service whose transport came up.
        service: ServiceType,
    },

    /// Transport for a service dropped but may auto-resume.
    TransportSuspended {
        /// Service whose transport was lost.
        service: ServiceType,
    },

    /// Transport for a service is gone for good.
    TransportDisconnected {
        /// Service whose transport closed.
        service: ServiceType,
    },
}

/// Output of the session state machine, executed by the driver.
#[derive(Debug, Clone)]
pub enum SessionAction {
    /// Send this request over the transport.
    Transmit(wavelink_proto::RequestFrame),

    /// Bring up the transport for a service.
    OpenLink {
        /// Service to connect.
        service: ServiceType,
    },

    /// Tear down the transport for a service.
    CloseLink {
        /// Service to disconnect.
        service: ServiceType,
    },

    /// Deliver an operation completion to the original caller.
    ///
    /// Exactly one of these is emitted per issued request.
    Complete(OperationOutcome),

    /// Deliver a push event to the application's event sink.
    Deliver(PushEvent),
}

/// Completion of one issued request.
///
/// One generic shape for every operation kind; the payload is decoded
/// according to `op` at the edge, which keeps the per-operation result surface
/// from multiplying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationOutcome {
    /// Request this outcome completes.
    pub request_id: RequestId,
    /// Operation that was issued.
    pub op: OpKind,
    /// Target channel, when the operation had one.
    pub channel: Option<ChannelRef>,
    /// Target topic, for topic operations.
    pub topic: Option<String>,
    /// Result code; [`ErrorCode::Ok`] on success.
    pub code: ErrorCode,
    /// Opaque result payload, empty for failures and plain acks.
    pub payload: bytes::Bytes,
}

impl OperationOutcome {
    /// True when the operation succeeded.
    pub fn is_ok(&self) -> bool {
        self.code.is_ok()
    }

    /// Decode the result payload into its typed shape.
    ///
    /// See [`wavelink_proto::results`] for the shape each query operation
    /// returns.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, wavelink_proto::ProtocolError> {
        wavelink_proto::payload::from_payload(&self.payload)
    }
}

/// Unsolicited event bound for the application's event sink.
///
/// Frames for one channel are delivered in arrival order; link-state events
/// are produced locally by the state machine.
#[derive(Debug, Clone)]
pub enum PushEvent {
    /// A link transition.
    LinkState(LinkStateEvent),
    /// A server push, still carrying its opaque payload.
    Frame(EventFrame),
}
