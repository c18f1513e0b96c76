//! Transport seam between the driver and the wire.
//!
//! The session core never sees bytes; each service link is a pair of
//! channels carrying decoded frames. [`Connector`] is the production seam
//! (dial a server, hand back a [`LinkHandle`]); [`MemoryConnector`] wires
//! links to an in-process peer for tests and local tooling.

use std::sync::Mutex;

use thiserror::Error;
use tokio::sync::mpsc;
use wavelink_proto::{InboundFrame, RequestFrame, ServiceType};

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Dialing the server failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The link dropped mid-use.
    #[error("link closed: {0}")]
    Closed(String),
}

/// Connectivity and frame signals flowing up from one service link.
#[derive(Debug)]
pub enum TransportSignal {
    /// Decoded frame from the server.
    Frame(InboundFrame),
    /// The link reached the server and finished its handshake.
    Connected,
    /// The link dropped but the transport is retrying.
    Suspended,
    /// The link is gone and the transport gave up.
    Disconnected,
}

/// One established service link.
///
/// Dropping `to_server` tears the link down; the signal stream ends when the
/// transport side is done.
#[derive(Debug)]
pub struct LinkHandle {
    /// Outbound frames.
    pub to_server: mpsc::Sender<RequestFrame>,
    /// Inbound frames and connectivity changes.
    pub signals: mpsc::Receiver<TransportSignal>,
}

/// Opens service links on demand.
///
/// The driver calls [`open`](Connector::open) once per `OpenLink` action and
/// reads the returned handle until it closes.
pub trait Connector: Send + Sync + 'static {
    /// Establish the link for one service.
    fn open(
        &self,
        service: ServiceType,
    ) -> impl Future<Output = Result<LinkHandle, TransportError>> + Send;
}

/// Server side of one in-memory link.
#[derive(Debug)]
pub struct MemoryLink {
    /// Service the client opened this link for.
    pub service: ServiceType,
    /// Frames the client transmitted.
    pub from_client: mpsc::Receiver<RequestFrame>,
    /// Signals to push back at the client.
    pub to_client: mpsc::Sender<TransportSignal>,
}

/// In-process connector: every opened link surfaces as a [`MemoryLink`] on
/// the scripted server side.
#[derive(Debug)]
pub struct MemoryConnector {
    links: mpsc::Sender<MemoryLink>,
    depth: usize,
    refuse: Mutex<bool>,
}

impl MemoryConnector {
    /// Connector plus the stream of server-side link ends.
    pub fn new(depth: usize) -> (Self, mpsc::Receiver<MemoryLink>) {
        let (links, accepted) = mpsc::channel(8);
        (Self { links, depth, refuse: Mutex::new(false) }, accepted)
    }

    /// Make subsequent opens fail, simulating an unreachable server.
    pub fn set_refuse(&self, refuse: bool) {
        if let Ok(mut guard) = self.refuse.lock() {
            *guard = refuse;
        }
    }
}

impl Connector for MemoryConnector {
    async fn open(&self, service: ServiceType) -> Result<LinkHandle, TransportError> {
        if self.refuse.lock().map(|guard| *guard).unwrap_or(false) {
            return Err(TransportError::Connection("refused".to_owned()));
        }

        let (to_server, from_client) = mpsc::channel(self.depth);
        let (to_client, signals) = mpsc::channel(self.depth);
        self.links
            .send(MemoryLink { service, from_client, to_client })
            .await
            .map_err(|_| TransportError::Closed("acceptor dropped".to_owned()))?;
        Ok(LinkHandle { to_server, signals })
    }
}
