//! Tokio driver around the session core.
//!
//! The [`Client`] wraps a [`Session`] in a mutex and runs three tasks:
//!
//! - the driver loop, feeding session events in and executing the returned
//!   actions
//! - the delivery loop, decoding push events and invoking the
//!   [`EventSink`](crate::EventSink)
//! - the tick loop, driving timeout processing
//!
//! The session mutex is never held across an await; each event is processed
//! to a batch of actions under the lock, and the actions are executed after
//! it is released.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, Weak},
    time::Instant,
};

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use wavelink_core::{
    LinkReason, OperationOutcome, PushEvent, Session, SessionAction, SessionError, SessionEvent,
};
use wavelink_proto::{
    ChannelRef, MAX_MESSAGE_PAYLOAD, OpKind, ProtocolError, RequestFrame, RequestId, ServiceType,
    payload::to_payload,
    types::{PublishOptions, SubscribeOptions},
};

use crate::{
    config::ClientConfig,
    error::ClientError,
    history::History,
    lock::Lock,
    payloads::{LoginPayload, PublishPayload, RenewTokenPayload, SubscribePayload},
    presence::Presence,
    sink::{self, EventSink},
    storage::Storage,
    stream::StreamChannel,
    transport::{Connector, TransportSignal},
};

/// Completion of one issued operation.
///
/// The request id is available immediately; [`outcome`](Self::outcome)
/// resolves when the session completes the request.
#[derive(Debug)]
pub struct OperationHandle {
    request_id: RequestId,
    rx: oneshot::Receiver<OperationOutcome>,
}

impl OperationHandle {
    /// Id assigned to the request.
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Wait for the operation to complete.
    pub async fn outcome(self) -> Result<OperationOutcome, ClientError> {
        self.rx.await.map_err(|_| ClientError::Closed)
    }
}

pub(crate) struct DriverState {
    pub(crate) session: Session<Instant>,
    pub(crate) completions: HashMap<RequestId, oneshot::Sender<OperationOutcome>>,
    pub(crate) links: HashMap<ServiceType, mpsc::Sender<RequestFrame>>,
}

pub(crate) struct Inner<C> {
    pub(crate) config: ClientConfig,
    pub(crate) connector: C,
    pub(crate) state: Mutex<DriverState>,
    pub(crate) session_tx: mpsc::Sender<SessionEvent>,
    pub(crate) events_tx: mpsc::Sender<PushEvent>,
}

/// Messaging client handle.
///
/// Cheap to clone; all clones share one session. Dropping the last clone
/// (and any [`StreamChannel`]s) shuts the driver tasks down.
pub struct Client<C: Connector> {
    inner: Arc<Inner<C>>,
}

impl<C: Connector> Clone for Client<C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<C: Connector> Client<C> {
    /// Build a client and spawn its driver tasks on the current runtime.
    pub fn new(config: ClientConfig, connector: C, sink: Arc<dyn EventSink>) -> Self {
        let (session_tx, session_rx) = mpsc::channel(64);
        let (events_tx, events_rx) = mpsc::channel(config.event_queue_depth);

        let inner = Arc::new(Inner {
            state: Mutex::new(DriverState {
                session: Session::new(config.session.clone()),
                completions: HashMap::new(),
                links: HashMap::new(),
            }),
            config,
            connector,
            session_tx,
            events_tx,
        });

        tokio::spawn(drive(Arc::downgrade(&inner), session_rx));
        tokio::spawn(deliver(Arc::downgrade(&inner), events_rx, sink));
        tokio::spawn(tick(Arc::downgrade(&inner)));

        Self { inner }
    }

    /// Identity this client was configured with.
    pub fn user_id(&self) -> &str {
        &self.inner.config.user_id
    }

    /// Authenticate and open the session.
    pub async fn login(&self, token: &str) -> Result<OperationHandle, ClientError> {
        let payload = to_payload(&LoginPayload {
            user_id: self.inner.config.user_id.clone(),
            token: token.to_owned(),
        })?;
        self.inner.submit(move |session, now| Ok(session.login(now, payload))).await
    }

    /// Close the session. Pending operations complete as cancelled.
    pub async fn logout(&self) -> Result<OperationHandle, ClientError> {
        self.inner.submit(|session, now| Ok(session.logout(now))).await
    }

    /// Replace the session token before it expires.
    pub async fn renew_token(&self, token: &str) -> Result<OperationHandle, ClientError> {
        let payload = to_payload(&RenewTokenPayload { token: token.to_owned() })?;
        self.inner.request_op(OpKind::RenewToken, None, None, payload).await
    }

    /// Publish a message to a message channel.
    pub async fn publish(
        &self,
        channel: &str,
        message: &[u8],
        options: &PublishOptions,
    ) -> Result<OperationHandle, ClientError> {
        if message.len() > MAX_MESSAGE_PAYLOAD {
            return Err(ProtocolError::PayloadTooLarge {
                size: message.len(),
                max: MAX_MESSAGE_PAYLOAD,
            }
            .into());
        }
        let payload = to_payload(&PublishPayload {
            message: message.to_vec(),
            options: options.clone(),
        })?;
        self.inner
            .request_op(OpKind::Publish, Some(ChannelRef::message(channel)), None, payload)
            .await
    }

    /// Subscribe to a message channel.
    pub async fn subscribe(
        &self,
        channel: &str,
        options: &SubscribeOptions,
    ) -> Result<OperationHandle, ClientError> {
        let payload = to_payload(&SubscribePayload { options: options.clone() })?;
        let channel = channel.to_owned();
        self.inner
            .submit(move |session, now| session.subscribe(now, &channel, payload))
            .await
    }

    /// Unsubscribe from a message channel.
    pub async fn unsubscribe(&self, channel: &str) -> Result<OperationHandle, ClientError> {
        let channel = channel.to_owned();
        self.inner.submit(move |session, now| session.unsubscribe(now, &channel)).await
    }

    /// Handle to a stream channel. Cheap; no I/O until
    /// [`join`](StreamChannel::join).
    pub fn create_stream_channel(&self, channel: &str) -> Result<StreamChannel<C>, ClientError> {
        if channel.is_empty() {
            return Err(SessionError::InvalidChannelName { reason: "empty name".to_owned() }.into());
        }
        Ok(StreamChannel::new(Arc::downgrade(&self.inner), channel.to_owned()))
    }

    /// Channel and user metadata operations.
    pub fn storage(&self) -> Storage<'_, C> {
        Storage::new(&self.inner)
    }

    /// Distributed lock operations.
    pub fn lock(&self) -> Lock<'_, C> {
        Lock::new(&self.inner)
    }

    /// Presence queries and state operations.
    pub fn presence(&self) -> Presence<'_, C> {
        Presence::new(&self.inner)
    }

    /// Stored message queries.
    pub fn history(&self) -> History<'_, C> {
        History::new(&self.inner)
    }
}

impl<C: Connector> Inner<C> {
    /// Issue one operation against the session and register its completion.
    ///
    /// The completion sender is registered under the same lock that issued
    /// the request, so a racing tick cannot expire the request before its
    /// waiter exists.
    pub(crate) async fn submit(
        self: &Arc<Self>,
        issue: impl FnOnce(
            &mut Session<Instant>,
            Instant,
        ) -> Result<(RequestId, Vec<SessionAction>), SessionError>,
    ) -> Result<OperationHandle, ClientError> {
        let (request_id, actions, rx) = {
            let mut state = self.state.lock().map_err(|_| ClientError::Closed)?;
            let (request_id, actions) = issue(&mut state.session, Instant::now())?;
            let (tx, rx) = oneshot::channel();
            state.completions.insert(request_id, tx);
            (request_id, actions, rx)
        };
        self.execute(actions).await;
        Ok(OperationHandle { request_id, rx })
    }

    pub(crate) async fn request_op(
        self: &Arc<Self>,
        op: OpKind,
        channel: Option<ChannelRef>,
        topic: Option<String>,
        payload: Bytes,
    ) -> Result<OperationHandle, ClientError> {
        self.submit(move |session, now| session.request(now, op, channel, topic, payload)).await
    }

    /// Execute one batch of session actions.
    pub(crate) async fn execute(self: &Arc<Self>, actions: Vec<SessionAction>) {
        for action in actions {
            match action {
                SessionAction::Transmit(frame) => {
                    let service = frame.service();
                    let sender = {
                        let Ok(state) = self.state.lock() else { return };
                        state.links.get(&service).cloned()
                    };
                    match sender {
                        Some(sender) => {
                            // A send failure means the link died; the read
                            // loop reports that separately.
                            if sender.send(frame).await.is_err() {
                                debug!(?service, "dropping frame for closed link");
                            }
                        },
                        None => debug!(?service, "dropping frame, no link"),
                    }
                },
                SessionAction::OpenLink { service } => {
                    tokio::spawn(open_link(Arc::clone(self), service));
                },
                SessionAction::CloseLink { service } => {
                    if let Ok(mut state) = self.state.lock() {
                        state.links.remove(&service);
                    }
                },
                SessionAction::Complete(outcome) => {
                    let sender = {
                        let Ok(mut state) = self.state.lock() else { return };
                        state.completions.remove(&outcome.request_id)
                    };
                    if let Some(sender) = sender {
                        // The caller may have dropped the handle.
                        let _ = sender.send(outcome);
                    }
                },
                SessionAction::Deliver(event) => {
                    if self.events_tx.send(event).await.is_err() {
                        warn!("event delivery loop gone, dropping event");
                    }
                },
            }
        }
    }
}

/// Driver loop: one session event in, one action batch out.
async fn drive<C: Connector>(
    inner: Weak<Inner<C>>,
    mut session_rx: mpsc::Receiver<SessionEvent>,
) {
    while let Some(event) = session_rx.recv().await {
        let Some(inner) = inner.upgrade() else { break };
        let actions = {
            let Ok(mut state) = inner.state.lock() else { break };
            state.session.handle(Instant::now(), event)
        };
        inner.execute(actions).await;
    }
}

/// Delivery loop: decode push events and invoke the sink in arrival order.
async fn deliver<C: Connector>(
    inner: Weak<Inner<C>>,
    mut events_rx: mpsc::Receiver<PushEvent>,
    sink: Arc<dyn EventSink>,
) {
    let legacy = inner
        .upgrade()
        .is_some_and(|inner| inner.config.legacy_connection_events);

    while let Some(event) = events_rx.recv().await {
        let revoked = sink::deliver(sink.as_ref(), legacy, &event);
        if revoked && let Some(inner) = inner.upgrade() {
            warn!("token revoked, aborting session");
            let actions = {
                let Ok(mut state) = inner.state.lock() else { break };
                state.session.abort(LinkReason::TokenRevoked)
            };
            // This loop is the event queue's only consumer; pushing the
            // abort's own events onto it can never drain once it is full.
            // Deliver them straight to the sink instead.
            let mut rest = Vec::with_capacity(actions.len());
            for action in actions {
                match action {
                    SessionAction::Deliver(event) => {
                        sink::deliver(sink.as_ref(), legacy, &event);
                    },
                    other => rest.push(other),
                }
            }
            inner.execute(rest).await;
        }
    }
}

/// Tick loop: periodic deadline sweeps until the client is dropped.
async fn tick<C: Connector>(inner: Weak<Inner<C>>) {
    let Some(interval) = inner.upgrade().map(|inner| inner.config.tick_interval) else {
        return;
    };
    let mut timer = tokio::time::interval(interval);
    timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        timer.tick().await;
        let Some(inner) = inner.upgrade() else { break };
        if inner.session_tx.send(SessionEvent::Tick).await.is_err() {
            break;
        }
    }
}

/// Dial one service link and pump its signals into the driver.
async fn open_link<C: Connector>(inner: Arc<Inner<C>>, service: ServiceType) {
    let session_tx = inner.session_tx.clone();
    match inner.connector.open(service).await {
        Ok(link) => {
            if let Ok(mut state) = inner.state.lock() {
                state.links.insert(service, link.to_server);
            }
            drop(inner);
            read_loop(service, link.signals, session_tx).await;
        },
        Err(error) => {
            warn!(?service, %error, "link open failed");
            let _ = session_tx.send(SessionEvent::TransportDisconnected { service }).await;
        },
    }
}

async fn read_loop(
    service: ServiceType,
    mut signals: mpsc::Receiver<TransportSignal>,
    session_tx: mpsc::Sender<SessionEvent>,
) {
    while let Some(signal) = signals.recv().await {
        let event = match signal {
            TransportSignal::Frame(frame) => SessionEvent::FrameReceived(frame),
            TransportSignal::Connected => SessionEvent::TransportConnected { service },
            TransportSignal::Suspended => SessionEvent::TransportSuspended { service },
            TransportSignal::Disconnected => SessionEvent::TransportDisconnected { service },
        };
        if session_tx.send(event).await.is_err() {
            return;
        }
    }
    // Signal stream closed without an explicit disconnect.
    let _ = session_tx.send(SessionEvent::TransportDisconnected { service }).await;
}
