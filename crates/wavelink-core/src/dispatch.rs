//! Inbound dispatch: result correlation, event routing, deadline sweeps, and
//! post-reconnect restoration.
//!
//! Split from `session` so the issue paths and the inbound paths read
//! independently; everything here is still `impl Session`.

use std::collections::BTreeMap;

use bytes::Bytes;
use tracing::{debug, warn};
use wavelink_proto::{
    ChannelRef, ChannelType, ErrorCode, EventFrame, InboundFrame, OpKind, RequestFrame,
    ResultFrame, ServiceType,
};

use crate::{
    TimePoint,
    correlator::{PendingRequest, RequestOrigin},
    event::{PushEvent, SessionAction},
    link::{LinkOperation, LinkReason},
    session::Session,
};

impl<I: TimePoint> Session<I> {
    pub(crate) fn on_frame(&mut self, now: I, frame: InboundFrame) -> Vec<SessionAction> {
        match frame {
            InboundFrame::Result(result) => self.on_result(now, result),
            InboundFrame::Event(event) => self.on_event(event),
        }
    }

    /// Correlate a server result with its pending request.
    ///
    /// Removal from the pending map is the exactly-once gate: a duplicate or
    /// stale result finds nothing and is dropped.
    fn on_result(&mut self, now: I, result: ResultFrame) -> Vec<SessionAction> {
        let Some(pending) = self.correlator.resolve(result.request_id) else {
            debug!(request_id = result.request_id, "dropping stale or duplicate result");
            return Vec::new();
        };

        match pending.origin {
            RequestOrigin::Restoration => self.on_restore_result(now, &pending, &result),
            RequestOrigin::Application => self.on_application_result(now, pending, result),
        }
    }

    /// A result for a request the session issued itself during restoration.
    /// Never surfaces as a completion; it only updates the registry and may
    /// release the held link-state event.
    fn on_restore_result(
        &mut self,
        now: I,
        pending: &PendingRequest<I>,
        result: &ResultFrame,
    ) -> Vec<SessionAction> {
        let Some(channel_ref) = &pending.channel else {
            return Vec::new();
        };
        let ok = result.code.is_ok();

        // Topic replays ride behind their channel's restore and do not gate
        // the link-state event.
        if let Some(topic) = &pending.topic {
            if ok {
                self.registry.activate_topic(&channel_ref.name, topic);
            } else {
                warn!(
                    channel = %channel_ref.name,
                    topic = %topic,
                    code = result.code.code(),
                    "topic replay rejected, dropping membership"
                );
                self.registry.remove_topic(&channel_ref.name, topic);
            }
            return Vec::new();
        }

        self.registry.complete_restore(&channel_ref.name, channel_ref.channel_type, ok);

        let mut actions = Vec::new();
        if ok && channel_ref.channel_type == ChannelType::Stream {
            for (topic, options) in self.registry.active_topics(&channel_ref.name) {
                actions.push(self.issue_restore_topic(now, channel_ref.clone(), topic, options));
            }
        }

        let service = pending.service();
        let ts = self.last_server_time;
        if let Some(event) =
            self.link_mut(service).restore_result(pending.request_id, ok, ts)
        {
            actions.push(SessionAction::Deliver(PushEvent::LinkState(event)));
        }
        actions
    }

    fn on_application_result(
        &mut self,
        now: I,
        pending: PendingRequest<I>,
        result: ResultFrame,
    ) -> Vec<SessionAction> {
        let mut actions = Vec::new();
        let ok = result.code.is_ok();

        match pending.op {
            OpKind::Login => {
                if ok {
                    self.logged_in = true;
                } else {
                    // A rejected login closes the link; queued or in-flight
                    // requests behind it cannot succeed.
                    let ts = self.last_server_time;
                    if let Some(event) = self.message_link.disconnect(
                        LinkOperation::Login,
                        LinkReason::ServerReject,
                        ts,
                    ) {
                        actions.push(SessionAction::Deliver(PushEvent::LinkState(event)));
                        actions.push(SessionAction::CloseLink { service: ServiceType::Message });
                    }
                    actions.extend(self.fail_service(ServiceType::Message, ErrorCode::NotConnected));
                }
            },
            OpKind::Subscribe | OpKind::Join => {
                if let Some(channel_ref) = &pending.channel {
                    if ok {
                        self.registry.activate(&channel_ref.name, channel_ref.channel_type);
                        if channel_ref.channel_type == ChannelType::Stream {
                            // A re-join after a link drop replays confirmed
                            // topic registrations.
                            for (topic, options) in self.registry.active_topics(&channel_ref.name)
                            {
                                actions.push(self.issue_restore_topic(
                                    now,
                                    channel_ref.clone(),
                                    topic,
                                    options,
                                ));
                            }
                        }
                    } else {
                        self.registry.subscribe_failed(&channel_ref.name, channel_ref.channel_type);
                    }
                }
            },
            OpKind::Unsubscribe | OpKind::Leave => {
                if let Some(channel_ref) = &pending.channel {
                    if ok {
                        self.registry.finish_removal(&channel_ref.name, channel_ref.channel_type);
                    } else {
                        self.registry.cancel_removal(&channel_ref.name, channel_ref.channel_type);
                    }
                }
            },
            OpKind::JoinTopic => {
                if let (Some(channel_ref), Some(topic)) = (&pending.channel, &pending.topic) {
                    if ok {
                        self.registry.activate_topic(&channel_ref.name, topic);
                    } else {
                        self.registry.remove_topic(&channel_ref.name, topic);
                    }
                }
            },
            OpKind::LeaveTopic => {
                if let (Some(channel_ref), Some(topic)) = (&pending.channel, &pending.topic)
                    && ok
                {
                    self.registry.remove_topic(&channel_ref.name, topic);
                }
            },
            _ => {},
        }

        actions.push(SessionAction::Complete(Self::outcome(&pending, result.code, result.payload)));
        actions
    }

    /// Route a server push event to the application sink.
    ///
    /// Channel-scoped events for channels with no registry record are dropped
    /// so a completed unsubscribe is a hard cutoff even when frames race it.
    fn on_event(&mut self, event: EventFrame) -> Vec<SessionAction> {
        if event.timestamp > self.last_server_time {
            self.last_server_time = event.timestamp;
        }

        if event.is_channel_scoped()
            && let Some(channel) = &event.channel
            && !self.registry.is_routable(channel)
        {
            debug!(channel = %channel, kind = ?event.kind, "dropping event for unknown channel");
            return Vec::new();
        }

        vec![SessionAction::Deliver(PushEvent::Frame(event))]
    }

    /// Periodic sweep: request deadlines and the suspended-link resume window.
    pub(crate) fn on_tick(&mut self, now: I) -> Vec<SessionAction> {
        let mut actions = Vec::new();

        for pending in self.correlator.expire(now) {
            match pending.origin {
                RequestOrigin::Restoration => {
                    let Some(channel_ref) = &pending.channel else { continue };
                    if let Some(topic) = &pending.topic {
                        warn!(
                            channel = %channel_ref.name,
                            topic = %topic,
                            "topic replay timed out, dropping membership"
                        );
                        self.registry.remove_topic(&channel_ref.name, topic);
                        continue;
                    }
                    self.registry.complete_restore(
                        &channel_ref.name,
                        channel_ref.channel_type,
                        false,
                    );
                    let service = pending.service();
                    let ts = self.last_server_time;
                    if let Some(event) =
                        self.link_mut(service).restore_result(pending.request_id, false, ts)
                    {
                        actions.push(SessionAction::Deliver(PushEvent::LinkState(event)));
                    }
                },
                RequestOrigin::Application => {
                    let code = Self::timeout_code(pending.op);
                    self.rollback_registry(&pending, code);
                    actions.push(SessionAction::Complete(Self::outcome(
                        &pending,
                        code,
                        Bytes::new(),
                    )));
                },
            }
        }

        for service in [ServiceType::Message, ServiceType::Stream] {
            if !self.link(service).resume_expired(now, self.config.resume_timeout) {
                continue;
            }
            let ts = self.last_server_time;
            if let Some(event) = self.link_mut(service).disconnect(
                LinkOperation::ReconnectTimeout,
                LinkReason::ResumeTimeout,
                ts,
            ) {
                actions.push(SessionAction::Deliver(PushEvent::LinkState(event)));
                actions.push(SessionAction::CloseLink { service });
            }
            actions.extend(self.fail_service(service, ErrorCode::NotConnected));
        }

        actions
    }

    /// The transport for one service reached the server.
    ///
    /// Queued requests flush first, in issue order. Confirmed subscriptions
    /// are then reissued and the connected link-state event is held back until
    /// every one of them resolves.
    pub(crate) fn on_transport_up(&mut self, now: I, service: ServiceType) -> Vec<SessionAction> {
        let Some((previous, resumed)) = self.link_mut(service).on_transport_up() else {
            debug!(?service, "ignoring transport-up for link not coming up");
            return Vec::new();
        };

        let mut actions = Vec::new();
        let flushed: Vec<RequestFrame> = self.queue_mut(service).drain(..).collect();
        for frame in flushed {
            actions.push(SessionAction::Transmit(frame));
        }

        let targets = self.registry.restore_targets(service);
        if targets.is_empty() {
            let ts = self.last_server_time;
            let event = self.link(service).connected_event(previous, resumed, ts);
            actions.push(SessionAction::Deliver(PushEvent::LinkState(event)));
            return actions;
        }

        let mut awaiting = BTreeMap::new();
        for (name, channel_type, options) in targets {
            let channel_ref = ChannelRef { name: name.clone(), channel_type };
            let op = match channel_type {
                ChannelType::Message => OpKind::Subscribe,
                ChannelType::Stream => OpKind::Join,
            };
            let request_id = self.correlator.issue(
                now,
                op,
                Some(channel_ref.clone()),
                None,
                RequestOrigin::Restoration,
                Some(self.config.request_timeout),
            );
            awaiting.insert(request_id, name);
            actions.push(SessionAction::Transmit(RequestFrame {
                request_id,
                op,
                channel: Some(channel_ref),
                payload: options,
            }));
        }
        self.link_mut(service).begin_restoration(previous, resumed, awaiting);

        actions
    }

    fn issue_restore_topic(
        &mut self,
        now: I,
        channel: ChannelRef,
        topic: String,
        options: Bytes,
    ) -> SessionAction {
        let request_id = self.correlator.issue(
            now,
            OpKind::JoinTopic,
            Some(channel.clone()),
            Some(topic),
            RequestOrigin::Restoration,
            Some(self.config.request_timeout),
        );
        SessionAction::Transmit(RequestFrame {
            request_id,
            op: OpKind::JoinTopic,
            channel: Some(channel),
            payload: options,
        })
    }
}
