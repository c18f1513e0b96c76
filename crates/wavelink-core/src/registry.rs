//! Durable record of channel subscriptions and topic memberships.
//!
//! The registry is the state that survives a link drop: after a reconnect the
//! session replays every surviving subscription from here, and inbound channel
//! events are delivered only for channels the registry still tracks. Records
//! are keyed by (channel type, name), so at most one subscription exists per
//! pair, and iteration order is deterministic.

use std::collections::BTreeMap;

use bytes::Bytes;
use wavelink_proto::{ChannelType, ServiceType};

/// Lifecycle of one subscription record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Subscribe issued, no result yet.
    Pending,
    /// Confirmed by the server.
    Active,
    /// Being replayed after a reconnect.
    Restoring,
    /// Replay was rejected; reported as unrestored.
    Failed,
    /// Unsubscribe issued; the record is deleted only when it resolves
    /// successfully, so an in-flight channel is never lost track of.
    Removing,
}

/// Membership of one stream-channel topic.
///
/// Owned by the channel's subscription record; created when a join-topic is
/// issued, removed on leave-topic, channel unsubscribe, or session end. The
/// original request payload is kept so the membership can be replayed after a
/// reconnect.
#[derive(Debug, Clone)]
pub struct TopicMembership {
    /// Topic name.
    pub topic: String,
    /// Opaque join payload, replayed on restoration.
    pub options: Bytes,
    /// Confirmed by the server; unconfirmed memberships are dropped if the
    /// join is rejected.
    pub active: bool,
}

/// One tracked channel subscription.
#[derive(Debug, Clone)]
pub struct ChannelSubscription {
    /// Channel name.
    pub name: String,
    /// Channel dimension.
    pub channel_type: ChannelType,
    /// Opaque subscribe/join payload, replayed on restoration.
    pub options: Bytes,
    /// Where the record is in its lifecycle.
    pub state: SubscriptionState,
    /// Topic memberships, stream channels only.
    pub topics: BTreeMap<String, TopicMembership>,
}

/// All subscriptions of one session.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    subs: BTreeMap<(ChannelType, String), ChannelSubscription>,
}

impl SubscriptionRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh a subscription record.
    ///
    /// Idempotent per (name, type): a second subscribe while the first is
    /// Pending or Active updates the stored options and keeps the single
    /// record. Returns `true` when the record is new.
    pub fn add(&mut self, name: &str, channel_type: ChannelType, options: Bytes) -> bool {
        let key = (channel_type, name.to_owned());
        match self.subs.get_mut(&key) {
            Some(existing) => {
                existing.options = options;
                if existing.state == SubscriptionState::Removing {
                    // Re-subscribed while an unsubscribe was in flight; keep
                    // the record alive whatever the unsubscribe resolves to.
                    existing.state = SubscriptionState::Pending;
                }
                false
            },
            None => {
                self.subs.insert(
                    key,
                    ChannelSubscription {
                        name: name.to_owned(),
                        channel_type,
                        options,
                        state: SubscriptionState::Pending,
                        topics: BTreeMap::new(),
                    },
                );
                true
            },
        }
    }

    /// Mark a subscription confirmed.
    pub fn activate(&mut self, name: &str, channel_type: ChannelType) {
        if let Some(sub) = self.subs.get_mut(&(channel_type, name.to_owned())) {
            sub.state = SubscriptionState::Active;
        }
    }

    /// Record a rejected subscribe.
    ///
    /// A record that never reached Active is dropped; an established record
    /// survives the failed refresh.
    pub fn subscribe_failed(&mut self, name: &str, channel_type: ChannelType) {
        let key = (channel_type, name.to_owned());
        if let Some(sub) = self.subs.get(&key)
            && sub.state == SubscriptionState::Pending
        {
            self.subs.remove(&key);
        }
    }

    /// Mark a subscription for removal. Returns `false` when nothing is
    /// tracked for the pair.
    pub fn begin_removal(&mut self, name: &str, channel_type: ChannelType) -> bool {
        match self.subs.get_mut(&(channel_type, name.to_owned())) {
            Some(sub) => {
                sub.state = SubscriptionState::Removing;
                true
            },
            None => false,
        }
    }

    /// Delete a record once its unsubscribe resolved successfully.
    pub fn finish_removal(&mut self, name: &str, channel_type: ChannelType) {
        self.subs.remove(&(channel_type, name.to_owned()));
    }

    /// Keep a record whose unsubscribe was rejected.
    pub fn cancel_removal(&mut self, name: &str, channel_type: ChannelType) {
        if let Some(sub) = self.subs.get_mut(&(channel_type, name.to_owned()))
            && sub.state == SubscriptionState::Removing
        {
            sub.state = SubscriptionState::Active;
        }
    }

    /// Collect the channels to replay after a reconnect of one service.
    ///
    /// Surviving records move to Restoring and are returned with their stored
    /// options, in deterministic (sorted) order. Records being removed are
    /// skipped, as are Pending records whose own subscribe request is still
    /// queued or in flight.
    pub fn restore_targets(&mut self, service: ServiceType) -> Vec<(String, ChannelType, Bytes)> {
        let mut targets = Vec::new();
        for sub in self.subs.values_mut() {
            if ServiceType::from(sub.channel_type) != service {
                continue;
            }
            if matches!(sub.state, SubscriptionState::Removing | SubscriptionState::Pending) {
                continue;
            }
            sub.state = SubscriptionState::Restoring;
            targets.push((sub.name.clone(), sub.channel_type, sub.options.clone()));
        }
        targets
    }

    /// Record the outcome of one channel's restoration.
    pub fn complete_restore(&mut self, name: &str, channel_type: ChannelType, ok: bool) {
        if let Some(sub) = self.subs.get_mut(&(channel_type, name.to_owned())) {
            sub.state = if ok { SubscriptionState::Active } else { SubscriptionState::Failed };
        }
    }

    /// Whether inbound events for this channel should reach the application.
    ///
    /// Stale events for channels the application already unsubscribed from
    /// (no record, or removal in flight) are dropped by the dispatcher.
    pub fn is_routable(&self, name: &str) -> bool {
        self.subs
            .values()
            .any(|sub| sub.name == name && sub.state != SubscriptionState::Removing)
    }

    /// Record a topic membership at join-topic issue time.
    pub fn add_topic(&mut self, channel: &str, topic: &str, options: Bytes) {
        if let Some(sub) = self.subs.get_mut(&(ChannelType::Stream, channel.to_owned())) {
            sub.topics.insert(
                topic.to_owned(),
                TopicMembership { topic: topic.to_owned(), options, active: false },
            );
        }
    }

    /// Mark a topic membership confirmed.
    pub fn activate_topic(&mut self, channel: &str, topic: &str) {
        if let Some(sub) = self.subs.get_mut(&(ChannelType::Stream, channel.to_owned()))
            && let Some(membership) = sub.topics.get_mut(topic)
        {
            membership.active = true;
        }
    }

    /// Drop a topic membership (leave-topic resolved, or join rejected).
    pub fn remove_topic(&mut self, channel: &str, topic: &str) {
        if let Some(sub) = self.subs.get_mut(&(ChannelType::Stream, channel.to_owned())) {
            sub.topics.remove(topic);
        }
    }

    /// Confirmed topic memberships of a stream channel, for replay.
    pub fn active_topics(&self, channel: &str) -> Vec<(String, Bytes)> {
        self.subs
            .get(&(ChannelType::Stream, channel.to_owned()))
            .map(|sub| {
                sub.topics
                    .values()
                    .filter(|m| m.active)
                    .map(|m| (m.topic.clone(), m.options.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Look up one record.
    pub fn get(&self, name: &str, channel_type: ChannelType) -> Option<&ChannelSubscription> {
        self.subs.get(&(channel_type, name.to_owned()))
    }

    /// Number of tracked subscriptions.
    pub fn len(&self) -> usize {
        self.subs.len()
    }

    /// True when nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    /// Drop every record; used on permanent session termination.
    pub fn clear(&mut self) {
        self.subs.clear();
    }
}
