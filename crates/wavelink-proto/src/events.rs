//! Decoded push-event payloads.
//!
//! Each [`crate::EventKind`] maps to one payload shape here. The session core
//! routes event frames on the envelope alone; the client's delivery worker
//! decodes the payload with [`crate::payload::from_payload`] before invoking
//! the application's event sink.

use serde::{Deserialize, Serialize};

use crate::{
    ChannelType, Timestamp,
    types::{LockDetail, Metadata, StateItem, TopicInfo, UserState},
};

/// Message published to a subscribed channel or topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Channel dimension the message arrived on.
    pub channel_type: ChannelType,
    /// Channel name.
    pub channel_name: String,
    /// Topic the message came from; stream channels only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Message payload as published.
    pub payload: Vec<u8>,
    /// Publisher user id.
    pub publisher: String,
    /// Application-defined type tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_type: Option<String>,
    /// Server UTC time, milliseconds.
    pub timestamp: Timestamp,
}

/// What a presence event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceEventType {
    /// Full occupancy snapshot, sent once after subscribe or join.
    Snapshot,
    /// Batched joins/leaves, sent when the channel is over the
    /// announce threshold.
    Interval,
    /// A remote user joined.
    RemoteJoin,
    /// A remote user left.
    RemoteLeave,
    /// A remote user timed out.
    RemoteTimeout,
    /// A remote user changed presence state.
    RemoteStateChanged,
}

/// Batched membership changes for interval mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceInterval {
    /// Users who joined during the interval.
    pub joined: Vec<String>,
    /// Users who left during the interval.
    pub left: Vec<String>,
    /// Users who timed out during the interval.
    pub timed_out: Vec<String>,
    /// Users whose state changed during the interval.
    pub state_changed: Vec<UserState>,
}

/// Presence change in a watched channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceEvent {
    /// What happened.
    pub event_type: PresenceEventType,
    /// Channel dimension.
    pub channel_type: ChannelType,
    /// Channel name.
    pub channel_name: String,
    /// User who triggered the event; empty for snapshots.
    pub publisher: String,
    /// State entries carried by state-change events.
    pub state_items: Vec<StateItem>,
    /// Batched changes; interval events only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<PresenceInterval>,
    /// Full occupancy; snapshot events only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Vec<UserState>>,
    /// Server UTC time, milliseconds.
    pub timestamp: Timestamp,
}

/// What a topic event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicEventType {
    /// Full topic snapshot, sent once after join.
    Snapshot,
    /// A remote user joined a topic.
    RemoteJoin,
    /// A remote user left a topic.
    RemoteLeave,
}

/// Topic membership change in a stream channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicEvent {
    /// What happened.
    pub event_type: TopicEventType,
    /// Channel name.
    pub channel_name: String,
    /// User who triggered the event; empty for snapshots.
    pub publisher: String,
    /// Topics affected.
    pub topics: Vec<TopicInfo>,
    /// Server UTC time, milliseconds.
    pub timestamp: Timestamp,
}

/// What a lock event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockEventType {
    /// Full lock snapshot, sent once after subscribe or join.
    Snapshot,
    /// A lock was created.
    Set,
    /// A lock was deleted.
    Removed,
    /// A lock was acquired.
    Acquired,
    /// A lock was released.
    Released,
    /// A lock expired after its owner went silent.
    Expired,
}

/// Lock state change in a watched channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEvent {
    /// What happened.
    pub event_type: LockEventType,
    /// Channel dimension.
    pub channel_type: ChannelType,
    /// Channel name.
    pub channel_name: String,
    /// Locks affected.
    pub locks: Vec<LockDetail>,
    /// Server UTC time, milliseconds.
    pub timestamp: Timestamp,
}

/// Where a storage event originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageTarget {
    /// Channel metadata.
    Channel,
    /// User metadata.
    User,
}

/// What a storage event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageEventType {
    /// Full metadata snapshot, sent once after subscribe.
    Snapshot,
    /// Metadata was set.
    Set,
    /// Metadata was updated.
    Update,
    /// Metadata was removed.
    Remove,
}

/// Metadata change on a watched channel or user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEvent {
    /// What happened.
    pub event_type: StorageEventType,
    /// Whether channel or user metadata changed.
    pub target: StorageTarget,
    /// Channel name or user id, depending on `target`.
    pub target_name: String,
    /// The metadata after the change.
    pub data: Metadata,
    /// Server UTC time, milliseconds.
    pub timestamp: Timestamp,
}

/// What a token event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenEventType {
    /// Token expires soon; the application should renew it.
    WillExpire,
    /// Token was revoked; the session cannot continue.
    Revoked,
}

/// Token lifecycle notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEvent {
    /// What happened.
    pub event_type: TokenEventType,
    /// Server-provided explanation, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Server UTC time, milliseconds.
    pub timestamp: Timestamp,
}
