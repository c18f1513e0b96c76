//! Value payloads and operation options.
//!
//! These are the typed shapes carried inside opaque frame payloads. The core
//! passes them through unchanged; the façades encode them on the way out and
//! the application decodes them from operation outcomes.

use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// One metadata entry with its compare-and-set revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataItem {
    /// Item key.
    pub key: String,
    /// Item value.
    pub value: String,
    /// Revision for compare-and-set updates; `-1` disables the check.
    pub revision: i64,
    /// Server time of the last update, milliseconds.
    pub updated_at: Timestamp,
    /// User who last wrote the item.
    pub author: String,
}

/// Metadata attached to a channel or user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Revision of the whole record; `-1` disables the check.
    pub major_revision: i64,
    /// The entries.
    pub items: Vec<MetadataItem>,
}

/// One key/value pair of a user's presence state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateItem {
    /// State key.
    pub key: String,
    /// State value.
    pub value: String,
}

/// A user together with their presence state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserState {
    /// User id.
    pub user_id: String,
    /// Presence state entries.
    pub states: Vec<StateItem>,
}

/// Details of one lock on a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockDetail {
    /// Lock name.
    pub lock_name: String,
    /// Current owner; empty when unheld.
    pub owner: String,
    /// Time-to-live in seconds after the owner goes silent.
    pub ttl: u32,
}

/// A stored channel message returned by a history query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    /// Publisher user id.
    pub publisher: String,
    /// Message payload as published.
    pub payload: Vec<u8>,
    /// Application-defined type tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_type: Option<String>,
    /// Server time of publication, milliseconds.
    pub timestamp: Timestamp,
}

/// A topic and its current publishers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicInfo {
    /// Topic name.
    pub topic: String,
    /// Users currently publishing to the topic.
    pub publishers: Vec<String>,
}

/// A channel a user was found in by a presence query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Channel name.
    pub channel_name: String,
    /// Channel dimension.
    pub channel_type: crate::ChannelType,
}

/// Options for publishing to a message channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishOptions {
    /// Application-defined type tag carried with the message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_type: Option<String>,
    /// Store the message for later history queries.
    pub store_in_history: bool,
}

/// Options for subscribing to a message channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeOptions {
    /// Deliver message events.
    pub with_message: bool,
    /// Deliver presence events.
    pub with_presence: bool,
    /// Deliver metadata change events.
    pub with_metadata: bool,
    /// Deliver lock events.
    pub with_lock: bool,
}

impl SubscribeOptions {
    /// Subscribe to messages and presence, the common default.
    pub fn messages_and_presence() -> Self {
        Self { with_message: true, with_presence: true, ..Self::default() }
    }
}

/// Options for joining a stream channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinOptions {
    /// Channel-scoped token, when the backend requires one per channel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Deliver presence events for the channel.
    pub with_presence: bool,
    /// Deliver metadata change events for the channel.
    pub with_metadata: bool,
    /// Deliver lock events for the channel.
    pub with_lock: bool,
}

/// Options for joining or subscribing to a topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicOptions {
    /// Application-defined metadata attached to the membership.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
    /// Publishers to subscribe to; empty means all.
    pub users: Vec<String>,
}

/// Options for metadata write operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataOptions {
    /// Record the server timestamp of each write.
    pub record_timestamp: bool,
    /// Record the author of each write.
    pub record_author: bool,
    /// Lock that must be held for the write to apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_name: Option<String>,
}

/// Options for presence queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceOptions {
    /// Include user ids in the result.
    pub include_user_id: bool,
    /// Include presence state in the result.
    pub include_state: bool,
    /// Continuation cursor from a previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
}

/// Options for history queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetHistoryOptions {
    /// Maximum messages to return.
    pub message_count: u32,
    /// Inclusive start of the range, milliseconds; `0` means oldest.
    pub start: Timestamp,
    /// Exclusive end of the range, milliseconds; `0` means newest.
    pub end: Timestamp,
}

impl Default for GetHistoryOptions {
    fn default() -> Self {
        Self { message_count: 100, start: 0, end: 0 }
    }
}
