//! Decoded result payloads.
//!
//! Successful results for query operations carry one of these shapes as
//! their opaque payload. Plain acknowledgements carry an empty payload and
//! have no entry here.

use serde::{Deserialize, Serialize};

use crate::types::{ChannelInfo, HistoryMessage, LockDetail, Metadata, UserState};

/// Result of a who-now presence query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhoNowResult {
    /// Occupants, with state when requested.
    pub users: Vec<UserState>,
    /// Total occupancy, which may exceed the returned page.
    pub total_occupancy: u32,
    /// Cursor for the next page; absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page: Option<String>,
}

/// Result of a where-now presence query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhereNowResult {
    /// Channels the user currently occupies.
    pub channels: Vec<ChannelInfo>,
}

/// Result of a presence state fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceStateResult {
    /// The user and their state entries.
    pub state: UserState,
}

/// Result of a metadata fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataResult {
    /// The metadata record.
    pub data: Metadata,
}

/// Result of a lock listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetLocksResult {
    /// Locks currently defined on the channel.
    pub locks: Vec<LockDetail>,
}

/// Result of a history query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryResult {
    /// Stored messages, newest first.
    pub messages: Vec<HistoryMessage>,
    /// Start timestamp for fetching the next older page; `0` when exhausted.
    pub next_start: crate::Timestamp,
}

/// Result of a topic subscriber listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribedUserListResult {
    /// Users currently subscribed to the topic.
    pub users: Vec<String>,
}
