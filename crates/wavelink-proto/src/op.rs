//! Operation kinds and the channel/service dimensions.

use serde::{Deserialize, Serialize};

/// Channel dimension of an operation or event.
///
/// Message channels are pub/sub topics addressed by name; stream channels are
/// joined sessions with named topics inside them. The two are carried by
/// independently connected services, see [`ServiceType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    /// Pub/sub message channel.
    Message,
    /// Joined stream channel with topics.
    Stream,
}

/// Service whose link carries an operation.
///
/// Link state is tracked per service: the message service and the stream
/// service connect, suspend, and resume independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    /// Message channel service (also carries session, storage, lock,
    /// presence, and history operations).
    Message,
    /// Stream channel service.
    Stream,
}

impl From<ChannelType> for ServiceType {
    fn from(channel_type: ChannelType) -> Self {
        match channel_type {
            ChannelType::Message => Self::Message,
            ChannelType::Stream => Self::Stream,
        }
    }
}

/// Every operation a session can issue.
///
/// One request frame carries exactly one kind; the matching result is
/// correlated by request id and interpreted according to the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    // Session
    /// Authenticate and open the session.
    Login,
    /// Close the session and drop all pending work.
    Logout,
    /// Replace the session token before it expires.
    RenewToken,

    // Message channels
    /// Publish a message to a message channel.
    Publish,
    /// Subscribe to a message channel.
    Subscribe,
    /// Unsubscribe from a message channel.
    Unsubscribe,

    // Stream channels
    /// Join a stream channel.
    Join,
    /// Leave a stream channel.
    Leave,
    /// Register as publisher on a topic.
    JoinTopic,
    /// Deregister from a topic.
    LeaveTopic,
    /// Publish a message to a topic.
    PublishTopicMessage,
    /// Subscribe to publishers of a topic.
    SubscribeTopic,
    /// Unsubscribe from publishers of a topic.
    UnsubscribeTopic,
    /// List the users subscribed to a topic.
    GetSubscribedUserList,

    // Storage
    /// Set channel metadata.
    SetChannelMetadata,
    /// Update channel metadata.
    UpdateChannelMetadata,
    /// Remove channel metadata.
    RemoveChannelMetadata,
    /// Fetch channel metadata.
    GetChannelMetadata,
    /// Set user metadata.
    SetUserMetadata,
    /// Update user metadata.
    UpdateUserMetadata,
    /// Remove user metadata.
    RemoveUserMetadata,
    /// Fetch user metadata.
    GetUserMetadata,
    /// Watch a user's metadata for changes.
    SubscribeUserMetadata,
    /// Stop watching a user's metadata.
    UnsubscribeUserMetadata,

    // Locks
    /// Create a lock on a channel.
    SetLock,
    /// Delete a lock.
    RemoveLock,
    /// Try to take ownership of a lock.
    AcquireLock,
    /// Give up ownership of a lock.
    ReleaseLock,
    /// Force-release a lock held by another user.
    RevokeLock,
    /// List the locks on a channel.
    GetLocks,

    // Presence
    /// Query who is in a channel.
    WhoNow,
    /// Query which channels a user is in.
    WhereNow,
    /// Set our presence state in a channel.
    SetPresenceState,
    /// Remove keys from our presence state.
    RemovePresenceState,
    /// Fetch a user's presence state.
    GetPresenceState,

    // History
    /// Fetch stored channel messages.
    GetHistoryMessages,
}

impl OpKind {
    /// Service whose link carries this operation.
    ///
    /// Everything except the stream-channel operations rides the message
    /// service link, matching the per-service link state tracking.
    pub fn service(self) -> ServiceType {
        match self {
            Self::Join
            | Self::Leave
            | Self::JoinTopic
            | Self::LeaveTopic
            | Self::PublishTopicMessage
            | Self::SubscribeTopic
            | Self::UnsubscribeTopic
            | Self::GetSubscribedUserList => ServiceType::Stream,
            _ => ServiceType::Message,
        }
    }
}
