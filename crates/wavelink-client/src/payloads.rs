//! Request payload shapes.
//!
//! These are the CBOR bodies the façades put inside request frames. The
//! session core never decodes them; results come back as opaque payloads the
//! caller decodes against the operation kind.

use serde::{Deserialize, Serialize};
use wavelink_proto::types::{
    GetHistoryOptions, JoinOptions, Metadata, MetadataOptions, PresenceOptions, PublishOptions,
    StateItem, SubscribeOptions, TopicOptions,
};

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct LoginPayload {
    pub user_id: String,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct RenewTokenPayload {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PublishPayload {
    pub message: Vec<u8>,
    pub options: PublishOptions,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SubscribePayload {
    pub options: SubscribeOptions,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct JoinPayload {
    pub options: JoinOptions,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct TopicPayload {
    pub topic: String,
    pub options: TopicOptions,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct TopicMessagePayload {
    pub topic: String,
    pub message: Vec<u8>,
    pub options: PublishOptions,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct TopicQueryPayload {
    pub topic: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ChannelMetadataPayload {
    pub data: Metadata,
    pub options: MetadataOptions,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct UserMetadataPayload {
    pub user_id: String,
    pub data: Metadata,
    pub options: MetadataOptions,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct UserQueryPayload {
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct LockPayload {
    pub lock_name: String,
    pub ttl: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct LockNamePayload {
    pub lock_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AcquireLockPayload {
    pub lock_name: String,
    pub retry: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct RevokeLockPayload {
    pub lock_name: String,
    pub owner: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct WhoNowPayload {
    pub options: PresenceOptions,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct WhereNowPayload {
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PresenceStatePayload {
    pub items: Vec<StateItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct RemovePresenceStatePayload {
    pub keys: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct GetPresenceStatePayload {
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct HistoryPayload {
    pub options: GetHistoryOptions,
}
