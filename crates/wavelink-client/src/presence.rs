//! Presence queries and state operations.

use std::sync::Arc;

use wavelink_proto::{
    ChannelRef, ChannelType, OpKind,
    payload::to_payload,
    types::{PresenceOptions, StateItem},
};

use crate::{
    client::{Inner, OperationHandle},
    error::ClientError,
    payloads::{
        GetPresenceStatePayload, PresenceStatePayload, RemovePresenceStatePayload, WhereNowPayload,
        WhoNowPayload,
    },
    transport::Connector,
};

/// Presence façade, borrowed from a [`crate::Client`].
///
/// Occupancy queries decode as [`wavelink_proto::results::WhoNowResult`] and
/// [`wavelink_proto::results::WhereNowResult`]; state fetches as
/// [`wavelink_proto::results::PresenceStateResult`].
pub struct Presence<'a, C: Connector> {
    inner: &'a Arc<Inner<C>>,
}

impl<'a, C: Connector> Presence<'a, C> {
    pub(crate) fn new(inner: &'a Arc<Inner<C>>) -> Self {
        Self { inner }
    }

    /// Query who occupies a channel.
    pub async fn who_now(
        &self,
        channel: &str,
        channel_type: ChannelType,
        options: PresenceOptions,
    ) -> Result<OperationHandle, ClientError> {
        let payload = to_payload(&WhoNowPayload { options })?;
        let channel = ChannelRef { name: channel.to_owned(), channel_type };
        self.inner.request_op(OpKind::WhoNow, Some(channel), None, payload).await
    }

    /// Query which channels a user occupies.
    pub async fn where_now(&self, user_id: &str) -> Result<OperationHandle, ClientError> {
        let payload = to_payload(&WhereNowPayload { user_id: user_id.to_owned() })?;
        self.inner.request_op(OpKind::WhereNow, None, None, payload).await
    }

    /// Set keys in our presence state for a channel. Existing keys not named
    /// are kept.
    pub async fn set_state(
        &self,
        channel: &str,
        channel_type: ChannelType,
        items: Vec<StateItem>,
    ) -> Result<OperationHandle, ClientError> {
        let payload = to_payload(&PresenceStatePayload { items })?;
        let channel = ChannelRef { name: channel.to_owned(), channel_type };
        self.inner.request_op(OpKind::SetPresenceState, Some(channel), None, payload).await
    }

    /// Remove keys from our presence state for a channel.
    pub async fn remove_state(
        &self,
        channel: &str,
        channel_type: ChannelType,
        keys: Vec<String>,
    ) -> Result<OperationHandle, ClientError> {
        let payload = to_payload(&RemovePresenceStatePayload { keys })?;
        let channel = ChannelRef { name: channel.to_owned(), channel_type };
        self.inner.request_op(OpKind::RemovePresenceState, Some(channel), None, payload).await
    }

    /// Fetch a user's presence state in a channel.
    pub async fn get_state(
        &self,
        channel: &str,
        channel_type: ChannelType,
        user_id: &str,
    ) -> Result<OperationHandle, ClientError> {
        let payload = to_payload(&GetPresenceStatePayload { user_id: user_id.to_owned() })?;
        let channel = ChannelRef { name: channel.to_owned(), channel_type };
        self.inner.request_op(OpKind::GetPresenceState, Some(channel), None, payload).await
    }
}
