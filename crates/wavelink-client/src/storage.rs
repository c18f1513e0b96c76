//! Channel and user metadata operations.

use std::sync::Arc;

use wavelink_proto::{
    ChannelRef, ChannelType, OpKind,
    payload::to_payload,
    types::{Metadata, MetadataOptions},
};

use crate::{
    client::{Inner, OperationHandle},
    error::ClientError,
    payloads::{ChannelMetadataPayload, UserMetadataPayload, UserQueryPayload},
    transport::Connector,
};

/// Metadata façade, borrowed from a [`crate::Client`].
///
/// Stateless: validates and encodes, then issues through the session.
/// Successful fetches decode as [`wavelink_proto::results::MetadataResult`].
pub struct Storage<'a, C: Connector> {
    inner: &'a Arc<Inner<C>>,
}

impl<'a, C: Connector> Storage<'a, C> {
    pub(crate) fn new(inner: &'a Arc<Inner<C>>) -> Self {
        Self { inner }
    }

    async fn channel_op(
        &self,
        op: OpKind,
        channel: &str,
        channel_type: ChannelType,
        data: Metadata,
        options: MetadataOptions,
    ) -> Result<OperationHandle, ClientError> {
        let payload = to_payload(&ChannelMetadataPayload { data, options })?;
        let channel = ChannelRef { name: channel.to_owned(), channel_type };
        self.inner.request_op(op, Some(channel), None, payload).await
    }

    async fn user_op(
        &self,
        op: OpKind,
        user_id: &str,
        data: Metadata,
        options: MetadataOptions,
    ) -> Result<OperationHandle, ClientError> {
        let payload =
            to_payload(&UserMetadataPayload { user_id: user_id.to_owned(), data, options })?;
        self.inner.request_op(op, None, None, payload).await
    }

    /// Replace a channel's metadata record.
    pub async fn set_channel_metadata(
        &self,
        channel: &str,
        channel_type: ChannelType,
        data: Metadata,
        options: MetadataOptions,
    ) -> Result<OperationHandle, ClientError> {
        self.channel_op(OpKind::SetChannelMetadata, channel, channel_type, data, options).await
    }

    /// Merge items into a channel's metadata record.
    pub async fn update_channel_metadata(
        &self,
        channel: &str,
        channel_type: ChannelType,
        data: Metadata,
        options: MetadataOptions,
    ) -> Result<OperationHandle, ClientError> {
        self.channel_op(OpKind::UpdateChannelMetadata, channel, channel_type, data, options).await
    }

    /// Delete items from a channel's metadata record; an empty item list
    /// deletes the whole record.
    pub async fn remove_channel_metadata(
        &self,
        channel: &str,
        channel_type: ChannelType,
        data: Metadata,
        options: MetadataOptions,
    ) -> Result<OperationHandle, ClientError> {
        self.channel_op(OpKind::RemoveChannelMetadata, channel, channel_type, data, options).await
    }

    /// Fetch a channel's metadata record.
    pub async fn get_channel_metadata(
        &self,
        channel: &str,
        channel_type: ChannelType,
    ) -> Result<OperationHandle, ClientError> {
        let channel = ChannelRef { name: channel.to_owned(), channel_type };
        self.inner
            .request_op(OpKind::GetChannelMetadata, Some(channel), None, bytes::Bytes::new())
            .await
    }

    /// Replace a user's metadata record.
    pub async fn set_user_metadata(
        &self,
        user_id: &str,
        data: Metadata,
        options: MetadataOptions,
    ) -> Result<OperationHandle, ClientError> {
        self.user_op(OpKind::SetUserMetadata, user_id, data, options).await
    }

    /// Merge items into a user's metadata record.
    pub async fn update_user_metadata(
        &self,
        user_id: &str,
        data: Metadata,
        options: MetadataOptions,
    ) -> Result<OperationHandle, ClientError> {
        self.user_op(OpKind::UpdateUserMetadata, user_id, data, options).await
    }

    /// Delete items from a user's metadata record.
    pub async fn remove_user_metadata(
        &self,
        user_id: &str,
        data: Metadata,
        options: MetadataOptions,
    ) -> Result<OperationHandle, ClientError> {
        self.user_op(OpKind::RemoveUserMetadata, user_id, data, options).await
    }

    /// Fetch a user's metadata record.
    pub async fn get_user_metadata(&self, user_id: &str) -> Result<OperationHandle, ClientError> {
        let payload = to_payload(&UserQueryPayload { user_id: user_id.to_owned() })?;
        self.inner.request_op(OpKind::GetUserMetadata, None, None, payload).await
    }

    /// Watch a user's metadata; changes arrive as storage events.
    pub async fn subscribe_user_metadata(
        &self,
        user_id: &str,
    ) -> Result<OperationHandle, ClientError> {
        let payload = to_payload(&UserQueryPayload { user_id: user_id.to_owned() })?;
        self.inner.request_op(OpKind::SubscribeUserMetadata, None, None, payload).await
    }

    /// Stop watching a user's metadata.
    pub async fn unsubscribe_user_metadata(
        &self,
        user_id: &str,
    ) -> Result<OperationHandle, ClientError> {
        let payload = to_payload(&UserQueryPayload { user_id: user_id.to_owned() })?;
        self.inner.request_op(OpKind::UnsubscribeUserMetadata, None, None, payload).await
    }
}
