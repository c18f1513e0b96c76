//! Stream channel handle.

use std::sync::{Arc, Weak};

use wavelink_proto::{
    ChannelRef, MAX_STREAM_PAYLOAD, OpKind, ProtocolError,
    payload::to_payload,
    types::{JoinOptions, PublishOptions, TopicOptions},
};

use crate::{
    client::{Inner, OperationHandle},
    error::ClientError,
    payloads::{JoinPayload, TopicMessagePayload, TopicPayload, TopicQueryPayload},
    transport::Connector,
};

/// Handle to one stream channel.
///
/// Created from [`crate::Client::create_stream_channel`]; owned by the
/// caller and valid for as long as the client lives. Operations on a handle
/// that outlived its client fail with [`ClientError::Released`].
pub struct StreamChannel<C: Connector> {
    inner: Weak<Inner<C>>,
    name: String,
}

impl<C: Connector> StreamChannel<C> {
    pub(crate) fn new(inner: Weak<Inner<C>>, name: String) -> Self {
        Self { inner, name }
    }

    /// Name of the channel this handle targets.
    pub fn channel_name(&self) -> &str {
        &self.name
    }

    fn client(&self) -> Result<Arc<Inner<C>>, ClientError> {
        self.inner.upgrade().ok_or(ClientError::Released)
    }

    /// Join the channel. Opens the stream service link on first use.
    pub async fn join(&self, options: JoinOptions) -> Result<OperationHandle, ClientError> {
        let inner = self.client()?;
        let payload = to_payload(&JoinPayload { options })?;
        let name = self.name.clone();
        inner.submit(move |session, now| session.join(now, &name, payload)).await
    }

    /// Leave the channel. Topic registrations are dropped with it.
    pub async fn leave(&self) -> Result<OperationHandle, ClientError> {
        let inner = self.client()?;
        let name = self.name.clone();
        inner.submit(move |session, now| session.leave(now, &name)).await
    }

    /// Register as publisher on a topic.
    pub async fn join_topic(
        &self,
        topic: &str,
        options: TopicOptions,
    ) -> Result<OperationHandle, ClientError> {
        let inner = self.client()?;
        let payload = to_payload(&TopicPayload { topic: topic.to_owned(), options })?;
        let name = self.name.clone();
        let topic = topic.to_owned();
        inner.submit(move |session, now| session.join_topic(now, &name, &topic, payload)).await
    }

    /// Deregister from a topic.
    pub async fn leave_topic(&self, topic: &str) -> Result<OperationHandle, ClientError> {
        let inner = self.client()?;
        let payload = to_payload(&TopicQueryPayload { topic: topic.to_owned() })?;
        let name = self.name.clone();
        let topic = topic.to_owned();
        inner.submit(move |session, now| session.leave_topic(now, &name, &topic, payload)).await
    }

    /// Publish a message to a topic.
    pub async fn publish_topic_message(
        &self,
        topic: &str,
        message: &[u8],
        options: PublishOptions,
    ) -> Result<OperationHandle, ClientError> {
        if message.len() > MAX_STREAM_PAYLOAD {
            return Err(ProtocolError::PayloadTooLarge {
                size: message.len(),
                max: MAX_STREAM_PAYLOAD,
            }
            .into());
        }
        let inner = self.client()?;
        let payload = to_payload(&TopicMessagePayload {
            topic: topic.to_owned(),
            message: message.to_vec(),
            options,
        })?;
        inner
            .request_op(
                OpKind::PublishTopicMessage,
                Some(ChannelRef::stream(&self.name)),
                Some(topic.to_owned()),
                payload,
            )
            .await
    }

    /// Receive messages from chosen publishers of a topic.
    pub async fn subscribe_topic(
        &self,
        topic: &str,
        options: TopicOptions,
    ) -> Result<OperationHandle, ClientError> {
        let inner = self.client()?;
        let payload = to_payload(&TopicPayload { topic: topic.to_owned(), options })?;
        inner
            .request_op(
                OpKind::SubscribeTopic,
                Some(ChannelRef::stream(&self.name)),
                Some(topic.to_owned()),
                payload,
            )
            .await
    }

    /// Stop receiving messages from a topic.
    pub async fn unsubscribe_topic(&self, topic: &str) -> Result<OperationHandle, ClientError> {
        let inner = self.client()?;
        let payload = to_payload(&TopicQueryPayload { topic: topic.to_owned() })?;
        inner
            .request_op(
                OpKind::UnsubscribeTopic,
                Some(ChannelRef::stream(&self.name)),
                Some(topic.to_owned()),
                payload,
            )
            .await
    }

    /// List the users subscribed to a topic. Decodes as
    /// [`wavelink_proto::results::SubscribedUserListResult`].
    pub async fn get_subscribed_user_list(
        &self,
        topic: &str,
    ) -> Result<OperationHandle, ClientError> {
        let inner = self.client()?;
        let payload = to_payload(&TopicQueryPayload { topic: topic.to_owned() })?;
        inner
            .request_op(
                OpKind::GetSubscribedUserList,
                Some(ChannelRef::stream(&self.name)),
                Some(topic.to_owned()),
                payload,
            )
            .await
    }
}
