//! Stored message queries.

use std::sync::Arc;

use wavelink_proto::{ChannelRef, ChannelType, OpKind, payload::to_payload, types::GetHistoryOptions};

use crate::{
    client::{Inner, OperationHandle},
    error::ClientError,
    payloads::HistoryPayload,
    transport::Connector,
};

/// History façade, borrowed from a [`crate::Client`].
///
/// Queries decode as [`wavelink_proto::results::HistoryResult`]; only
/// messages published with `store_in_history` are returned.
pub struct History<'a, C: Connector> {
    inner: &'a Arc<Inner<C>>,
}

impl<'a, C: Connector> History<'a, C> {
    pub(crate) fn new(inner: &'a Arc<Inner<C>>) -> Self {
        Self { inner }
    }

    /// Fetch stored messages for a channel, newest first.
    pub async fn get_messages(
        &self,
        channel: &str,
        channel_type: ChannelType,
        options: GetHistoryOptions,
    ) -> Result<OperationHandle, ClientError> {
        let payload = to_payload(&HistoryPayload { options })?;
        let channel = ChannelRef { name: channel.to_owned(), channel_type };
        self.inner.request_op(OpKind::GetHistoryMessages, Some(channel), None, payload).await
    }
}
