//! Distributed lock operations.

use std::sync::Arc;

use wavelink_proto::{ChannelRef, ChannelType, OpKind, ProtocolError, payload::to_payload};

use crate::{
    client::{Inner, OperationHandle},
    error::ClientError,
    payloads::{AcquireLockPayload, LockNamePayload, LockPayload, RevokeLockPayload},
    transport::Connector,
};

/// Lock façade, borrowed from a [`crate::Client`].
///
/// Lock listings decode as [`wavelink_proto::results::GetLocksResult`];
/// ownership changes arrive as lock events on watched channels.
pub struct Lock<'a, C: Connector> {
    inner: &'a Arc<Inner<C>>,
}

impl<'a, C: Connector> Lock<'a, C> {
    pub(crate) fn new(inner: &'a Arc<Inner<C>>) -> Self {
        Self { inner }
    }

    fn check_name(lock_name: &str) -> Result<(), ClientError> {
        if lock_name.is_empty() {
            return Err(ProtocolError::InvalidName { reason: "empty lock name".to_owned() }.into());
        }
        Ok(())
    }

    /// Create a lock on a channel.
    pub async fn set_lock(
        &self,
        channel: &str,
        channel_type: ChannelType,
        lock_name: &str,
        ttl: u32,
    ) -> Result<OperationHandle, ClientError> {
        Self::check_name(lock_name)?;
        let payload = to_payload(&LockPayload { lock_name: lock_name.to_owned(), ttl })?;
        let channel = ChannelRef { name: channel.to_owned(), channel_type };
        self.inner.request_op(OpKind::SetLock, Some(channel), None, payload).await
    }

    /// Delete a lock.
    pub async fn remove_lock(
        &self,
        channel: &str,
        channel_type: ChannelType,
        lock_name: &str,
    ) -> Result<OperationHandle, ClientError> {
        Self::check_name(lock_name)?;
        let payload = to_payload(&LockNamePayload { lock_name: lock_name.to_owned() })?;
        let channel = ChannelRef { name: channel.to_owned(), channel_type };
        self.inner.request_op(OpKind::RemoveLock, Some(channel), None, payload).await
    }

    /// Try to take ownership of a lock.
    ///
    /// With `retry` the server keeps the attempt open and grants the lock
    /// when it frees up instead of failing immediately.
    pub async fn acquire_lock(
        &self,
        channel: &str,
        channel_type: ChannelType,
        lock_name: &str,
        retry: bool,
    ) -> Result<OperationHandle, ClientError> {
        Self::check_name(lock_name)?;
        let payload =
            to_payload(&AcquireLockPayload { lock_name: lock_name.to_owned(), retry })?;
        let channel = ChannelRef { name: channel.to_owned(), channel_type };
        self.inner.request_op(OpKind::AcquireLock, Some(channel), None, payload).await
    }

    /// Give up ownership of a lock.
    pub async fn release_lock(
        &self,
        channel: &str,
        channel_type: ChannelType,
        lock_name: &str,
    ) -> Result<OperationHandle, ClientError> {
        Self::check_name(lock_name)?;
        let payload = to_payload(&LockNamePayload { lock_name: lock_name.to_owned() })?;
        let channel = ChannelRef { name: channel.to_owned(), channel_type };
        self.inner.request_op(OpKind::ReleaseLock, Some(channel), None, payload).await
    }

    /// Force-release a lock held by another user.
    pub async fn revoke_lock(
        &self,
        channel: &str,
        channel_type: ChannelType,
        lock_name: &str,
        owner: &str,
    ) -> Result<OperationHandle, ClientError> {
        Self::check_name(lock_name)?;
        let payload = to_payload(&RevokeLockPayload {
            lock_name: lock_name.to_owned(),
            owner: owner.to_owned(),
        })?;
        let channel = ChannelRef { name: channel.to_owned(), channel_type };
        self.inner.request_op(OpKind::RevokeLock, Some(channel), None, payload).await
    }

    /// List the locks on a channel.
    pub async fn get_locks(
        &self,
        channel: &str,
        channel_type: ChannelType,
    ) -> Result<OperationHandle, ClientError> {
        let channel = ChannelRef { name: channel.to_owned(), channel_type };
        self.inner.request_op(OpKind::GetLocks, Some(channel), None, bytes::Bytes::new()).await
    }
}
