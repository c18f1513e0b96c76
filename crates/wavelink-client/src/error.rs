//! Client-side error types.

use thiserror::Error;
use wavelink_core::SessionError;
use wavelink_proto::ProtocolError;

/// Failure raised before a request reaches the session, or when the client
/// the handle points at is gone.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Local argument validation failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Payload encoding or size validation failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The client driver shut down before the operation completed.
    #[error("client closed")]
    Closed,

    /// The owning client was released while this handle was still alive.
    #[error("client released")]
    Released,
}
