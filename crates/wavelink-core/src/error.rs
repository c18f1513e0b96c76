//! Session-core error types.
//!
//! These are local validation failures only, returned synchronously before a
//! request id is consumed. Asynchronous failures (timeouts, server rejections,
//! link drops) are never Rust errors: they arrive as
//! [`crate::OperationOutcome`] completions carrying an error code.

use thiserror::Error;

/// Local validation failure; no request id was consumed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Channel name is empty or otherwise unusable.
    #[error("invalid channel name: {reason}")]
    InvalidChannelName {
        /// What was wrong with the name.
        reason: String,
    },

    /// Topic name is empty or otherwise unusable.
    #[error("invalid topic name: {reason}")]
    InvalidTopicName {
        /// What was wrong with the name.
        reason: String,
    },
}
