//! Error types for the protocol model.
//!
//! These cover local failures only: payload encoding, payload decoding, and
//! argument validation. Server-reported failures travel as [`crate::ErrorCode`]
//! values inside result frames, not as Rust errors.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while building or decoding protocol payloads.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Payload exceeds the size limit for its channel type.
    #[error("payload too large: {size} bytes exceeds limit of {max}")]
    PayloadTooLarge {
        /// Actual payload size in bytes.
        size: usize,
        /// Maximum allowed size in bytes.
        max: usize,
    },

    /// Channel, topic, lock, or user name failed local validation.
    #[error("invalid name: {reason}")]
    InvalidName {
        /// What was wrong with the name.
        reason: String,
    },

    /// CBOR encoding of a payload failed.
    #[error("payload encode failed: {0}")]
    Encode(String),

    /// CBOR decoding of a payload failed.
    #[error("payload decode failed: {0}")]
    Decode(String),
}
