//! CBOR helpers for opaque payloads.
//!
//! We chose CBOR because it is self-describing, compact, and needs no code
//! generation; the session core routes frames without ever deserializing a
//! payload, so only the edges (façades building requests, the event delivery
//! worker decoding pushes) pay the cost.

use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};

use crate::errors::{ProtocolError, Result};

/// Encode a typed payload into opaque bytes.
pub fn to_payload<T: Serialize>(value: &T) -> Result<Bytes> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| ProtocolError::Encode(e.to_string()))?;
    Ok(Bytes::from(buf))
}

/// Decode a typed payload from opaque bytes.
pub fn from_payload<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    ciborium::from_reader(bytes).map_err(|e| ProtocolError::Decode(e.to_string()))
}
