//! Codec between feed result sets and cached bytes.
//!
//! Values are stored as a versioned JSON envelope:
//!
//! ```json
//! {"v":1,"items":[{"id":"…","title":"…","createdAt":"…","author":{"username":"…"},"_count":{"likes":0}}]}
//! ```
//!
//! Decoding is strict. A different version, an unknown or missing field, or
//! malformed bytes all fail with [`SerializationError::DeserializeFailed`] so
//! the caller re-reads the store instead of serving a misread value.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::post::PostSummary;

/// Version tag written into every encoded feed.
pub const CODEC_VERSION: u32 = 1;

/// Errors that can occur during cache serialization/deserialization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializationError {
    /// Failed to serialize a value to bytes.
    #[error("Failed to serialize: {0}")]
    SerializeFailed(String),
    /// Failed to deserialize bytes to a value.
    #[error("Failed to deserialize: {0}")]
    DeserializeFailed(String),
}

/// Result type for serialization operations.
pub type Result<T> = std::result::Result<T, SerializationError>;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    v: u32,
    items: &'a [PostSummary],
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Envelope {
    v: u32,
    items: Vec<PostSummary>,
}

/// Encodes a feed result set for storage in the cache.
pub fn encode_feed(items: &[PostSummary]) -> Result<Vec<u8>> {
    let envelope = EnvelopeRef {
        v: CODEC_VERSION,
        items,
    };
    serde_json::to_vec(&envelope).map_err(|e| SerializationError::SerializeFailed(e.to_string()))
}

/// Decodes a cached feed result set.
pub fn decode_feed(bytes: &[u8]) -> Result<Vec<PostSummary>> {
    let envelope: Envelope = serde_json::from_slice(bytes)
        .map_err(|e| SerializationError::DeserializeFailed(e.to_string()))?;

    if envelope.v != CODEC_VERSION {
        return Err(SerializationError::DeserializeFailed(format!(
            "unsupported feed codec version {} (expected {})",
            envelope.v, CODEC_VERSION
        )));
    }

    Ok(envelope.items)
}
