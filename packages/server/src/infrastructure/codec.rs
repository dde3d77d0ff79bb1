//! Message codec for bulk export and import.
//!
//! A record is encoded as base64 of its JSON form. Not used on the hot path.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to serialize record: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid record: {0}")]
    Deserialize(#[source] serde_json::Error),
}

/// Encode one record into a transport-safe string
pub fn encode<T: Serialize>(record: &T) -> Result<String, CodecError> {
    let json = serde_json::to_vec(record).map_err(CodecError::Serialize)?;
    Ok(STANDARD.encode(json))
}

/// Decode a string produced by [`encode`]
pub fn decode<T: DeserializeOwned>(encoded: &str) -> Result<T, CodecError> {
    let bytes = STANDARD.decode(encoded.trim())?;
    serde_json::from_slice(&bytes).map_err(CodecError::Deserialize)
}

/// Encode many records, skipping any that fail
pub fn encode_many<T: Serialize>(records: &[T]) -> Vec<String> {
    records
        .iter()
        .filter_map(|record| match encode(record) {
            Ok(encoded) => Some(encoded),
            Err(e) => {
                tracing::warn!("Skipping record during encoding: {}", e);
                None
            }
        })
        .collect()
}

/// Decode many strings, skipping any that fail.
///
/// Returns the decoded records and the number of skipped entries.
pub fn decode_many<T: DeserializeOwned>(encoded: &[String]) -> (Vec<T>, usize) {
    let mut skipped = 0;
    let decoded: Vec<T> = encoded
        .iter()
        .filter_map(|item| match decode(item) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping undecodable record: {}", e);
                skipped += 1;
                None
            }
        })
        .collect();
    (decoded, skipped)
}
