//! Pure functions for serializing/deserializing cache payloads.
//!
//! These functions use JSON serialization for cache storage, providing
//! human-readable cache values that are easy to debug and inspect.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use super::{KeyList, PageResult};
use crate::query::Row;

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

/// Serializes an object slot.
///
/// `None` records a confirmed absence and is encoded as JSON `null`.
pub fn serialize_slot<T: Serialize>(value: Option<&T>) -> Result<Vec<u8>> {
    serde_json::to_vec(&value).map_err(|e| SerializationError::SerializeFailed(e.to_string()))
}

/// Deserializes an object slot; `Ok(None)` is a confirmed absence.
pub fn deserialize_slot<T: DeserializeOwned>(bytes: &[u8]) -> Result<Option<T>> {
    serde_json::from_slice(bytes).map_err(|e| SerializationError::DeserializeFailed(e.to_string()))
}

/// Serializes a key list to JSON bytes.
pub fn serialize_key_list(keys: &KeyList) -> Result<Vec<u8>> {
    serde_json::to_vec(keys).map_err(|e| SerializationError::SerializeFailed(e.to_string()))
}

/// Deserializes JSON bytes to a key list.
pub fn deserialize_key_list(bytes: &[u8]) -> Result<KeyList> {
    serde_json::from_slice(bytes).map_err(|e| SerializationError::DeserializeFailed(e.to_string()))
}

/// Serializes a cached page to JSON bytes.
pub fn serialize_page(page: &PageResult) -> Result<Vec<u8>> {
    serde_json::to_vec(page).map_err(|e| SerializationError::SerializeFailed(e.to_string()))
}

/// Deserializes JSON bytes to a cached page.
pub fn deserialize_page(bytes: &[u8]) -> Result<PageResult> {
    serde_json::from_slice(bytes).map_err(|e| SerializationError::DeserializeFailed(e.to_string()))
}

/// Serializes raw rows to JSON bytes.
pub fn serialize_rows(rows: &[Row]) -> Result<Vec<u8>> {
    serde_json::to_vec(rows).map_err(|e| SerializationError::SerializeFailed(e.to_string()))
}

/// Deserializes JSON bytes to raw rows.
pub fn deserialize_rows(bytes: &[u8]) -> Result<Vec<Row>> {
    serde_json::from_slice(bytes).map_err(|e| SerializationError::DeserializeFailed(e.to_string()))
}
