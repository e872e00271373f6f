//! Request DTOs for the demo HTTP API
//!
//! Defines the structure of incoming HTTP request bodies.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::cache::EntryOptions;
use crate::store::MAX_KEY_LENGTH;

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: The value to store
/// - `absolute_expiration`: Optional RFC 3339 deadline
/// - `absolute_expiration_relative_to_now_ms`: Optional deadline relative to now
/// - `sliding_expiration_ms`: Optional sliding window
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: String,
    #[serde(default)]
    pub absolute_expiration: Option<DateTime<Utc>>,
    #[serde(default)]
    pub absolute_expiration_relative_to_now_ms: Option<u64>,
    #[serde(default)]
    pub sliding_expiration_ms: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Key exceeds maximum length of {} characters",
                MAX_KEY_LENGTH
            ));
        }
        None
    }

    /// Expiration settings carried by the request.
    pub fn entry_options(&self) -> EntryOptions {
        EntryOptions {
            absolute_expiration: self.absolute_expiration,
            absolute_expiration_relative_to_now: self
                .absolute_expiration_relative_to_now_ms
                .map(Duration::from_millis),
            sliding_expiration: self.sliding_expiration_ms.map(Duration::from_millis),
        }
    }
}
