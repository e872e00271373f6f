//! Backend Module
//!
//! Contract of the remote key-value client the adapter is built on: a
//! dictionary of named byte fields per key, with one TTL for the whole key.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::cache::Ttl;
use crate::error::BackendError;

/// Fields of a stored dictionary, by name.
pub type Fields = HashMap<String, Bytes>;

// == Get Fields Response ==
/// Outcome of a field fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum GetFieldsResponse {
    /// The key exists. Holds the requested fields that are present; absent
    /// fields are simply missing from the map.
    Hit(Fields),
    /// The key does not exist (or has expired)
    Miss,
    /// The backend failed to answer
    Error(BackendError),
}

// == Backend Port ==
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Fetches the named fields of the dictionary stored at `key`.
    async fn get_fields(&self, cache_name: &str, key: &str, fields: &[&str]) -> GetFieldsResponse;

    /// Atomically replaces the dictionary stored at `key` and sets its TTL.
    async fn set_fields(
        &self,
        cache_name: &str,
        key: &str,
        fields: Fields,
        ttl: Ttl,
    ) -> Result<(), BackendError>;

    /// Resets the TTL of `key`. A missing key is not an error.
    async fn update_ttl(&self, cache_name: &str, key: &str, ttl: Duration)
        -> Result<(), BackendError>;

    /// Removes `key`. A missing key is not an error.
    async fn delete(&self, cache_name: &str, key: &str) -> Result<(), BackendError>;
}
