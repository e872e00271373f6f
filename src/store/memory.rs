//! Memory Backend Module
//!
//! In-process implementation of the dictionary-of-fields backend contract.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{CacheBackend, Clock, Fields, GetFieldsResponse, Ttl};
use crate::error::{BackendError, BackendErrorKind};
use crate::store::{StoredDictionary, MAX_KEY_LENGTH, MAX_VALUE_SIZE};

type Namespace = HashMap<String, StoredDictionary>;

// == Memory Backend ==
/// Dictionaries grouped by cache name, each with its own TTL.
pub struct MemoryBackend {
    /// Cache name -> key -> dictionary
    caches: RwLock<HashMap<String, Namespace>>,
    /// TTL applied to writes that ask for the client default
    default_ttl: Duration,
    /// Time source for expiration
    clock: Arc<dyn Clock>,
}

impl MemoryBackend {
    // == Constructor ==
    /// Creates an empty backend.
    ///
    /// # Arguments
    /// * `default_ttl` - TTL used when a write requests [`Ttl::ClientDefault`]
    /// * `clock` - Time source for expiration checks
    pub fn new(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            caches: RwLock::new(HashMap::new()),
            default_ttl,
            clock,
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired dictionaries from every cache.
    ///
    /// Returns the number of dictionaries removed.
    pub async fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let mut caches = self.caches.write().await;

        let mut removed = 0;
        for namespace in caches.values_mut() {
            let before = namespace.len();
            namespace.retain(|_, entry| !entry.is_expired(now));
            removed += before - namespace.len();
        }
        caches.retain(|_, namespace| !namespace.is_empty());

        removed
    }

    // == Length ==
    /// Returns the number of live dictionaries across all caches.
    pub async fn len(&self) -> usize {
        let now = self.clock.now();
        self.caches
            .read()
            .await
            .values()
            .flat_map(|namespace| namespace.values())
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    // == Is Empty ==
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    // == Time To Live ==
    /// Remaining TTL of `key`, or `None` if it is absent or expired.
    pub async fn ttl_remaining(&self, cache_name: &str, key: &str) -> Option<Duration> {
        let now = self.clock.now();
        self.caches
            .read()
            .await
            .get(cache_name)
            .and_then(|namespace| namespace.get(key))
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.ttl_remaining(now))
    }

    /// Every field stored at `key`, bypassing the adapter.
    pub async fn raw_fields(&self, cache_name: &str, key: &str) -> Option<Fields> {
        let now = self.clock.now();
        self.caches
            .read()
            .await
            .get(cache_name)
            .and_then(|namespace| namespace.get(key))
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.fields.clone())
    }
}

// == Validation ==
fn validate_key(key: &str) -> Result<(), BackendError> {
    if key.is_empty() {
        return Err(BackendError::new(
            BackendErrorKind::InvalidArgument,
            "Key cannot be empty",
        ));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(BackendError::new(
            BackendErrorKind::InvalidArgument,
            format!("Key exceeds maximum length of {} bytes", MAX_KEY_LENGTH),
        ));
    }
    Ok(())
}

fn validate_fields(fields: &Fields) -> Result<(), BackendError> {
    let size: usize = fields.iter().map(|(name, raw)| name.len() + raw.len()).sum();
    if size > MAX_VALUE_SIZE {
        return Err(BackendError::new(
            BackendErrorKind::InvalidArgument,
            format!("Value exceeds maximum size of {} bytes", MAX_VALUE_SIZE),
        ));
    }
    Ok(())
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get_fields(&self, cache_name: &str, key: &str, fields: &[&str]) -> GetFieldsResponse {
        if let Err(e) = validate_key(key) {
            return GetFieldsResponse::Error(e);
        }

        let now = self.clock.now();
        let mut caches = self.caches.write().await;
        let Some(namespace) = caches.get_mut(cache_name) else {
            return GetFieldsResponse::Miss;
        };

        let expired = match namespace.get(key) {
            Some(entry) => entry.is_expired(now),
            None => return GetFieldsResponse::Miss,
        };
        if expired {
            namespace.remove(key);
            debug!("Dropped expired key '{}' from '{}'", key, cache_name);
            return GetFieldsResponse::Miss;
        }

        let stored = &namespace[key].fields;
        GetFieldsResponse::Hit(
            fields
                .iter()
                .filter_map(|name| stored.get(*name).map(|raw| (name.to_string(), raw.clone())))
                .collect(),
        )
    }

    async fn set_fields(
        &self,
        cache_name: &str,
        key: &str,
        fields: Fields,
        ttl: Ttl,
    ) -> Result<(), BackendError> {
        validate_key(key)?;
        validate_fields(&fields)?;

        let ttl = match ttl {
            Ttl::ClientDefault => self.default_ttl,
            Ttl::Of(ttl) => ttl,
        };
        let entry = StoredDictionary::new(fields, self.clock.now(), ttl);

        self.caches
            .write()
            .await
            .entry(cache_name.to_string())
            .or_default()
            .insert(key.to_string(), entry);
        Ok(())
    }

    async fn update_ttl(
        &self,
        cache_name: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<(), BackendError> {
        validate_key(key)?;

        let now = self.clock.now();
        let mut caches = self.caches.write().await;
        match caches
            .get_mut(cache_name)
            .and_then(|namespace| namespace.get_mut(key))
        {
            Some(entry) if !entry.is_expired(now) => entry.reset_ttl(now, ttl),
            _ => debug!("TTL update for missing key '{}' in '{}'", key, cache_name),
        }
        Ok(())
    }

    async fn delete(&self, cache_name: &str, key: &str) -> Result<(), BackendError> {
        validate_key(key)?;

        if let Some(namespace) = self.caches.write().await.get_mut(cache_name) {
            namespace.remove(key);
        }
        Ok(())
    }
}
