//! Cache Adapter Module
//!
//! Maps the generic get/set/refresh/remove contract onto the field-dictionary
//! primitives of a [`CacheBackend`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cache::marshal::{decode_duration, decode_instant, MarshalError};
use crate::cache::{
    refresh_ttl, resolve, CacheBackend, Clock, EntryOptions, Fields, GetFieldsResponse,
    ABSOLUTE_FIELD, SLIDING_FIELD, VALUE_FIELD,
};
use crate::config::OptionsSource;
use crate::error::{CacheError, Result};

/// Fields fetched by a get.
const GET_FIELDS: &[&str] = &[VALUE_FIELD, SLIDING_FIELD, ABSOLUTE_FIELD];

/// Fields fetched by a refresh, which never needs the payload.
const REFRESH_FIELDS: &[&str] = &[SLIDING_FIELD, ABSOLUTE_FIELD];

// == Distributed Cache ==
/// Generic distributed cache contract.
#[async_trait]
pub trait DistributedCache: Send + Sync {
    /// Returns the value stored at `key`, extending its sliding expiration.
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Stores `value` at `key` with the requested expiration.
    async fn set(&self, key: &str, value: Bytes, options: &EntryOptions) -> Result<()>;

    /// Extends the sliding expiration of `key` without reading its value.
    async fn refresh(&self, key: &str) -> Result<()>;

    /// Removes `key`.
    async fn remove(&self, key: &str) -> Result<()>;
}

// == Dictionary Cache ==
/// [`DistributedCache`] over a dictionary-of-fields backend.
///
/// Stateless apart from its collaborators; clones share them.
#[derive(Clone)]
pub struct DictionaryCache {
    backend: Arc<dyn CacheBackend>,
    options: Arc<dyn OptionsSource>,
    clock: Arc<dyn Clock>,
}

impl DictionaryCache {
    // == Constructor ==
    pub fn new(
        backend: Arc<dyn CacheBackend>,
        options: Arc<dyn OptionsSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            backend,
            options,
            clock,
        }
    }

    // == Get ==
    /// [`DistributedCache::get`], skipping the TTL update if `token` has been
    /// cancelled by the time the fields arrive.
    pub async fn get_with_token(
        &self,
        key: &str,
        token: &CancellationToken,
    ) -> Result<Option<Bytes>> {
        self.get_and_refresh(key, GET_FIELDS, token).await
    }

    // == Refresh ==
    /// [`DistributedCache::refresh`] with the same cancellation point as
    /// [`DictionaryCache::get_with_token`].
    pub async fn refresh_with_token(&self, key: &str, token: &CancellationToken) -> Result<()> {
        self.get_and_refresh(key, REFRESH_FIELDS, token)
            .await
            .map(|_| ())
    }

    // == Set ==
    /// [`DistributedCache::set`], checking `token` before the write.
    ///
    /// # Errors
    /// - `InvalidArgument` if the expiration is rejected; nothing is written
    /// - `Backend` with the backend's own error if the write fails
    pub async fn set_with_token(
        &self,
        key: &str,
        value: Bytes,
        options: &EntryOptions,
        token: &CancellationToken,
    ) -> Result<()> {
        let cache_opts = self.options.current();
        let resolved = resolve(self.clock.now(), options)?;

        let mut fields = Fields::with_capacity(3);
        fields.insert(VALUE_FIELD.to_string(), value);
        for (name, raw) in resolved.sidecar_fields() {
            fields.insert(name.to_string(), raw);
        }

        if token.is_cancelled() {
            return Err(CacheError::Cancelled);
        }

        self.backend
            .set_fields(cache_opts.cache_name(), key, fields, resolved.ttl)
            .await
            .map_err(|e| {
                warn!("Set failed for key '{}': {}", key, e);
                CacheError::from(e)
            })?;

        debug!("Set key '{}' with ttl {:?}", key, resolved.ttl);
        Ok(())
    }

    // == Get And Refresh ==
    /// Shared body of get and refresh. The TTL update, when needed, is only
    /// issued once the fetch has completed.
    async fn get_and_refresh(
        &self,
        key: &str,
        wanted: &[&str],
        token: &CancellationToken,
    ) -> Result<Option<Bytes>> {
        let cache_opts = self.options.current();

        let mut fields = match self
            .backend
            .get_fields(cache_opts.cache_name(), key, wanted)
            .await
        {
            GetFieldsResponse::Hit(fields) => fields,
            GetFieldsResponse::Miss => {
                debug!("Miss for key '{}'", key);
                return Ok(None);
            }
            GetFieldsResponse::Error(e) => {
                warn!("Fetch failed for key '{}': {}", key, e);
                return Err(e.into());
            }
        };

        if let Some(ttl) = self.sliding_ttl(&fields)? {
            if token.is_cancelled() {
                return Err(CacheError::Cancelled);
            }

            self.backend
                .update_ttl(cache_opts.cache_name(), key, ttl)
                .await
                .map_err(|e| {
                    warn!("TTL update failed for key '{}': {}", key, e);
                    CacheError::from(e)
                })?;
            debug!("Refreshed key '{}' for {:?}", key, ttl);
        }

        // A hit without a value field is treated as a miss.
        Ok(fields.remove(VALUE_FIELD))
    }

    /// TTL to reapply on read, or `None` for an entry that doesn't slide.
    fn sliding_ttl(&self, fields: &Fields) -> Result<Option<Duration>> {
        let Some(sliding) = decode_field(fields, SLIDING_FIELD, decode_duration)? else {
            return Ok(None);
        };
        let absolute: Option<DateTime<Utc>> = decode_field(fields, ABSOLUTE_FIELD, decode_instant)?;

        let now = self.clock.now();
        Ok(Some(refresh_ttl(now, sliding, absolute)))
    }
}

fn decode_field<T>(
    fields: &Fields,
    name: &'static str,
    decode: fn(&[u8]) -> std::result::Result<T, MarshalError>,
) -> Result<Option<T>> {
    fields
        .get(name)
        .map(|raw| {
            decode(&raw[..]).map_err(|e| CacheError::MalformedField {
                field: name,
                reason: e.to_string(),
            })
        })
        .transpose()
}

#[async_trait]
impl DistributedCache for DictionaryCache {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.get_with_token(key, &CancellationToken::new()).await
    }

    async fn set(&self, key: &str, value: Bytes, options: &EntryOptions) -> Result<()> {
        self.set_with_token(key, value, options, &CancellationToken::new())
            .await
    }

    async fn refresh(&self, key: &str) -> Result<()> {
        self.refresh_with_token(key, &CancellationToken::new()).await
    }

    // == Remove ==
    async fn remove(&self, key: &str) -> Result<()> {
        let cache_opts = self.options.current();
        self.backend
            .delete(cache_opts.cache_name(), key)
            .await
            .map_err(|e| {
                warn!("Remove failed for key '{}': {}", key, e);
                CacheError::from(e)
            })?;

        debug!("Removed key '{}'", key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::marshal::{encode_duration, encode_instant};
    use crate::cache::test_support::{harness, hit, Call, ScriptedBackend, CACHE_NAME};
    use crate::cache::Ttl;
    use crate::error::{BackendError, BackendErrorKind};
    use chrono::TimeDelta;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[tokio::test]
    async fn test_set_sliding_scenario_then_get_refreshes() {
        let (backend, _clock, cache) = harness(ScriptedBackend::new());
        let options = EntryOptions::new().with_sliding_expiration(secs(30));

        cache
            .set("k", Bytes::from_static(&[1, 2, 3]), &options)
            .await
            .unwrap();

        let calls = backend.calls();
        let Call::SetFields { fields, ttl, .. } = &calls[0] else {
            panic!("expected a set, got {:?}", calls);
        };
        assert_eq!(*ttl, Ttl::Of(secs(30)));
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[VALUE_FIELD], Bytes::from_static(&[1, 2, 3]));
        assert_eq!(fields[SLIDING_FIELD], encode_duration(secs(30)));

        let (backend, _clock, cache) = harness(ScriptedBackend::new().on_get(hit(&[
            (VALUE_FIELD, Bytes::from_static(&[1, 2, 3])),
            (SLIDING_FIELD, encode_duration(secs(30))),
        ])));

        let value = cache.get("k").await.unwrap();
        assert_eq!(value, Some(Bytes::from_static(&[1, 2, 3])));
        assert_eq!(
            backend.calls()[1],
            Call::UpdateTtl {
                cache_name: CACHE_NAME.to_string(),
                key: "k".to_string(),
                ttl: secs(30),
            }
        );
    }

    #[tokio::test]
    async fn test_set_short_absolute_with_sliding_is_fixed() {
        let (backend, clock, cache) = harness(ScriptedBackend::new());
        let options = EntryOptions::new()
            .with_absolute_expiration(clock.now() + TimeDelta::seconds(10))
            .with_sliding_expiration(secs(30));

        cache.set("k", Bytes::from_static(&[1, 2, 3]), &options).await.unwrap();

        let calls = backend.calls();
        let Call::SetFields { fields, ttl, .. } = &calls[0] else {
            panic!("expected a set");
        };
        assert_eq!(*ttl, Ttl::Of(secs(10)));
        assert_eq!(fields.len(), 1);
        assert!(fields.contains_key(VALUE_FIELD));
    }

    #[tokio::test]
    async fn test_set_long_absolute_with_sliding_persists_ceiling() {
        let (backend, clock, cache) = harness(ScriptedBackend::new());
        let ceiling = clock.now() + TimeDelta::seconds(60);
        let options = EntryOptions::new()
            .with_absolute_expiration(ceiling)
            .with_sliding_expiration(secs(30));

        cache.set("k", Bytes::from_static(&[1, 2, 3]), &options).await.unwrap();

        let calls = backend.calls();
        let Call::SetFields { fields, ttl, .. } = &calls[0] else {
            panic!("expected a set");
        };
        assert_eq!(*ttl, Ttl::Of(secs(30)));
        assert_eq!(fields[SLIDING_FIELD], encode_duration(secs(30)));
        assert_eq!(fields[ABSOLUTE_FIELD], encode_instant(ceiling));
    }

    #[tokio::test]
    async fn test_set_past_absolute_makes_no_calls() {
        let (backend, clock, cache) = harness(ScriptedBackend::new());
        let options = EntryOptions::new().with_absolute_expiration(clock.now());

        let err = cache.set("k", Bytes::new(), &options).await.unwrap_err();

        assert!(matches!(err, CacheError::InvalidArgument { .. }));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_set_error_is_the_backend_error() {
        let failure = BackendError::new(BackendErrorKind::LimitExceeded, "too many writes");
        let (_backend, _clock, cache) =
            harness(ScriptedBackend::new().on_set(Err(failure.clone())));

        let err = cache
            .set("k", Bytes::from_static(b"v"), &EntryOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err, CacheError::Backend(failure));
    }

    #[tokio::test]
    async fn test_get_miss_makes_one_call() {
        let (backend, _clock, cache) = harness(ScriptedBackend::new());

        assert_eq!(cache.get("k").await.unwrap(), None);
        assert_eq!(
            backend.calls(),
            vec![Call::GetFields {
                cache_name: CACHE_NAME.to_string(),
                key: "k".to_string(),
                fields: vec![
                    VALUE_FIELD.to_string(),
                    SLIDING_FIELD.to_string(),
                    ABSOLUTE_FIELD.to_string()
                ],
            }]
        );
    }

    #[tokio::test]
    async fn test_get_fixed_hit_does_not_refresh() {
        let (backend, _clock, cache) = harness(
            ScriptedBackend::new().on_get(hit(&[(VALUE_FIELD, Bytes::from_static(b"v"))])),
        );

        assert_eq!(cache.get("k").await.unwrap(), Some(Bytes::from_static(b"v")));
        assert_eq!(backend.update_ttl_calls(), 0);
    }

    #[tokio::test]
    async fn test_get_refresh_caps_at_ceiling() {
        let (backend, clock, cache) = harness(ScriptedBackend::new());
        let ceiling = clock.now() + TimeDelta::seconds(12);
        backend.set_get_response(hit(&[
            (VALUE_FIELD, Bytes::from_static(b"v")),
            (SLIDING_FIELD, encode_duration(secs(30))),
            (ABSOLUTE_FIELD, encode_instant(ceiling)),
        ]));

        cache.get("k").await.unwrap();

        assert_eq!(backend.last_update_ttl(), Some(secs(12)));
    }

    #[tokio::test]
    async fn test_get_fetch_error_skips_refresh() {
        let failure = BackendError::new(BackendErrorKind::Unavailable, "connection reset");
        let (backend, _clock, cache) =
            harness(ScriptedBackend::new().on_get(GetFieldsResponse::Error(failure.clone())));

        let err = cache.get("k").await.unwrap_err();

        assert_eq!(err, CacheError::Backend(failure));
        assert_eq!(backend.update_ttl_calls(), 0);
    }

    #[tokio::test]
    async fn test_get_update_error_surfaces() {
        let failure = BackendError::new(BackendErrorKind::Timeout, "slow");
        let (_backend, _clock, cache) = harness(
            ScriptedBackend::new()
                .on_get(hit(&[
                    (VALUE_FIELD, Bytes::from_static(b"v")),
                    (SLIDING_FIELD, encode_duration(secs(30))),
                ]))
                .on_update_ttl(Err(failure.clone())),
        );

        assert_eq!(cache.get("k").await.unwrap_err(), CacheError::Backend(failure));
    }

    #[tokio::test]
    async fn test_get_sidecars_without_value_is_a_miss() {
        let (backend, _clock, cache) = harness(
            ScriptedBackend::new().on_get(hit(&[(SLIDING_FIELD, encode_duration(secs(30)))])),
        );

        assert_eq!(cache.get("k").await.unwrap(), None);
        assert_eq!(backend.update_ttl_calls(), 1);
    }

    #[tokio::test]
    async fn test_get_malformed_sliding_field_surfaces() {
        let (backend, _clock, cache) = harness(ScriptedBackend::new().on_get(hit(&[
            (VALUE_FIELD, Bytes::from_static(b"v")),
            (SLIDING_FIELD, Bytes::from_static(b"00:00:30")),
        ])));

        let err = cache.get("k").await.unwrap_err();

        assert!(matches!(
            err,
            CacheError::MalformedField {
                field: SLIDING_FIELD,
                ..
            }
        ));
        assert_eq!(backend.update_ttl_calls(), 0);
    }

    #[tokio::test]
    async fn test_refresh_does_not_fetch_value() {
        let (backend, _clock, cache) = harness(
            ScriptedBackend::new().on_get(hit(&[(SLIDING_FIELD, encode_duration(secs(5)))])),
        );

        cache.refresh("k").await.unwrap();

        let calls = backend.calls();
        let Call::GetFields { fields, .. } = &calls[0] else {
            panic!("expected a fetch");
        };
        assert_eq!(
            fields,
            &vec![SLIDING_FIELD.to_string(), ABSOLUTE_FIELD.to_string()]
        );
        assert_eq!(backend.last_update_ttl(), Some(secs(5)));
    }

    #[tokio::test]
    async fn test_cancelled_token_skips_ttl_update() {
        let (backend, _clock, cache) = harness(ScriptedBackend::new().on_get(hit(&[
            (VALUE_FIELD, Bytes::from_static(b"v")),
            (SLIDING_FIELD, encode_duration(secs(30))),
        ])));
        let token = CancellationToken::new();
        token.cancel();

        let err = cache.get_with_token("k", &token).await.unwrap_err();

        assert_eq!(err, CacheError::Cancelled);
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_token_does_not_matter_without_slide() {
        let (_backend, _clock, cache) = harness(
            ScriptedBackend::new().on_get(hit(&[(VALUE_FIELD, Bytes::from_static(b"v"))])),
        );
        let token = CancellationToken::new();
        token.cancel();

        let value = cache.get_with_token("k", &token).await.unwrap();
        assert_eq!(value, Some(Bytes::from_static(b"v")));
    }

    #[tokio::test]
    async fn test_cancelled_set_writes_nothing() {
        let (backend, _clock, cache) = harness(ScriptedBackend::new());
        let token = CancellationToken::new();
        token.cancel();

        let err = cache
            .set_with_token("k", Bytes::new(), &EntryOptions::default(), &token)
            .await
            .unwrap_err();

        assert_eq!(err, CacheError::Cancelled);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_remove_issues_only_delete() {
        let (backend, _clock, cache) = harness(ScriptedBackend::new());

        cache.remove("k").await.unwrap();

        assert_eq!(
            backend.calls(),
            vec![Call::Delete {
                cache_name: CACHE_NAME.to_string(),
                key: "k".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_options_snapshot_taken_per_operation() {
        use crate::config::{CacheOptions, WatchedOptions};
        use crate::cache::ManualClock;

        let backend = Arc::new(ScriptedBackend::new());
        let (updater, source) =
            WatchedOptions::new(CacheOptions::new("first", secs(60)).unwrap());
        let cache = DictionaryCache::new(
            backend.clone(),
            Arc::new(source),
            Arc::new(ManualClock::new(Utc::now())),
        );

        cache.remove("k").await.unwrap();
        updater.update(CacheOptions::new("second", secs(60)).unwrap());
        cache.remove("k").await.unwrap();

        let names: Vec<String> = backend
            .calls()
            .into_iter()
            .map(|call| match call {
                Call::Delete { cache_name, .. } => cache_name,
                other => panic!("unexpected call {:?}", other),
            })
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }
}
