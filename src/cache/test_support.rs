//! Scripted backend that records every call, for adapter tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::DateTime;

use crate::cache::{CacheBackend, DictionaryCache, Fields, GetFieldsResponse, ManualClock, Ttl};
use crate::config::{CacheOptions, StaticOptions};
use crate::error::BackendError;

pub const CACHE_NAME: &str = "test-cache";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetFields {
        cache_name: String,
        key: String,
        fields: Vec<String>,
    },
    SetFields {
        cache_name: String,
        key: String,
        fields: Fields,
        ttl: Ttl,
    },
    UpdateTtl {
        cache_name: String,
        key: String,
        ttl: Duration,
    },
    Delete {
        cache_name: String,
        key: String,
    },
}

pub struct ScriptedBackend {
    calls: Mutex<Vec<Call>>,
    get_response: Mutex<GetFieldsResponse>,
    set_result: Result<(), BackendError>,
    update_ttl_result: Result<(), BackendError>,
    delete_result: Result<(), BackendError>,
}

impl ScriptedBackend {
    /// Every fetch misses, every write succeeds.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            get_response: Mutex::new(GetFieldsResponse::Miss),
            set_result: Ok(()),
            update_ttl_result: Ok(()),
            delete_result: Ok(()),
        }
    }

    pub fn on_get(self, response: GetFieldsResponse) -> Self {
        self.set_get_response(response);
        self
    }

    pub fn on_set(mut self, result: Result<(), BackendError>) -> Self {
        self.set_result = result;
        self
    }

    pub fn on_update_ttl(mut self, result: Result<(), BackendError>) -> Self {
        self.update_ttl_result = result;
        self
    }

    pub fn on_delete(mut self, result: Result<(), BackendError>) -> Self {
        self.delete_result = result;
        self
    }

    pub fn set_get_response(&self, response: GetFieldsResponse) {
        *self.get_response.lock().unwrap() = response;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn update_ttl_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::UpdateTtl { .. }))
            .count()
    }

    pub fn last_update_ttl(&self) -> Option<Duration> {
        self.calls().into_iter().rev().find_map(|c| match c {
            Call::UpdateTtl { ttl, .. } => Some(ttl),
            _ => None,
        })
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl CacheBackend for ScriptedBackend {
    async fn get_fields(&self, cache_name: &str, key: &str, fields: &[&str]) -> GetFieldsResponse {
        self.record(Call::GetFields {
            cache_name: cache_name.to_string(),
            key: key.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        });
        self.get_response.lock().unwrap().clone()
    }

    async fn set_fields(
        &self,
        cache_name: &str,
        key: &str,
        fields: Fields,
        ttl: Ttl,
    ) -> Result<(), BackendError> {
        self.record(Call::SetFields {
            cache_name: cache_name.to_string(),
            key: key.to_string(),
            fields,
            ttl,
        });
        self.set_result.clone()
    }

    async fn update_ttl(
        &self,
        cache_name: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<(), BackendError> {
        self.record(Call::UpdateTtl {
            cache_name: cache_name.to_string(),
            key: key.to_string(),
            ttl,
        });
        self.update_ttl_result.clone()
    }

    async fn delete(&self, cache_name: &str, key: &str) -> Result<(), BackendError> {
        self.record(Call::Delete {
            cache_name: cache_name.to_string(),
            key: key.to_string(),
        });
        self.delete_result.clone()
    }
}

/// A hit holding exactly `fields`.
pub fn hit(fields: &[(&str, Bytes)]) -> GetFieldsResponse {
    GetFieldsResponse::Hit(
        fields
            .iter()
            .map(|(name, raw)| (name.to_string(), raw.clone()))
            .collect(),
    )
}

/// Adapter wired to `backend` and a clock frozen at a fixed instant.
pub fn harness(
    backend: ScriptedBackend,
) -> (Arc<ScriptedBackend>, Arc<ManualClock>, DictionaryCache) {
    let backend = Arc::new(backend);
    let clock = Arc::new(ManualClock::new(
        DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
    ));
    let options = CacheOptions::new(CACHE_NAME, Duration::from_secs(300)).unwrap();
    let cache = DictionaryCache::new(
        backend.clone(),
        Arc::new(StaticOptions::new(options)),
        clock.clone(),
    );
    (backend, clock, cache)
}
