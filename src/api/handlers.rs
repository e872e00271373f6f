//! API Handlers
//!
//! HTTP request handlers for each endpoint of the demo server.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use bytes::Bytes;

use crate::cache::{Clock, DictionaryCache, DistributedCache, SystemClock};
use crate::config::{Config, StaticOptions};
use crate::error::ApiError;
use crate::models::{AckResponse, GetResponse, HealthResponse, SetRequest};
use crate::store::MemoryBackend;

type Result<T> = std::result::Result<T, ApiError>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cache adapter serving the requests
    pub cache: DictionaryCache,
    /// Backend behind the adapter, kept for the cleanup task
    pub backend: Arc<MemoryBackend>,
}

impl AppState {
    /// Wires an adapter over `backend`.
    pub fn new(backend: Arc<MemoryBackend>, config: &Config, clock: Arc<dyn Clock>) -> Self {
        let cache = DictionaryCache::new(
            backend.clone(),
            Arc::new(StaticOptions::new(config.cache.clone())),
            clock,
        );
        Self { cache, backend }
    }

    /// Creates a new AppState from configuration.
    ///
    /// The in-process backend uses the configured default TTL as its own
    /// client default.
    pub fn from_config(config: &Config) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let backend = Arc::new(MemoryBackend::new(
            config.cache.default_ttl(),
            clock.clone(),
        ));
        Self::new(backend, config, clock)
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair with the requested expirations.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<AckResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::BadRequest(error_msg));
    }

    let options = req.entry_options();
    state
        .cache
        .set(&req.key, Bytes::from(req.value.into_bytes()), &options)
        .await?;

    Ok(Json(AckResponse::set(req.key)))
}

/// Handler for GET /get/:key
///
/// Retrieves a value, extending its sliding expiration.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.cache.get(&key).await? {
        Some(value) => {
            let value = String::from_utf8_lossy(&value).into_owned();
            Ok(Json(GetResponse::new(key, value)))
        }
        None => Err(ApiError::NotFound(key)),
    }
}

/// Handler for POST /refresh/:key
///
/// Extends the sliding expiration of a key without returning it.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<AckResponse>> {
    state.cache.refresh(&key).await?;
    Ok(Json(AckResponse::refreshed(key)))
}

/// Handler for DELETE /del/:key
///
/// Deletes a key from the cache.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<AckResponse>> {
    state.cache.remove(&key).await?;
    Ok(Json(AckResponse::deleted(key)))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
