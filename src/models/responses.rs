//! Response DTOs for the demo HTTP API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Acknowledgement for SET, REFRESH and DELETE.
#[derive(Debug, Clone, Serialize)]
pub struct AckResponse {
    /// Success message
    pub message: String,
    /// The key that was acted on
    pub key: String,
}

impl AckResponse {
    pub fn set(key: impl Into<String>) -> Self {
        Self::new(key.into(), "set")
    }

    pub fn refreshed(key: impl Into<String>) -> Self {
        Self::new(key.into(), "refreshed")
    }

    pub fn deleted(key: impl Into<String>) -> Self {
        Self::new(key.into(), "deleted")
    }

    fn new(key: String, verb: &str) -> Self {
        Self {
            message: format!("Key '{}' {} successfully", key, verb),
            key,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
