//! Stored Dictionary Module
//!
//! A single key's dictionary of fields with its TTL.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::cache::Fields;

// == Stored Dictionary ==
/// Represents the fields stored under one key, plus expiration metadata.
#[derive(Debug, Clone)]
pub struct StoredDictionary {
    /// Named byte fields
    pub fields: Fields,
    /// Expiration instant
    pub expires_at: DateTime<Utc>,
}

impl StoredDictionary {
    // == Constructor ==
    /// Creates a dictionary that expires `ttl` after `now`.
    pub fn new(fields: Fields, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            fields,
            expires_at: deadline(now, ttl),
        }
    }

    // == Is Expired ==
    /// Checks if the dictionary has expired.
    ///
    /// Boundary condition: expired once `now` reaches the expiration instant,
    /// so a zero TTL expires immediately.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    // == Reset TTL ==
    /// Restarts the TTL from `now`.
    pub fn reset_ttl(&mut self, now: DateTime<Utc>, ttl: Duration) {
        self.expires_at = deadline(now, ttl);
    }

    // == Time To Live ==
    /// Remaining TTL; zero once expired.
    pub fn ttl_remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }
}

/// `now + ttl`, saturating at the latest representable instant.
fn deadline(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
