//! Expiration Policy Module
//!
//! Reconciles an absolute deadline and a sliding window with a backend that
//! only knows a single TTL per key.
//!
//! The effective relative expiration is `R = relative_to_now ?? (absolute - now)`.
//!
//! | R        | sliding S | sidecar fields     | backend TTL      |
//! |----------|-----------|--------------------|------------------|
//! | `R > S`  | yes       | `s = S, a = now+R` | `S`              |
//! | yes      | none/`≤R` | none               | `R`              |
//! | none     | yes       | `s = S`            | `S`              |
//! | none     | none      | none               | client default   |

use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};

use crate::cache::marshal::{encode_duration, encode_instant};
use crate::cache::{EntryOptions, ABSOLUTE_FIELD, SLIDING_FIELD};
use crate::error::{CacheError, Result};

// == TTL ==
/// TTL requested from the backend on a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Leave the TTL to the backend client's own configured default
    ClientDefault,
    /// Expire after exactly this long
    Of(Duration),
}

// == Resolved Expiration ==
/// What a set should persist next to the value, and the TTL to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedExpiration {
    /// Sliding window, persisted when reads must extend the TTL
    pub sliding: Option<Duration>,
    /// Ceiling on sliding; only ever present together with `sliding`
    pub absolute: Option<DateTime<Utc>>,
    /// TTL for the write itself
    pub ttl: Ttl,
}

impl ResolvedExpiration {
    /// Encoded sidecar fields to store beside the value.
    pub fn sidecar_fields(&self) -> Vec<(&'static str, Bytes)> {
        let mut fields = Vec::with_capacity(2);
        if let Some(sliding) = self.sliding {
            fields.push((SLIDING_FIELD, encode_duration(sliding)));
        }
        if let Some(absolute) = self.absolute {
            fields.push((ABSOLUTE_FIELD, encode_instant(absolute)));
        }
        fields
    }
}

// == Resolve ==
/// Decides sidecar fields and backend TTL for a set happening at `now`.
///
/// # Errors
/// `InvalidArgument` when the absolute expiration is not strictly after `now`,
/// or when a relative or sliding expiration is zero.
pub fn resolve(now: DateTime<Utc>, options: &EntryOptions) -> Result<ResolvedExpiration> {
    let relative = relative_expiration(now, options)?;

    if options.sliding_expiration.is_some_and(|s| s.is_zero()) {
        return Err(CacheError::invalid_argument(
            "sliding_expiration",
            "the sliding expiration must be a positive duration",
        ));
    }

    let resolved = match (relative, options.sliding_expiration) {
        // Slide, but never past now + R.
        (Some(relative), Some(sliding)) if relative > sliding => ResolvedExpiration {
            sliding: Some(sliding),
            absolute: Some(add(now, relative)?),
            ttl: Ttl::Of(sliding),
        },
        // A slide that can't outlive R is just R.
        (Some(relative), _) => ResolvedExpiration {
            sliding: None,
            absolute: None,
            ttl: Ttl::Of(relative),
        },
        (None, Some(sliding)) => ResolvedExpiration {
            sliding: Some(sliding),
            absolute: None,
            ttl: Ttl::Of(sliding),
        },
        (None, None) => ResolvedExpiration {
            sliding: None,
            absolute: None,
            ttl: Ttl::ClientDefault,
        },
    };

    Ok(resolved)
}

fn relative_expiration(now: DateTime<Utc>, options: &EntryOptions) -> Result<Option<Duration>> {
    let from_absolute = match options.absolute_expiration {
        Some(absolute) if absolute <= now => {
            return Err(CacheError::invalid_argument(
                "absolute_expiration",
                format!("the absolute expiration {absolute} must be in the future"),
            ));
        }
        Some(absolute) => Some(until(now, absolute)),
        None => None,
    };

    match options.absolute_expiration_relative_to_now {
        Some(relative) if relative.is_zero() => Err(CacheError::invalid_argument(
            "absolute_expiration_relative_to_now",
            "the relative expiration must be a positive duration",
        )),
        Some(relative) => Ok(Some(relative)),
        None => Ok(from_absolute),
    }
}

// == Refresh TTL ==
/// TTL to apply when a sliding entry is read at `now`.
///
/// With a ceiling this is `min(sliding, absolute - now)`; a ceiling already
/// reached yields zero.
pub fn refresh_ttl(
    now: DateTime<Utc>,
    sliding: Duration,
    absolute: Option<DateTime<Utc>>,
) -> Duration {
    match absolute {
        Some(absolute) => sliding.min(until(now, absolute)),
        None => sliding,
    }
}

/// Time from `now` to `then`, zero if `then` has passed.
fn until(now: DateTime<Utc>, then: DateTime<Utc>) -> Duration {
    (then - now).to_std().unwrap_or(Duration::ZERO)
}

fn add(now: DateTime<Utc>, relative: Duration) -> Result<DateTime<Utc>> {
    TimeDelta::from_std(relative)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or_else(|| {
            CacheError::invalid_argument(
                "absolute_expiration_relative_to_now",
                "the expiration is too far in the future",
            )
        })
}
