//! Entry Options Module
//!
//! The expiration request a caller attaches to a set.

use std::time::Duration;

use chrono::{DateTime, Utc};

// == Entry Options ==
/// Expiration settings for a single cache entry.
///
/// All fields are optional and may be combined freely; see
/// [`crate::cache::resolve`] for how they are reconciled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryOptions {
    /// Instant after which the entry must be gone
    pub absolute_expiration: Option<DateTime<Utc>>,
    /// Same as `absolute_expiration`, but relative to the time of the set.
    /// Takes priority over `absolute_expiration` when both are given.
    pub absolute_expiration_relative_to_now: Option<Duration>,
    /// Window that restarts on every read
    pub sliding_expiration: Option<Duration>,
}

impl EntryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_absolute_expiration(mut self, at: DateTime<Utc>) -> Self {
        self.absolute_expiration = Some(at);
        self
    }

    pub fn with_expiration_relative_to_now(mut self, after: Duration) -> Self {
        self.absolute_expiration_relative_to_now = Some(after);
        self
    }

    pub fn with_sliding_expiration(mut self, window: Duration) -> Self {
        self.sliding_expiration = Some(window);
        self
    }
}
