//! Cache Module
//!
//! Distributed cache adapter translating absolute and sliding expirations
//! onto a backend with one TTL per key and a dictionary of fields per entry.

mod adapter;
mod backend;
mod blocking;
mod clock;
pub mod marshal;
mod options;
mod policy;

#[cfg(test)]
mod test_support;

// Re-export public types
pub use adapter::{DictionaryCache, DistributedCache};
pub use backend::{CacheBackend, Fields, GetFieldsResponse};
pub use blocking::BlockingCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use options::EntryOptions;
pub use policy::{refresh_ttl, resolve, ResolvedExpiration, Ttl};

// == Field Names ==
// Kept to one byte each; they are sent with every request.

/// Field holding the cached payload
pub const VALUE_FIELD: &str = "v";

/// Field holding the encoded sliding window
pub const SLIDING_FIELD: &str = "s";

/// Field holding the encoded slide ceiling
pub const ABSOLUTE_FIELD: &str = "a";
