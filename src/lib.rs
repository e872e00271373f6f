//! Slidecache - a distributed cache adapter
//!
//! Implements absolute and sliding expirations on top of a key-value backend
//! that offers only a dictionary of fields and a single TTL per key.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use cache::{BlockingCache, DictionaryCache, DistributedCache, EntryOptions};
pub use config::{CacheOptions, Config};
pub use error::{BackendError, BackendErrorKind, CacheError};
pub use tasks::spawn_cleanup_task;
