//! Store Module
//!
//! In-process backend storing a dictionary of fields per key with a TTL.

mod entry;
mod memory;

pub use entry::StoredDictionary;
pub use memory::MemoryBackend;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed dictionary size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
