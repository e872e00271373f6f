//! Blocking Facade Module
//!
//! Synchronous counterparts of the [`DistributedCache`] operations.

use std::io;

use bytes::Bytes;
use tokio::runtime::{Builder, Runtime};

use crate::cache::{DistributedCache, EntryOptions};
use crate::error::Result;

// == Blocking Cache ==
/// Runs each operation of the wrapped cache to completion on the calling
/// thread and hands back its result as is.
///
/// Owns a current-thread runtime, so it must not be used from inside an
/// async context (tokio panics on nested `block_on`).
pub struct BlockingCache<C> {
    inner: C,
    runtime: Runtime,
}

impl<C: DistributedCache> BlockingCache<C> {
    /// Wraps `inner` with a fresh current-thread runtime.
    pub fn new(inner: C) -> io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self { inner, runtime })
    }

    /// The wrapped asynchronous cache.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.runtime.block_on(self.inner.get(key))
    }

    pub fn set(&self, key: &str, value: Bytes, options: &EntryOptions) -> Result<()> {
        self.runtime.block_on(self.inner.set(key, value, options))
    }

    pub fn refresh(&self, key: &str) -> Result<()> {
        self.runtime.block_on(self.inner.refresh(key))
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.runtime.block_on(self.inner.remove(key))
    }
}
