//! Configuration Module
//!
//! Handles loading and validating adapter and server configuration, and exposes
//! the currently effective cache options to the adapter.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::info;

use crate::error::ConfigError;

// == Cache Options ==
/// Options consumed by the cache adapter.
///
/// Only constructible through [`CacheOptions::new`], so every instance has
/// passed bind-time validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    cache_name: String,
    default_ttl: Duration,
}

impl CacheOptions {
    /// Validates and builds a set of cache options.
    ///
    /// # Errors
    /// - `cache_name` is empty or blank
    /// - `default_ttl` is zero
    pub fn new(cache_name: impl Into<String>, default_ttl: Duration) -> Result<Self, ConfigError> {
        let cache_name = cache_name.into();
        if cache_name.trim().is_empty() {
            return Err(ConfigError::Missing("CACHE_NAME"));
        }
        if default_ttl.is_zero() {
            return Err(ConfigError::Invalid {
                name: "DEFAULT_TTL",
                reason: "the default TTL must be a positive duration".to_string(),
            });
        }

        Ok(Self {
            cache_name,
            default_ttl,
        })
    }

    /// Name of the remote cache holding the entries.
    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    /// TTL the backend client applies when no expiration is requested.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

// == Options Source ==
/// Pull-based accessor for the currently effective cache options.
///
/// The adapter calls [`OptionsSource::current`] once at the start of each
/// operation and uses that snapshot throughout.
pub trait OptionsSource: Send + Sync {
    fn current(&self) -> Arc<CacheOptions>;
}

/// Options that never change.
#[derive(Debug, Clone)]
pub struct StaticOptions(Arc<CacheOptions>);

impl StaticOptions {
    pub fn new(options: CacheOptions) -> Self {
        Self(Arc::new(options))
    }
}

impl OptionsSource for StaticOptions {
    fn current(&self) -> Arc<CacheOptions> {
        Arc::clone(&self.0)
    }
}

/// Options that can be replaced while the adapter is running.
#[derive(Debug, Clone)]
pub struct WatchedOptions {
    rx: watch::Receiver<Arc<CacheOptions>>,
}

/// Publishing half of a [`WatchedOptions`] pair.
#[derive(Debug)]
pub struct OptionsUpdater {
    tx: watch::Sender<Arc<CacheOptions>>,
}

impl WatchedOptions {
    /// Creates a watched options source seeded with `initial`.
    pub fn new(initial: CacheOptions) -> (OptionsUpdater, Self) {
        let (tx, rx) = watch::channel(Arc::new(initial));
        (OptionsUpdater { tx }, Self { rx })
    }
}

impl OptionsSource for WatchedOptions {
    fn current(&self) -> Arc<CacheOptions> {
        Arc::clone(&*self.rx.borrow())
    }
}

impl OptionsUpdater {
    /// Publishes a new snapshot. Operations already in flight keep the one
    /// they started with.
    pub fn update(&self, options: CacheOptions) {
        info!(
            "Cache options updated: cache_name={}, default_ttl={:?}",
            options.cache_name(),
            options.default_ttl()
        );
        self.tx.send_replace(Arc::new(options));
    }
}

// == Server Config ==
/// Server configuration parameters.
///
/// Values are read from environment variables; only `CACHE_NAME` has no default.
#[derive(Debug, Clone)]
pub struct Config {
    /// Options handed to the cache adapter
    pub cache: CacheOptions,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_NAME` - Name of the cache (required)
    /// - `DEFAULT_TTL` - Default TTL in seconds, must be positive (default: 300)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`Config::from_env`] but reads settings through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cache_name = lookup("CACHE_NAME").ok_or(ConfigError::Missing("CACHE_NAME"))?;
        let default_ttl = parse_or(&lookup, "DEFAULT_TTL", 300u64)?;

        Ok(Self {
            cache: CacheOptions::new(cache_name, Duration::from_secs(default_ttl))?,
            server_port: parse_or(&lookup, "SERVER_PORT", 3000)?,
            cleanup_interval: parse_or(&lookup, "CLEANUP_INTERVAL", 1)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
