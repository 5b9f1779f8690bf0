//! Configuration Module
//!
//! Handles loading and managing engine configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Default cache TTL: 24 hours.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

/// Default in-memory store quota, matching typical browser storage limits.
pub const DEFAULT_STORE_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Engine configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// TTL in seconds applied to every cache entry
    pub cache_ttl: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Upper bound in seconds for a single fetcher call
    pub fetch_timeout: u64,
    /// File backing the store; in-memory when unset
    pub store_path: Option<PathBuf>,
    /// Byte quota of the in-memory store
    pub store_quota_bytes: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_SECS` - Cache entry TTL in seconds (default: 86400)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 60)
    /// - `FETCH_TIMEOUT_SECS` - Fetcher timeout in seconds (default: 30)
    /// - `STORE_PATH` - JSON file for a durable store (default: in-memory)
    /// - `STORE_QUOTA_BYTES` - In-memory store quota (default: 5 MiB)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_ttl: env_or("CACHE_TTL_SECS", defaults.cache_ttl),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            fetch_timeout: env_or("FETCH_TIMEOUT_SECS", defaults.fetch_timeout),
            store_path: env::var("STORE_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            store_quota_bytes: env_or("STORE_QUOTA_BYTES", defaults.store_quota_bytes),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL_SECS,
            server_port: 3000,
            cleanup_interval: 60,
            fetch_timeout: 30,
            store_path: None,
            store_quota_bytes: DEFAULT_STORE_QUOTA_BYTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache_ttl, 86_400);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 60);
        assert_eq!(config.fetch_timeout, 30);
        assert!(config.store_path.is_none());
        assert_eq!(config.store_quota_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_TTL_SECS");
        env::remove_var("SERVER_PORT");
        env::remove_var("CLEANUP_INTERVAL");
        env::remove_var("FETCH_TIMEOUT_SECS");
        env::remove_var("STORE_PATH");
        env::remove_var("STORE_QUOTA_BYTES");

        let config = Config::from_env();
        assert_eq!(config.cache_ttl, 86_400);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 60);
        assert!(config.store_path.is_none());
    }

    #[test]
    fn test_env_or_ignores_unparsable_values() {
        env::set_var("FILTER_CACHE_TEST_PORT", "not-a-port");
        assert_eq!(env_or::<u16>("FILTER_CACHE_TEST_PORT", 8080), 8080);
        env::remove_var("FILTER_CACHE_TEST_PORT");
    }
}
