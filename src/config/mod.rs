//! Configuration module for the record cache.
//!
//! Loads configuration from environment variables (and `.env`, if present).

use std::env;
use std::time::Duration;

use crate::cache::{CacheConfig, DEFAULT_BATCH_SIZE, DEFAULT_TTL};
use crate::error::ConfigError;
use crate::store::DEFAULT_MEMORY_CAPACITY;
use crate::utils::parse_ttl;

/// Redis used when `REDIS_URL` is not set.
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    // Redis
    pub redis_url: String,

    /// Time-to-live of cached records. `None` disables expiration.
    pub ttl: Option<Duration>,

    /// Records per pipelined batch.
    pub batch_size: usize,

    /// Max keys held by the in-memory store.
    pub memory_capacity: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: DEFAULT_REDIS_URL.to_string(),
            ttl: Some(DEFAULT_TTL),
            batch_size: DEFAULT_BATCH_SIZE,
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// - `REDIS_URL` (default `redis://127.0.0.1:6379`)
    /// - `RECORD_CACHE_TTL` - `30m`, `12h`, `1w`, seconds, or `none`/`0`/`-1` (default `1w`)
    /// - `RECORD_CACHE_BATCH_SIZE` (default 100)
    /// - `RECORD_CACHE_MEMORY_CAPACITY` (default 100000)
    ///
    /// # Errors
    /// Returns error naming the variable if a value cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let defaults = Self::default();

        let redis_url = lookup("REDIS_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.redis_url);

        let ttl = match lookup("RECORD_CACHE_TTL") {
            Some(value) => parse_ttl(&value).map_err(|()| ConfigError::Invalid {
                var: "RECORD_CACHE_TTL",
                value,
            })?,
            None => defaults.ttl,
        };

        let batch_size = parse_var(&lookup, "RECORD_CACHE_BATCH_SIZE")?
            .unwrap_or(defaults.batch_size)
            .max(1);

        let memory_capacity = parse_var(&lookup, "RECORD_CACHE_MEMORY_CAPACITY")?
            .unwrap_or(defaults.memory_capacity);

        Ok(Self {
            redis_url,
            ttl,
            batch_size,
            memory_capacity,
        })
    }

    /// Record cache settings derived from this configuration.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            ttl: self.ttl,
            batch_size: self.batch_size,
        }
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(var)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { var, value })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let vars: HashMap<&'static str, String> =
            vars.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.cache_config(), CacheConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("REDIS_URL", "redis://cache:6380/2"),
            ("RECORD_CACHE_TTL", "12h"),
            ("RECORD_CACHE_BATCH_SIZE", "250"),
            ("RECORD_CACHE_MEMORY_CAPACITY", "10"),
        ]))
        .unwrap();

        assert_eq!(config.redis_url, "redis://cache:6380/2");
        assert_eq!(config.ttl, Some(Duration::from_secs(43200)));
        assert_eq!(config.batch_size, 250);
        assert_eq!(config.memory_capacity, 10);
    }

    #[test]
    fn test_ttl_disabled() {
        let config = Config::from_lookup(lookup(&[("RECORD_CACHE_TTL", "-1")])).unwrap();
        assert_eq!(config.ttl, None);
        assert_eq!(config.cache_config().ttl, None);
    }

    #[test]
    fn test_invalid_values() {
        let err = Config::from_lookup(lookup(&[("RECORD_CACHE_BATCH_SIZE", "lots")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value for RECORD_CACHE_BATCH_SIZE: \"lots\""
        );

        assert!(Config::from_lookup(lookup(&[("RECORD_CACHE_TTL", "later")])).is_err());
    }
}
