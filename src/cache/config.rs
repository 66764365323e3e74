//! Cache configuration.

use std::time::Duration;

/// Default time-to-live for cached records: one week.
pub const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

/// Default number of records written per pipelined round trip.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Configuration for a [`RecordCache`](super::RecordCache) instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Time-to-live applied to every written key.
    /// `None` disables expiration entirely (no `EXPIRE` is issued).
    pub ttl: Option<Duration>,

    /// Maximum records per pipelined batch.
    pub batch_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Some(DEFAULT_TTL),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl CacheConfig {
    /// Set time-to-live for cached records.
    #[must_use]
    pub fn ttl(mut self, duration: Duration) -> Self {
        self.ttl = Some(duration);
        self
    }

    /// Disable TTL (cached records never expire).
    #[must_use]
    pub fn no_ttl(mut self) -> Self {
        self.ttl = None;
        self
    }

    /// Set the pipelined batch size. Zero is clamped to one.
    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Batch size actually used when chunking.
    pub(crate) fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}
