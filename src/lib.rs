//! Record Cache - app-side joins over Redis hashes
//!
//! Caches records of unrelated types as flattened hashes under
//! `"<class>:<id>"` keys, then reads them back one record or one field at
//! a time, so application code can join them without a database join.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `cache` - Key policy, records, and the bulk `RecordCache` operations
//! - `store` - Hash store clients (Redis, in-memory Moka)
//! - `error` - Error types
//! - `utils` - Utility functions

pub mod cache;
pub mod config;
pub mod error;
pub mod store;
mod utils;

pub use cache::{
    derive_key, derive_key_from_id, Attributes, CacheConfig, CacheKey, Entity, FetchedRecord,
    Record, RecordCache, RecordId,
};
pub use config::Config;
pub use error::{ConfigError, RecordCacheError, Result, StoreError};
pub use store::{HashStore, MemoryStore, Pipeline, RedisStore, StoreCommand};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
