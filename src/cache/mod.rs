//! Cache module - records flattened into store hashes.
//!
//! Records of otherwise unrelated types are cached under `"<class>:<id>"`
//! keys so application code can join them without a database join.
//!
//! ## Architecture
//!
//! - `RecordCache` - bulk cache/delete/fetch over a [`HashStore`](crate::store::HashStore)
//! - `CacheKey` - the one key format shared by writes and reads
//! - `Record` - what can be cached (objects with a type name, or plain mappings)
//! - `FetchedRecord` - read-only view of a cached record
//!
//! ## Usage
//!
//! ```rust,ignore
//! let cache = RecordCache::new(Arc::new(MemoryStore::new()), CacheConfig::default());
//!
//! cache.cache_records(&users, Some("User")).await?;
//! let authors = cache.fetch_records(Some("User"), &author_ids).await?;
//! ```

mod config;
mod key;
mod record;
mod record_cache;

pub use config::{CacheConfig, DEFAULT_BATCH_SIZE, DEFAULT_TTL};
pub use key::{derive_key, derive_key_from_id, CacheKey, GENERIC_MAPPING_LABELS};
pub use record::{Attributes, Entity, FetchedRecord, Record, RecordId, ID_FIELDS};
pub use record_cache::RecordCache;
