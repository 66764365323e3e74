//! Hash store clients.
//!
//! The record cache talks to its store only through [`HashStore`]:
//! - [`RedisStore`] - the production backend (Redis hashes, pipelines, `EXPIRE`)
//! - [`MemoryStore`] - in-process backend on Moka with per-key TTL

mod memory;
mod redis_store;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

pub use self::memory::{DEFAULT_MEMORY_CAPACITY, MemoryStore};
pub use self::redis_store::RedisStore;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A write command that can be sent as part of a [`Pipeline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCommand {
    /// Write fields into the hash at `key`.
    HashSet {
        key: String,
        fields: HashMap<String, String>,
    },
    /// Set the key's time-to-live.
    Expire { key: String, ttl: Duration },
    /// Remove the key.
    Delete { key: String },
}

impl StoreCommand {
    pub fn key(&self) -> &str {
        match self {
            Self::HashSet { key, .. } | Self::Expire { key, .. } | Self::Delete { key } => key,
        }
    }
}

/// Commands grouped into one round trip. No atomicity: a failure part-way
/// may leave earlier commands applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    commands: Vec<StoreCommand>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity),
        }
    }

    pub fn hash_set(&mut self, key: impl Into<String>, fields: HashMap<String, String>) -> &mut Self {
        self.commands.push(StoreCommand::HashSet {
            key: key.into(),
            fields,
        });
        self
    }

    pub fn expire(&mut self, key: impl Into<String>, ttl: Duration) -> &mut Self {
        self.commands.push(StoreCommand::Expire {
            key: key.into(),
            ttl,
        });
        self
    }

    pub fn delete(&mut self, key: impl Into<String>) -> &mut Self {
        self.commands.push(StoreCommand::Delete { key: key.into() });
        self
    }

    pub fn commands(&self) -> &[StoreCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl IntoIterator for Pipeline {
    type Item = StoreCommand;
    type IntoIter = std::vec::IntoIter<StoreCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}

/// Client interface of a key-value store with hash-per-key values,
/// pipelining and per-key expiration.
#[async_trait]
pub trait HashStore: Send + Sync {
    /// Write fields into the hash at `key`, creating it if missing.
    /// Existing fields not named are kept, and so is any TTL; callers that
    /// need to replace an entry delete the key first.
    async fn hash_set(&self, key: &str, fields: &HashMap<String, String>) -> StoreResult<()>;

    /// Read all fields. Empty map when the key is absent.
    async fn hash_get_all(&self, key: &str) -> StoreResult<HashMap<String, String>>;

    /// Read one field.
    async fn hash_get(&self, key: &str, field: &str) -> StoreResult<Option<String>>;

    /// Remove a key. Returns `true` if it existed.
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Set a key's time-to-live. No-op when the key is absent.
    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<()>;

    /// Send every command of the pipeline in one round trip.
    async fn execute(&self, pipeline: Pipeline) -> StoreResult<()>;

    /// Drop every key. Test harness helper.
    async fn flush_all(&self) -> StoreResult<()>;

    /// Number of live keys. Test harness helper.
    async fn size(&self) -> StoreResult<usize>;

    /// Backend identifier for logging.
    fn backend_type(&self) -> &str;
}
