//! Error types.

use thiserror::Error;

/// Errors raised by the record cache operations.
#[derive(Error, Debug)]
pub enum RecordCacheError {
    /// The record (or explicit id) carries no identifier.
    #[error("missing record_id")]
    MissingRecordId,

    /// No usable record class: absent, empty, or a generic mapping label.
    #[error("missing record_class")]
    MissingRecordClass,

    /// The store client failed. Propagated unchanged, never retried here.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A value could not be turned into (or read back from) an attribute map.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors surfaced by a [`HashStore`](crate::store::HashStore) implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Invalid configuration read from the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Result alias for record cache operations.
pub type Result<T> = std::result::Result<T, RecordCacheError>;
