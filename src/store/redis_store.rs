//! Redis hash store.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::{debug, info};

use super::{HashStore, Pipeline, StoreCommand, StoreResult};

/// Redis-backed [`HashStore`].
///
/// Holds a [`ConnectionManager`], which multiplexes one connection and
/// reconnects on failure. Cloning is cheap and shares the connection.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis at the given URL.
    ///
    /// # Errors
    /// Returns error if the URL is invalid or the server does not answer `PING`.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let client = Client::open(url)?;
        let mut conn = ConnectionManager::new(client).await?;

        // Ping the server to verify the connection
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        info!("Successfully connected to Redis");

        Ok(Self { conn })
    }

    /// Wrap an already established connection manager.
    pub fn from_manager(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

/// Redis TTLs are whole seconds; anything shorter still expires, after one.
fn ttl_secs(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX).max(1)
}

fn field_pairs(fields: &HashMap<String, String>) -> Vec<(&str, &str)> {
    fields
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect()
}

#[async_trait]
impl HashStore for RedisStore {
    async fn hash_set(&self, key: &str, fields: &HashMap<String, String>) -> StoreResult<()> {
        // HSET with no fields is a protocol error
        if fields.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        let pairs = field_pairs(fields);
        let _: () = conn.hset_multiple(key, pairs.as_slice()).await?;
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> StoreResult<HashMap<String, String>> {
        let mut conn = self.conn.clone();
        Ok(conn.hgetall(key).await?)
    }

    async fn hash_get(&self, key: &str, field: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.hget(key, field).await?)
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let removed: usize = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: bool = conn.expire(key, ttl_secs(ttl)).await?;
        Ok(())
    }

    async fn execute(&self, pipeline: Pipeline) -> StoreResult<()> {
        if pipeline.is_empty() {
            return Ok(());
        }

        let count = pipeline.len();
        let mut pipe = redis::pipe();
        for command in pipeline {
            match command {
                StoreCommand::HashSet { key, fields } => {
                    if !fields.is_empty() {
                        pipe.hset_multiple(&key, field_pairs(&fields).as_slice()).ignore();
                    }
                }
                StoreCommand::Expire { key, ttl } => {
                    pipe.expire(&key, ttl_secs(ttl)).ignore();
                }
                StoreCommand::Delete { key } => {
                    pipe.del(&key).ignore();
                }
            }
        }

        let mut conn = self.conn.clone();
        let _: () = pipe.query_async(&mut conn).await?;
        debug!("Executed Redis pipeline with {} commands", count);
        Ok(())
    }

    async fn flush_all(&self) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("FLUSHDB").query_async(&mut conn).await?;
        Ok(())
    }

    async fn size(&self) -> StoreResult<usize> {
        let mut conn = self.conn.clone();
        Ok(redis::cmd("DBSIZE").query_async(&mut conn).await?)
    }

    fn backend_type(&self) -> &str {
        "redis"
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}
