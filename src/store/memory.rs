//! In-process hash store on Moka.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::sync::Cache;
use parking_lot::Mutex;

use super::{HashStore, Pipeline, StoreCommand, StoreResult};

/// Default maximum number of keys held by a [`MemoryStore`].
pub const DEFAULT_MEMORY_CAPACITY: u64 = 100_000;

/// A stored hash and the expiry change that came with its last write.
#[derive(Clone)]
struct StoredHash {
    fields: Arc<HashMap<String, String>>,
    /// `Some` resets the time-to-live, `None` keeps whatever is left.
    expire_in: Option<Duration>,
}

/// Per-key expiration driven by `EXPIRE`-style writes.
struct KeyExpiry;

impl Expiry<String, StoredHash> for KeyExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredHash,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.expire_in
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredHash,
        _updated_at: Instant,
        duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.expire_in.or(duration_until_expiry)
    }
}

/// A [`HashStore`] kept in memory.
///
/// This store is:
/// - Bounded (least recently used keys are evicted past the capacity)
/// - Expiring per key, like Redis `EXPIRE`
/// - Clone-friendly (clones share the same underlying cache)
#[derive(Clone)]
pub struct MemoryStore {
    inner: Cache<String, StoredHash>,
    // Serializes read-modify-write merges.
    writes: Arc<Mutex<()>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MEMORY_CAPACITY)
    }

    /// Create a store holding at most `max_capacity` keys.
    pub fn with_capacity(max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(KeyExpiry)
            .build();

        Self {
            inner,
            writes: Arc::new(Mutex::new(())),
        }
    }

    fn set_fields(&self, key: &str, fields: &HashMap<String, String>) {
        if fields.is_empty() {
            return;
        }

        let mut merged = self
            .inner
            .get(key)
            .map(|existing| (*existing.fields).clone())
            .unwrap_or_default();
        merged.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));

        self.inner.insert(
            key.to_string(),
            StoredHash {
                fields: Arc::new(merged),
                expire_in: None,
            },
        );
    }

    fn set_ttl(&self, key: &str, ttl: Duration) {
        if let Some(existing) = self.inner.get(key) {
            self.inner.insert(
                key.to_string(),
                StoredHash {
                    fields: existing.fields,
                    expire_in: Some(ttl),
                },
            );
        }
    }

    fn remove(&self, key: &str) -> bool {
        self.inner.remove(key).is_some()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HashStore for MemoryStore {
    async fn hash_set(&self, key: &str, fields: &HashMap<String, String>) -> StoreResult<()> {
        let _guard = self.writes.lock();
        self.set_fields(key, fields);
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> StoreResult<HashMap<String, String>> {
        Ok(self
            .inner
            .get(key)
            .map(|stored| (*stored.fields).clone())
            .unwrap_or_default())
    }

    async fn hash_get(&self, key: &str, field: &str) -> StoreResult<Option<String>> {
        Ok(self
            .inner
            .get(key)
            .and_then(|stored| stored.fields.get(field).cloned()))
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let _guard = self.writes.lock();
        Ok(self.remove(key))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<()> {
        let _guard = self.writes.lock();
        self.set_ttl(key, ttl);
        Ok(())
    }

    async fn execute(&self, pipeline: Pipeline) -> StoreResult<()> {
        let _guard = self.writes.lock();
        for command in pipeline {
            match command {
                StoreCommand::HashSet { key, fields } => self.set_fields(&key, &fields),
                StoreCommand::Expire { key, ttl } => self.set_ttl(&key, ttl),
                StoreCommand::Delete { key } => {
                    self.remove(&key);
                }
            }
        }
        Ok(())
    }

    async fn flush_all(&self) -> StoreResult<()> {
        let _guard = self.writes.lock();
        self.inner.invalidate_all();
        self.inner.run_pending_tasks();
        Ok(())
    }

    async fn size(&self) -> StoreResult<usize> {
        // iter() skips expired and invalidated entries, entry_count() may lag
        Ok(self.inner.iter().count())
    }

    fn backend_type(&self) -> &str {
        "memory"
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entry_count", &self.inner.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_hash_set_and_get() {
        let store = MemoryStore::new();
        store
            .hash_set("User:1", &fields(&[("name", "one"), ("age", "3")]))
            .await
            .unwrap();

        assert_eq!(store.hash_get_all("User:1").await.unwrap().len(), 2);
        assert_eq!(
            store.hash_get("User:1", "name").await.unwrap().as_deref(),
            Some("one")
        );
        assert_eq!(store.hash_get("User:1", "missing").await.unwrap(), None);
        assert!(store.hash_get_all("User:2").await.unwrap().is_empty());
        assert_eq!(store.size().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_hash_set_merges_fields() {
        let store = MemoryStore::new();
        store.hash_set("User:1", &fields(&[("name", "one"), ("age", "3")])).await.unwrap();
        store.hash_set("User:1", &fields(&[("name", "uno")])).await.unwrap();

        let all = store.hash_get_all("User:1").await.unwrap();
        assert_eq!(all, fields(&[("name", "uno"), ("age", "3")]));
    }

    #[tokio::test]
    async fn test_empty_hash_is_not_stored() {
        let store = MemoryStore::new();
        store.hash_set("User:1", &HashMap::new()).await.unwrap();
        assert_eq!(store.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        store.hash_set("User:1", &fields(&[("name", "one")])).await.unwrap();

        assert!(store.delete("User:1").await.unwrap());
        assert!(!store.delete("User:1").await.unwrap());
        assert_eq!(store.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_expire() {
        let store = MemoryStore::new();
        store.hash_set("User:1", &fields(&[("name", "one")])).await.unwrap();
        store.hash_set("User:2", &fields(&[("name", "two")])).await.unwrap();
        store.expire("User:1", Duration::from_millis(50)).await.unwrap();
        // no-op on an absent key
        store.expire("User:3", Duration::from_millis(50)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(store.hash_get_all("User:1").await.unwrap().is_empty());
        assert_eq!(store.size().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_write_keeps_remaining_ttl() {
        let store = MemoryStore::new();
        store.hash_set("User:1", &fields(&[("name", "one")])).await.unwrap();
        store.expire("User:1", Duration::from_millis(50)).await.unwrap();
        store.hash_set("User:1", &fields(&[("age", "3")])).await.unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(store.hash_get_all("User:1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_execute_pipeline_and_flush() {
        let store = MemoryStore::new();
        let mut pipeline = Pipeline::new();
        pipeline
            .hash_set("User:1", fields(&[("name", "one")]))
            .expire("User:1", Duration::from_secs(60))
            .hash_set("User:2", fields(&[("name", "two")]))
            .delete("User:2");
        store.execute(pipeline).await.unwrap();

        assert_eq!(store.size().await.unwrap(), 1);

        store.flush_all().await.unwrap();
        assert_eq!(store.size().await.unwrap(), 0);
        assert!(store.hash_get_all("User:1").await.unwrap().is_empty());
    }
}
