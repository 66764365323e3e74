//! Record cache: bulk write, delete and read of records stored as hashes.
//!
//! Writes go out in pipelined batches. Nothing is rolled back: when a call
//! fails part-way, batches already sent stay in the store.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use super::key::{derive_key, derive_key_from_id, CacheKey};
use super::record::{flatten_attributes, FetchedRecord, Record, RecordId};
use super::CacheConfig;
use crate::error::Result;
use crate::store::{HashStore, Pipeline};

/// Caches records under `"<class>:<id>"` keys and reads them back.
///
/// Cloning is cheap and shares the same store client.
#[derive(Clone)]
pub struct RecordCache {
    store: Arc<dyn HashStore>,
    config: CacheConfig,
}

impl RecordCache {
    /// Create a record cache over the given store client.
    pub fn new(store: Arc<dyn HashStore>, config: CacheConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn HashStore> {
        &self.store
    }

    /// Write records as hashes, one pipeline per batch.
    ///
    /// `record_class` overrides every record's own type name and is required
    /// for plain mappings. Identifier fields are not written. Each key is
    /// replaced as a whole (fields and TTL from earlier writes are dropped)
    /// and gets the configured TTL unless expiration is disabled.
    ///
    /// Returns the number of keys written.
    ///
    /// # Errors
    /// `MissingRecordClass`/`MissingRecordId` on the first invalid record.
    /// Batches before it have already been sent.
    pub async fn cache_records<R: Record>(
        &self,
        records: &[R],
        record_class: Option<&str>,
    ) -> Result<usize> {
        let mut written = 0;

        for batch in records.chunks(self.config.effective_batch_size()) {
            let mut pipeline = Pipeline::with_capacity(batch.len() * 3);

            for record in batch {
                let key = derive_key(record, record_class)?.into_string();
                let fields = flatten_attributes(record.attributes());

                // DEL first so the write replaces the whole entry
                pipeline.delete(key.clone());
                if fields.is_empty() {
                    debug!("Nothing to cache for {}", key);
                    continue;
                }

                match self.config.ttl {
                    Some(ttl) => pipeline.hash_set(key.clone(), fields).expire(key, ttl),
                    None => pipeline.hash_set(key, fields),
                };
                written += 1;
            }

            let commands = pipeline.len();
            self.store.execute(pipeline).await?;
            debug!(
                "Cached batch of {} records ({} commands) in {}",
                batch.len(),
                commands,
                self.store.backend_type()
            );
        }

        Ok(written)
    }

    /// Delete cached records. Keys that do not exist are ignored.
    ///
    /// # Errors
    /// Same validation as [`cache_records`](Self::cache_records).
    pub async fn delete_records<R: Record>(
        &self,
        records: &[R],
        record_class: Option<&str>,
    ) -> Result<()> {
        for batch in records.chunks(self.config.effective_batch_size()) {
            let mut pipeline = Pipeline::with_capacity(batch.len());
            for record in batch {
                pipeline.delete(derive_key(record, record_class)?.into_string());
            }

            self.store.execute(pipeline).await?;
            debug!("Deleted batch of {} keys", batch.len());
        }

        Ok(())
    }

    /// Fetch full records of one class, in id order.
    ///
    /// Ids with no cached data are skipped, so the result may be shorter
    /// than `record_ids`.
    ///
    /// # Errors
    /// `MissingRecordClass`/`MissingRecordId` before any read is made.
    pub async fn fetch_records<I: RecordId>(
        &self,
        record_class: Option<&str>,
        record_ids: &[I],
    ) -> Result<Vec<FetchedRecord>> {
        let keys = derive_keys(record_class, record_ids)?;

        let mut output = Vec::with_capacity(keys.len());
        for key in &keys {
            let fields = self.store.hash_get_all(key.as_str()).await?;
            if fields.is_empty() {
                continue;
            }
            output.push(FetchedRecord::new(key.id(), fields));
        }

        debug!(
            "Fetched {} of {} records for {:?}",
            output.len(),
            keys.len(),
            record_class
        );
        Ok(output)
    }

    /// Fetch a single record. `None` when nothing is cached for it.
    ///
    /// # Errors
    /// Same validation as [`fetch_records`](Self::fetch_records).
    pub async fn fetch_record<I: RecordId + ?Sized>(
        &self,
        record_class: Option<&str>,
        record_id: &I,
    ) -> Result<Option<FetchedRecord>> {
        let key = derive_key_from_id(record_id, record_class)?;
        let fields = self.store.hash_get_all(key.as_str()).await?;
        Ok((!fields.is_empty()).then(|| FetchedRecord::new(key.id(), fields)))
    }

    /// Fetch one field across records of one class.
    ///
    /// Returns the distinct values present, in first-seen order. Records
    /// without the field (or not cached at all) contribute nothing.
    ///
    /// # Errors
    /// `MissingRecordClass`/`MissingRecordId` before any read is made.
    pub async fn fetch_records_field<I: RecordId>(
        &self,
        record_class: Option<&str>,
        record_ids: &[I],
        field: &str,
    ) -> Result<Vec<String>> {
        let keys = derive_keys(record_class, record_ids)?;

        let mut seen = HashSet::new();
        let mut output = Vec::new();
        for key in &keys {
            if let Some(value) = self.store.hash_get(key.as_str(), field).await?
                && seen.insert(value.clone())
            {
                output.push(value);
            }
        }

        debug!(
            "Fetched {} distinct values of {} from {} records",
            output.len(),
            field,
            keys.len()
        );
        Ok(output)
    }
}

fn derive_keys<I: RecordId>(record_class: Option<&str>, record_ids: &[I]) -> Result<Vec<CacheKey>> {
    record_ids
        .iter()
        .map(|id| derive_key_from_id(id, record_class))
        .collect()
}

impl std::fmt::Debug for RecordCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCache")
            .field("backend", &self.store.backend_type())
            .field("config", &self.config)
            .finish()
    }
}
