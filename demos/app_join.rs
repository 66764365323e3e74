//! App-side join demo.
//!
//! Caches users and articles, collects the article authors' ids with one
//! field fetch, then loads those users, all without a database join.
//!
//! Uses Redis at `REDIS_URL` when reachable, the in-memory store otherwise.

use std::sync::Arc;

use record_cache::{
    Attributes, Config, Entity, HashStore, MemoryStore, RecordCache, RedisStore,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct Author {
    id: String,
    name: String,
}

fn mapping(value: serde_json::Value) -> Attributes {
    value.as_object().cloned().unwrap_or_default()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("record_cache=debug,app_join=info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;
    info!("Configuration loaded: ttl={:?}, batch_size={}", config.ttl, config.batch_size);

    let store: Arc<dyn HashStore> = match RedisStore::connect(&config.redis_url).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!("Redis unavailable ({}), using in-memory store", e);
            Arc::new(MemoryStore::with_capacity(config.memory_capacity))
        }
    };
    let cache = RecordCache::new(store, config.cache_config());

    let users = vec![
        mapping(json!({"id": 1, "name": "Fred"})),
        mapping(json!({"id": 2, "name": "Mary"})),
        mapping(json!({"id": 3, "name": "Lurker"})),
    ];
    let articles: Vec<Entity> = [(10, 1, "Hashes"), (11, 2, "Pipelines"), (12, 1, "Expiry")]
        .into_iter()
        .map(|(id, user_id, title)| {
            Entity::new("Article", mapping(json!({"id": id, "user_id": user_id, "title": title})))
        })
        .collect();

    cache.cache_records(&users, Some("User")).await?;
    cache.cache_records(&articles, None).await?;

    let article_ids = [10, 11, 12];
    let author_ids = cache
        .fetch_records_field(Some("Article"), &article_ids, "user_id")
        .await?;
    info!("Article authors: {:?}", author_ids);

    for record in cache.fetch_records(Some("User"), &author_ids).await? {
        let author: Author = record.deserialize_into()?;
        info!("Author {} is {}", author.id, author.name);
    }

    // The join is done; drop the temporary keys
    cache.delete_records(&users, Some("User")).await?;
    cache.delete_records(&articles, None).await?;

    Ok(())
}
