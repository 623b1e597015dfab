use redis::{Client, Commands};
use std::fmt::Display;

use crate::db::cache::{encode, CacheLookup, SimilarityStore};
use crate::error::EngineResult;
use crate::models::CachedSimilarity;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Similarity matrix for a corpus, by corpus hash
    Similarity(String),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Similarity(hash) => write!(f, "similarity:{}", hash),
        }
    }
}

/// Creates a Redis client for caching
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Keeps similarity matrices in Redis, one key per corpus hash
///
/// A single `SET` replaces the value atomically. Because keys are per corpus, a lookup
/// is either a hit or a miss; stale entries simply stop being read.
#[derive(Clone)]
pub struct RedisSimilarityStore {
    redis_client: Client,
}

impl RedisSimilarityStore {
    pub fn new(redis_client: Client) -> Self {
        Self { redis_client }
    }

    fn fetch(&self, key: &CacheKey) -> EngineResult<Option<Vec<u8>>> {
        let mut conn = self.redis_client.get_connection()?;
        let cached: Option<Vec<u8>> = conn.get(key.to_string())?;
        Ok(cached)
    }
}

impl SimilarityStore for RedisSimilarityStore {
    fn load(&self, corpus_hash: &str) -> CacheLookup {
        let key = CacheKey::Similarity(corpus_hash.to_string());
        match self.fetch(&key) {
            Ok(Some(bytes)) => CacheLookup::decode(&bytes, corpus_hash),
            Ok(None) => CacheLookup::Miss,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Redis unreachable for similarity lookup");
                CacheLookup::Unavailable(e.to_string())
            }
        }
    }

    fn store(&self, entry: &CachedSimilarity) -> EngineResult<()> {
        let key = CacheKey::Similarity(entry.corpus_hash.clone());
        let bytes = encode(entry)?;
        let mut conn = self.redis_client.get_connection()?;
        let _: () = conn.set(key.to_string(), bytes)?;
        tracing::debug!(key = %key, "Similarity cache written to Redis");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
