// Key-addressed query cache with invalidate-on-mutation

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::CacheConfig;

/// Addresses one cached query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Report(u64),
    Finding(u64),
    KnowledgeBaseTemplates,
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Report(id) => write!(f, "report:{id}"),
            CacheKey::Finding(id) => write!(f, "finding:{id}"),
            CacheKey::KnowledgeBaseTemplates => write!(f, "knowledge-base-templates"),
        }
    }
}

/// The invalidation seam the workflow and coordinator drive. Mutations
/// invalidate; the next read fetches server truth.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn invalidate(&self, key: &CacheKey);
}

/// moka-backed cache for decoded query responses, bounded by capacity and
/// TTL so a missed invalidation cannot serve stale data forever.
#[derive(Debug, Clone)]
pub struct QueryCache {
    entries: MokaCache<String, serde_json::Value>,
}

impl QueryCache {
    pub fn new(config: &CacheConfig) -> Self {
        let entries = MokaCache::builder()
            .max_capacity(config.capacity)
            .time_to_live(Duration::from_secs(config.ttl_seconds))
            .build();
        Self { entries }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let value = self.entries.get(&key.to_string()).await?;
        match serde_json::from_value(value) {
            Ok(decoded) => {
                debug!(%key, "cache hit");
                Some(decoded)
            }
            Err(_) => None,
        }
    }

    pub async fn insert_json<T: Serialize>(&self, key: &CacheKey, value: &T) {
        if let Ok(serialized) = serde_json::to_value(value) {
            self.entries.insert(key.to_string(), serialized).await;
        }
    }
}

#[async_trait]
impl Cache for QueryCache {
    async fn invalidate(&self, key: &CacheKey) {
        self.entries.invalidate(&key.to_string()).await;
        debug!(%key, "cache invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_cache() -> QueryCache {
        QueryCache::new(&CacheConfig {
            capacity: 16,
            ttl_seconds: 60,
        })
    }

    #[test]
    fn cache_keys_render_stable_strings() {
        assert_eq!(CacheKey::Report(7).to_string(), "report:7");
        assert_eq!(CacheKey::Finding(12).to_string(), "finding:12");
        assert_eq!(
            CacheKey::KnowledgeBaseTemplates.to_string(),
            "knowledge-base-templates"
        );
    }

    #[tokio::test]
    async fn invalidate_removes_only_the_addressed_key() {
        let cache = small_cache();
        cache.insert_json(&CacheKey::Report(1), &"one").await;
        cache.insert_json(&CacheKey::Report(2), &"two").await;

        cache.invalidate(&CacheKey::Report(1)).await;

        let one: Option<String> = cache.get_json(&CacheKey::Report(1)).await;
        let two: Option<String> = cache.get_json(&CacheKey::Report(2)).await;
        assert_eq!(one, None);
        assert_eq!(two.as_deref(), Some("two"));
    }
}
