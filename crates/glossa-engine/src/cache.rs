//! LRU-backed entity cache.

use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::Mutex;
use tracing::trace;

use glossa_core::{CacheKey, EntityCache, GlossaryTerm};

/// Process-wide cache of materialized terms keyed by entity type and id.
///
/// Lazily populated by reads; writers only invalidate.
#[derive(Clone)]
pub struct LruEntityCache {
    cache: Arc<Mutex<LruCache<CacheKey, GlossaryTerm>>>,
}

impl LruEntityCache {
    /// Create a cache holding at most `capacity` terms (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.lock().await.is_empty()
    }

    pub async fn contains(&self, key: &CacheKey) -> bool {
        self.cache.lock().await.contains(key)
    }
}

impl Default for LruEntityCache {
    fn default() -> Self {
        Self::new(glossa_core::defaults::CACHE_CAPACITY)
    }
}

#[async_trait]
impl EntityCache for LruEntityCache {
    async fn get(&self, key: &CacheKey) -> Option<GlossaryTerm> {
        let mut cache = self.cache.lock().await;
        cache.get(key).cloned()
    }

    async fn put(&self, key: CacheKey, term: GlossaryTerm) {
        let mut cache = self.cache.lock().await;
        cache.put(key, term);
    }

    async fn invalidate(&self, key: &CacheKey) -> bool {
        let removed = self.cache.lock().await.pop(key).is_some();
        if removed {
            trace!(subsystem = "engine", component = "cache", key = %key, "Cache entry invalidated");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn term(name: &str) -> GlossaryTerm {
        GlossaryTerm::new(Uuid::new_v4(), name, format!("G.{}", name))
    }

    #[tokio::test]
    async fn test_put_get_invalidate() {
        let cache = LruEntityCache::new(10);
        let t = term("Fruit");
        let key = CacheKey::term(t.id);

        assert!(cache.get(&key).await.is_none());
        cache.put(key, t.clone()).await;
        assert_eq!(cache.get(&key).await.map(|c| c.id), Some(t.id));

        assert!(cache.invalidate(&key).await);
        // Invalidation is idempotent
        assert!(!cache.invalidate(&key).await);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_evicts_least_recently_used() {
        let cache = LruEntityCache::new(2);
        let (a, b, c) = (term("A"), term("B"), term("C"));
        cache.put(CacheKey::term(a.id), a.clone()).await;
        cache.put(CacheKey::term(b.id), b.clone()).await;
        // Touch A so B becomes least recently used
        cache.get(&CacheKey::term(a.id)).await;
        cache.put(CacheKey::term(c.id), c.clone()).await;

        assert!(cache.contains(&CacheKey::term(a.id)).await);
        assert!(!cache.contains(&CacheKey::term(b.id)).await);
        assert!(cache.contains(&CacheKey::term(c.id)).await);
    }

    #[tokio::test]
    async fn test_zero_capacity_is_clamped() {
        let cache = LruEntityCache::new(0);
        let t = term("Only");
        cache.put(CacheKey::term(t.id), t).await;
        assert_eq!(cache.len().await, 1);
    }
}
