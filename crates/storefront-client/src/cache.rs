//! Response cache keyed by resource identity
//!
//! Entries carry their insertion time:
//! - younger than the stale window: served as [`Freshness::Fresh`]
//! - older: served as [`Freshness::Stale`]; the caller revalidates
//! - older than the TTL (or pushed out by capacity): evicted by moka

use crate::config::CacheConfig;
use moka::future::Cache;
use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};
use storefront_core::Resource;

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,
}

/// Whether a cached value is inside its freshness window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Serve without revalidating
    Fresh,
    /// Serve, then revalidate
    Stale,
}

/// Value read from the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cached<T> {
    /// Cached response
    pub value: T,
    /// Freshness at read time
    pub freshness: Freshness,
}

impl<T> Cached<T> {
    /// Check if the value needs revalidation
    #[inline]
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.freshness == Freshness::Stale
    }
}

#[derive(Clone)]
struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    stored_at: Instant,
}

/// Concurrent response cache
///
/// Values are stored type-erased; a read with the wrong type is a miss.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Cache<Resource, Entry>,
    stale_after: Duration,
}

impl ResponseCache {
    /// Create cache
    #[must_use]
    pub fn new(max_capacity: u64, stale_after: Duration, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
            stale_after,
        }
    }

    /// Create cache from configuration
    #[inline]
    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity, config.stale_after(), config.ttl())
    }

    /// Insert response
    pub async fn insert<T>(&self, resource: Resource, value: T)
    where
        T: Send + Sync + 'static,
    {
        let entry = Entry {
            value: Arc::new(value),
            stored_at: Instant::now(),
        };
        self.inner.insert(resource, entry).await;
    }

    /// Get response with its freshness
    pub async fn get<T>(&self, resource: &Resource) -> Option<Cached<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entry = self.inner.get(resource).await?;
        let value = entry.value.downcast_ref::<T>()?.clone();
        let freshness = if entry.stored_at.elapsed() < self.stale_after {
            Freshness::Fresh
        } else {
            Freshness::Stale
        };
        Some(Cached { value, freshness })
    }

    /// Invalidate one resource
    #[inline]
    pub async fn invalidate(&self, resource: &Resource) {
        self.inner.invalidate(resource).await;
    }

    /// Invalidate all entries
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Check if cache holds a response for resource
    #[must_use]
    pub async fn contains(&self, resource: &Resource) -> bool {
        self.inner.get(resource).await.is_some()
    }

    /// Get cache statistics
    ///
    /// Counts are approximate until pending maintenance has run.
    #[inline]
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.inner.entry_count(),
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("entries", &self.inner.entry_count())
            .field("stale_after", &self.stale_after)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::{CategoryId, ProductId};

    #[tokio::test]
    async fn insert_then_get_is_fresh() {
        let cache = ResponseCache::default();
        cache.insert(Resource::Products, vec![1u32, 2, 3]).await;

        let cached = cache.get::<Vec<u32>>(&Resource::Products).await.unwrap();
        assert_eq!(cached.value, vec![1, 2, 3]);
        assert_eq!(cached.freshness, Freshness::Fresh);
    }

    #[tokio::test]
    async fn zero_stale_window_serves_stale() {
        let cache = ResponseCache::new(10, Duration::ZERO, Duration::from_secs(60));
        cache.insert(Resource::Categories, "cats".to_string()).await;

        let cached = cache.get::<String>(&Resource::Categories).await.unwrap();
        assert!(cached.is_stale());
        assert_eq!(cached.value, "cats");
    }

    #[tokio::test]
    async fn returns_none_for_missing() {
        let cache = ResponseCache::default();
        assert!(cache.get::<String>(&Resource::Product(ProductId(1))).await.is_none());
    }

    #[tokio::test]
    async fn wrong_type_is_a_miss() {
        let cache = ResponseCache::default();
        cache.insert(Resource::Products, 5u8).await;

        assert!(cache.get::<String>(&Resource::Products).await.is_none());
    }

    #[tokio::test]
    async fn keys_are_distinct_per_resource() {
        let cache = ResponseCache::default();
        cache.insert(Resource::CategoryProducts(CategoryId(1)), 1u8).await;
        cache.insert(Resource::CategoryProducts(CategoryId(2)), 2u8).await;

        let one = cache.get::<u8>(&Resource::CategoryProducts(CategoryId(1))).await;
        let two = cache.get::<u8>(&Resource::CategoryProducts(CategoryId(2))).await;
        assert_eq!(one.map(|c| c.value), Some(1));
        assert_eq!(two.map(|c| c.value), Some(2));
    }

    #[tokio::test]
    async fn invalidation() {
        let cache = ResponseCache::default();
        cache.insert(Resource::Products, 1u8).await;
        cache.insert(Resource::Categories, 2u8).await;
        assert!(cache.contains(&Resource::Products).await);

        cache.invalidate(&Resource::Products).await;
        assert!(!cache.contains(&Resource::Products).await);
        assert!(cache.contains(&Resource::Categories).await);

        cache.invalidate_all();
        assert!(!cache.contains(&Resource::Categories).await);
    }

    #[tokio::test]
    async fn stats_count_entries() {
        let cache = ResponseCache::default();
        for i in 0..5 {
            cache.insert(Resource::Search(format!("q{i}")), i).await;
        }
        cache.inner.run_pending_tasks().await;

        assert_eq!(cache.stats().entry_count, 5);
    }
}
