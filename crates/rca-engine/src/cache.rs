//! Coarse read-through cache using moka
//!
//! Every read of the engine shares one logical keyspace, `rootcauses`.
//! Writes never evict single keys: a successful write clears the whole
//! keyspace, so no derived view (list, tree, by-ids batch) can outlive the
//! data it was computed from.
//!
//! A generation counter is bumped on every eviction. A read that misses
//! records the generation before loading from the store and discards its
//! result if an eviction happened meanwhile, so a load that raced a write
//! never repopulates the cache with pre-write data.

use crate::config::EngineConfig;
use moka::future::Cache;
use rca_core::{ProjectId, RootCauseId};
use std::any::Any;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Name of the shared keyspace
pub const KEYSPACE: &str = "rootcauses";

/// Argument-based key within the keyspace
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// `get_all`
    All,
    /// `get_all_by_project`
    AllByProject(ProjectId),
    /// `get`
    ById(RootCauseId),
    /// `get_by_ids`, in request order
    ByIds(Vec<RootCauseId>),
    /// `get_tree`
    Tree {
        /// Requested project
        project_id: ProjectId,
        /// Whether disabled subtrees were pruned
        filter_disabled: bool,
    },
}

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,
    /// Number of full evictions so far
    pub generation: u64,
}

/// Shared cache for all engine reads
#[derive(Debug, Clone)]
pub struct RootCauseCache {
    inner: Cache<CacheKey, Arc<dyn Any + Send + Sync>>,
    generation: Arc<AtomicU64>,
}

impl RootCauseCache {
    /// Create new cache with max capacity
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create cache with time-based expiration
    #[inline]
    #[must_use]
    pub fn with_ttl(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create cache from engine configuration
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        match config.cache_ttl() {
            Some(ttl) => Self::with_ttl(config.cache_capacity, ttl),
            None => Self::new(config.cache_capacity),
        }
    }

    /// Get cached value
    ///
    /// Returns `None` on a miss or when the entry holds a different type.
    pub async fn get<T>(&self, key: &CacheKey) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.inner
            .get(key)
            .await
            .and_then(|arc| arc.downcast_ref::<T>().cloned())
    }

    /// Get cached value or load it
    ///
    /// The loaded value is cached only if no eviction ran while it was
    /// being loaded. Errors are returned as-is and never cached.
    pub async fn try_get_or_load<T, E, F, Fut>(&self, key: CacheKey, load: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get::<T>(&key).await {
            tracing::debug!(keyspace = KEYSPACE, ?key, "cache hit");
            return Ok(cached);
        }

        tracing::debug!(keyspace = KEYSPACE, ?key, "cache miss");
        let generation = self.generation();
        let value = load().await?;

        if self.generation() == generation {
            self.inner.insert(key.clone(), Arc::new(value.clone())).await;
            // An eviction that landed between the check and the insert
            // must still win.
            if self.generation() != generation {
                self.inner.invalidate(&key).await;
            }
        } else {
            tracing::debug!(keyspace = KEYSPACE, ?key, "eviction during load, not caching");
        }

        Ok(value)
    }

    /// Evict the whole keyspace
    pub fn evict_all(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.invalidate_all();
        tracing::debug!(keyspace = KEYSPACE, generation, "keyspace evicted");
    }

    /// Current generation
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Check if key is cached
    #[inline]
    pub async fn contains(&self, key: &CacheKey) -> bool {
        self.inner.get(key).await.is_some()
    }

    /// Flush moka's pending maintenance so counts are exact
    pub async fn sync(&self) {
        self.inner.run_pending_tasks().await;
    }

    /// Get cache statistics
    #[inline]
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.inner.entry_count(),
            generation: self.generation(),
        }
    }
}

impl Default for RootCauseCache {
    /// Create cache with default capacity (10,000 entries)
    fn default() -> Self {
        Self::new(10_000)
    }
}
