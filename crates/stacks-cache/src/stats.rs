//! Hit/miss counters for the unified cache path

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Counters {
    fast_hits: AtomicU64,
    durable_hits: AtomicU64,
    cold_hits: AtomicU64,
    misses: AtomicU64,
    puts: AtomicU64,
    rehydrations: AtomicU64,
}

/// Shared counters recorded by [`crate::UnifiedCacheService`]
///
/// Cheap to clone; all clones observe the same counters.
#[derive(Clone, Default)]
pub struct CacheStats {
    inner: Arc<Counters>,
}

impl CacheStats {
    /// Create fresh zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_fast_hit(&self) {
        self.inner.fast_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_durable_hit(&self) {
        self.inner.durable_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cold_hit(&self) {
        self.inner.cold_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.inner.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_put(&self) {
        self.inner.puts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rehydration(&self) {
        self.inner.rehydrations.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            fast_hits: self.inner.fast_hits.load(Ordering::Relaxed),
            durable_hits: self.inner.durable_hits.load(Ordering::Relaxed),
            cold_hits: self.inner.cold_hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            puts: self.inner.puts.load(Ordering::Relaxed),
            rehydrations: self.inner.rehydrations.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStatsSnapshot {
    /// Hits served from the fast tier
    pub fast_hits: u64,

    /// Hits served from the durable tier
    pub durable_hits: u64,

    /// Cold-index hits (served as logical misses, rehydration scheduled)
    pub cold_hits: u64,

    /// Full misses
    pub misses: u64,

    /// Successful durable-tier writes
    pub puts: u64,

    /// Completed background rehydrations
    pub rehydrations: u64,
}
