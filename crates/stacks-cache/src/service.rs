//! Unified read/write path across the three cache tiers

use crate::{CacheConfig, CacheError, CacheStats, MemoryStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use stacks_archive::{ArchivalWorker, ArchiveConfig};
use stacks_domain::{keyspace, CacheEntry, CacheTierStore, ColdIndexEntry, TierError};
use tokio::sync::Notify;

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

/// Tracks detached background tasks so shutdown can drain them
#[derive(Clone, Default)]
struct TaskGroup {
    active: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl TaskGroup {
    fn spawn(&self, fut: impl std::future::Future<Output = ()> + Send + 'static) {
        self.active.fetch_add(1, Ordering::SeqCst);
        let group = self.clone();
        tokio::spawn(async move {
            fut.await;
            if group.active.fetch_sub(1, Ordering::SeqCst) == 1 {
                group.idle.notify_waiters();
            }
        });
    }

    /// Wait for in-flight tasks to finish, up to `grace`; true if drained
    async fn drain(&self, grace: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + grace;
        while self.active.load(Ordering::SeqCst) > 0 {
            let notified = self.idle.notified();
            if self.active.load(Ordering::SeqCst) == 0 {
                break;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.active.load(Ordering::SeqCst) == 0;
            }
        }
        true
    }
}

/// Read-through cache over the fast, durable, and archival tiers
///
/// The durable tier is the source of truth. The fast tier is a best-effort
/// duplicate populated in the background. The archival tier is reached only
/// through the cold index, and only ever written by the archival workflow.
///
/// A cold-index hit is served as a logical miss immediately: the caller
/// recomputes from the ultimate source while a detached task restores the
/// value for future callers.
pub struct UnifiedCacheService {
    fast: Arc<dyn CacheTierStore>,
    durable: Arc<dyn CacheTierStore>,
    worker: Arc<ArchivalWorker>,
    config: CacheConfig,
    stats: CacheStats,
    tasks: TaskGroup,
}

impl UnifiedCacheService {
    /// Create a service over the given tiers
    pub fn new(
        fast: Arc<dyn CacheTierStore>,
        durable: Arc<dyn CacheTierStore>,
        archival: Arc<dyn CacheTierStore>,
        config: CacheConfig,
    ) -> Self {
        // The worker is only used here for its restore path; align its
        // per-call timeout with ours.
        let archive_config = ArchiveConfig {
            op_timeout_secs: config.op_timeout_secs,
            ..ArchiveConfig::default()
        };
        Self {
            worker: Arc::new(ArchivalWorker::new(durable.clone(), archival, archive_config)),
            fast,
            durable,
            config,
            stats: CacheStats::new(),
            tasks: TaskGroup::default(),
        }
    }

    /// Create a fully in-memory service (tests, local development)
    pub fn in_memory(config: CacheConfig) -> Self {
        let fast = Arc::new(MemoryStore::with_capacity(config.fast_capacity));
        Self::new(
            fast,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            config,
        )
    }

    /// Get the shared hit/miss counters
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    /// Look up a key across the tiers
    ///
    /// `Ok(None)` is a logical miss: the key is absent, expired, or cold.
    /// The caller proceeds to recompute from the source of truth either way;
    /// a cold hit additionally schedules background rehydration.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        // Fast tier is best effort: failures and timeouts degrade to a miss.
        match tokio::time::timeout(self.config.op_timeout(), self.fast.get(key)).await {
            Ok(Ok(Some(value))) => {
                self.stats.record_fast_hit();
                return Ok(Some(value));
            }
            Ok(Ok(None)) => {}
            Ok(Err(e)) => tracing::warn!(%key, error = %e, "Fast tier read failed"),
            Err(_) => tracing::warn!(%key, "Fast tier read timed out"),
        }

        let now = current_timestamp();
        if let Some(bytes) = self.timed(self.durable.get(key)).await? {
            match serde_json::from_slice::<CacheEntry>(&bytes) {
                Ok(entry) if !entry.is_expired(now) => {
                    self.stats.record_durable_hit();
                    let remaining = Duration::from_secs(
                        entry.cached_at.saturating_add(entry.ttl_secs).saturating_sub(now),
                    );
                    self.populate_fast(key, entry.value.clone(), remaining);
                    return Ok(Some(entry.value));
                }
                Ok(_) => {
                    // Expired envelope the tier has not pruned yet
                    let durable = self.durable.clone();
                    let stale = key.to_string();
                    self.tasks.spawn(async move {
                        if let Err(e) = durable.delete(&stale).await {
                            tracing::debug!(key = %stale, error = %e, "Failed to prune expired entry");
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(%key, error = %e, "Corrupt durable envelope, treating as miss");
                }
            }
        }

        let index_key = keyspace::cold_index_key(key);
        match self.timed(self.durable.get(&index_key)).await? {
            None => {
                self.stats.record_miss();
                Ok(None)
            }
            Some(bytes) => {
                self.stats.record_cold_hit();
                match serde_json::from_slice::<ColdIndexEntry>(&bytes) {
                    Ok(cold) => self.spawn_rehydration(cold),
                    Err(e) => {
                        tracing::warn!(%key, error = %e, "Corrupt cold-index entry, skipping rehydration")
                    }
                }
                // Logical miss either way: the caller never waits on
                // rehydration.
                Ok(None)
            }
        }
    }

    /// Write a value: durable tier synchronously, fast tier best-effort
    pub async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        if keyspace::is_reserved(key) {
            return Err(CacheError::ReservedKey(key.to_string()));
        }

        let entry = CacheEntry::new(key, value.clone(), ttl, current_timestamp());
        let envelope = serde_json::to_vec(&entry).map_err(TierError::from)?;
        self.timed(self.durable.put(key, envelope, ttl)).await?;
        self.stats.record_put();

        self.populate_fast(key, value, ttl);
        Ok(())
    }

    /// Write a value with the configured default TTL
    pub async fn put_with_default(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        self.put(key, value, self.config.default_ttl()).await
    }

    /// Remove a key from every tier it may live in
    ///
    /// Clears the durable entry and any cold-index pointer. An orphaned
    /// archival object is left for the lifecycle policy to expire.
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.timed(self.durable.delete(key)).await?;
        self.timed(self.durable.delete(&keyspace::cold_index_key(key))).await?;

        let fast = self.fast.clone();
        let stale = key.to_string();
        self.tasks.spawn(async move {
            if let Err(e) = fast.delete(&stale).await {
                tracing::debug!(key = %stale, error = %e, "Fast tier delete failed");
            }
        });
        Ok(())
    }

    /// Let in-flight background tasks finish, up to `grace`
    ///
    /// Returns true if everything drained; false means tasks were still
    /// running when the grace period elapsed (they are abandoned, which is
    /// safe: rehydration is idempotent and fast-tier population is
    /// best-effort).
    pub async fn shutdown(&self, grace: Duration) -> bool {
        let drained = self.tasks.drain(grace).await;
        if !drained {
            tracing::warn!(?grace, "Background cache tasks still in flight after grace period");
        }
        drained
    }

    fn populate_fast(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        let fast = self.fast.clone();
        let key = key.to_string();
        self.tasks.spawn(async move {
            if let Err(e) = fast.put(&key, value, ttl).await {
                tracing::debug!(%key, error = %e, "Fast tier population failed");
            }
        });
    }

    fn spawn_rehydration(&self, cold: ColdIndexEntry) {
        let worker = self.worker.clone();
        let fast = self.fast.clone();
        let stats = self.stats.clone();
        self.tasks.spawn(async move {
            match worker.restore(&cold).await {
                Ok(Some(value)) => {
                    stats.record_rehydration();
                    if let Err(e) = fast.put(&cold.original_key, value, cold.original_ttl()).await {
                        tracing::debug!(key = %cold.original_key, error = %e, "Fast tier population after restore failed");
                    }
                }
                Ok(None) => {
                    tracing::debug!(key = %cold.original_key, "Rehydration already done by a concurrent caller");
                }
                Err(e) => {
                    tracing::warn!(key = %cold.original_key, error = %e, "Rehydration failed");
                }
            }
        });
    }

    async fn timed<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, TierError>>,
    ) -> Result<T, CacheError> {
        let limit = self.config.op_timeout();
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(CacheError::Timeout(limit)),
        }
    }
}
