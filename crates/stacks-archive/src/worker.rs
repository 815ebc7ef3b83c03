//! Moves entries across the durable/archival boundary
//!
//! The worker owns both transitions: demotion during a sweep and restoration
//! on renewed access. No other code path writes the archival tier or deletes
//! a cold-index pointer, which is what keeps the cold-index invariant safe
//! without cross-process locking.

use crate::{ArchiveConfig, ArchiveError};
use chrono::Datelike;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use stacks_domain::{keyspace, CacheEntry, CacheTierStore, ColdIndexEntry};

/// Current timestamp in seconds since Unix epoch
pub(crate) fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

/// Deterministic archival-tier path for a key archived at `archived_at`
///
/// Layout: `cold-cache/{year}/{month}/{sanitized-key}.json`, sharded by
/// archival date so a lifecycle policy can expire whole month prefixes
/// independently of application logic.
///
/// # Examples
///
/// ```
/// use stacks_archive::archive_path;
///
/// // 2026-08-15 00:00:00 UTC
/// let path = archive_path("books:lookup:isbn=1", 1_786_752_000);
/// assert_eq!(path, "cold-cache/2026/08/books-lookup-isbn-1.json");
/// ```
pub fn archive_path(key: &str, archived_at: u64) -> String {
    let (year, month) = chrono::DateTime::from_timestamp(archived_at as i64, 0)
        .map(|dt| (dt.year(), dt.month()))
        .unwrap_or((1970, 1));
    format!("cold-cache/{:04}/{:02}/{}.json", year, month, keyspace::sanitize(key))
}

/// Moves selected candidates into cold storage and back
pub struct ArchivalWorker {
    durable: Arc<dyn CacheTierStore>,
    archival: Arc<dyn CacheTierStore>,
    config: ArchiveConfig,
}

impl ArchivalWorker {
    /// Create a worker over the durable and archival tiers
    pub fn new(
        durable: Arc<dyn CacheTierStore>,
        archival: Arc<dyn CacheTierStore>,
        config: ArchiveConfig,
    ) -> Self {
        Self {
            durable,
            archival,
            config,
        }
    }

    /// Archive each candidate independently, returning the count that
    /// actually succeeded
    ///
    /// Per candidate the order is fixed: archival-tier write, then cold-index
    /// write, then durable-tier delete. The delete happens strictly after the
    /// cold index is in place, so a mid-batch crash leaves a key with both a
    /// live entry and a pointer (resolved idempotently by the next sweep)
    /// rather than with neither. A failure on one candidate is logged and
    /// never aborts the batch.
    pub async fn archive(&self, candidates: &[(CacheEntry, u64)]) -> usize {
        let mut archived = 0;

        for (entry, access_count) in candidates {
            match self.archive_one(entry, *access_count).await {
                Ok(path) => {
                    tracing::debug!(key = %entry.key, %path, "Archived entry to cold storage");
                    archived += 1;
                }
                Err(e) => {
                    tracing::warn!(key = %entry.key, error = %e, "Archival candidate failed, continuing sweep");
                }
            }
        }

        archived
    }

    /// Restore a value from cold storage into the durable tier
    ///
    /// Safe to invoke concurrently for the same key: every step is
    /// idempotent, and an invocation that finds the cold-index pointer
    /// already gone reports `Ok(None)` rather than an error. The restored
    /// entry gets its original TTL back, not a shortened one, so a restored
    /// key does not immediately become an archival candidate again.
    ///
    /// Returns the restored value bytes, or `None` when another caller
    /// finished the restoration first.
    pub async fn restore(&self, cold: &ColdIndexEntry) -> Result<Option<Vec<u8>>, ArchiveError> {
        let index_key = keyspace::cold_index_key(&cold.original_key);

        // Re-check the pointer: a concurrent restore may have already won.
        if self.timed(self.durable.get(&index_key)).await?.is_none() {
            tracing::debug!(key = %cold.original_key, "Cold index already gone, restore is a no-op");
            return Ok(None);
        }

        let bytes = self
            .timed(self.archival.get(&cold.archive_path))
            .await?
            .ok_or_else(|| ArchiveError::ArchiveObjectMissing {
                key: cold.original_key.clone(),
                path: cold.archive_path.clone(),
            })?;
        let archived: CacheEntry = serde_json::from_slice(&bytes)
            .map_err(stacks_domain::TierError::from)?;

        let refreshed = CacheEntry::new(
            cold.original_key.clone(),
            archived.value,
            cold.original_ttl(),
            current_timestamp(),
        );
        let envelope = serde_json::to_vec(&refreshed).map_err(stacks_domain::TierError::from)?;
        self.timed(self.durable.put(&cold.original_key, envelope, cold.original_ttl()))
            .await?;

        // Pointer removal last: until it is gone, re-running the restore is
        // a harmless overwrite of the same durable entry.
        self.timed(self.durable.delete(&index_key)).await?;

        tracing::info!(key = %cold.original_key, path = %cold.archive_path, "Restored entry from cold storage");
        Ok(Some(refreshed.value))
    }

    async fn archive_one(&self, entry: &CacheEntry, access_count: u64) -> Result<String, ArchiveError> {
        let archived_at = current_timestamp();
        let path = archive_path(&entry.key, archived_at);
        let retention = self.config.archive_retention();

        let object = serde_json::to_vec(entry).map_err(stacks_domain::TierError::from)?;
        self.timed(self.archival.put(&path, object, retention)).await?;

        let cold = ColdIndexEntry {
            original_key: entry.key.clone(),
            archive_path: path.clone(),
            archived_at,
            original_ttl_secs: entry.ttl_secs,
            access_count_at_archival: access_count,
        };
        let pointer = serde_json::to_vec(&cold).map_err(stacks_domain::TierError::from)?;
        self.timed(self.durable.put(&keyspace::cold_index_key(&entry.key), pointer, retention))
            .await?;

        self.timed(self.durable.delete(&entry.key)).await?;

        Ok(path)
    }

    async fn timed<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, stacks_domain::TierError>>,
    ) -> Result<T, ArchiveError> {
        let limit = self.config.op_timeout();
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ArchiveError::Timeout(limit)),
        }
    }
}
