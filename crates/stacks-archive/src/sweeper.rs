//! Scheduled sweep loop driving selection and demotion

use crate::selector::AccessStatsSource;
use crate::worker::current_timestamp;
use crate::{ArchivalSelector, ArchivalWorker, ArchiveConfig, ArchiveError, ArchiveMetrics};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;
use stacks_domain::{keyspace, CacheEntry, CacheTierStore};
use tokio::time::interval;

/// Runs the archival sweep on a schedule
///
/// A sweep reads a snapshot of the durable tier, computes candidates, and
/// performs all mutations through the same tier interface used by live
/// traffic. It holds no lock shared with the read/write path; idempotent
/// per-key operations are what keep concurrent live traffic safe.
pub struct ArchiveSweeper {
    durable: Arc<dyn CacheTierStore>,
    selector: ArchivalSelector,
    worker: ArchivalWorker,
    stats_source: Option<Arc<dyn AccessStatsSource>>,
    config: ArchiveConfig,
    metrics: ArchiveMetrics,
}

impl ArchiveSweeper {
    /// Create a sweeper over the durable and archival tiers
    pub fn new(
        durable: Arc<dyn CacheTierStore>,
        archival: Arc<dyn CacheTierStore>,
        config: ArchiveConfig,
    ) -> Self {
        Self {
            selector: ArchivalSelector::new(config.clone()),
            worker: ArchivalWorker::new(durable.clone(), archival, config.clone()),
            durable,
            stats_source: None,
            config,
            metrics: ArchiveMetrics::new(),
        }
    }

    /// Attach an access-frequency signal used by the scheduled loop
    ///
    /// Without a source (or when the source reports the aggregation as not
    /// yet available) every entry counts as never-accessed.
    pub fn with_stats_source(mut self, source: Arc<dyn AccessStatsSource>) -> Self {
        self.stats_source = Some(source);
        self
    }

    /// Get a reference to the current metrics
    pub fn metrics(&self) -> &ArchiveMetrics {
        &self.metrics
    }

    /// Reset metrics counters
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    /// Perform a single sweep with the given access-frequency snapshot
    ///
    /// Fails only if the durable tier cannot be scanned at all; per-entry
    /// read errors and per-candidate archive failures are logged and skipped.
    /// Returns the updated metrics after the sweep.
    pub async fn sweep(
        &mut self,
        access_stats: Option<&HashMap<String, u64>>,
    ) -> Result<ArchiveMetrics, ArchiveError> {
        let start = SystemTime::now();
        let now = current_timestamp();

        let keys = self.timed(self.durable.list("")).await?;
        let mut entries = Vec::new();

        for key in keys {
            if keyspace::is_reserved(&key) {
                continue;
            }
            let bytes = match self.timed(self.durable.get(&key)).await {
                Ok(Some(bytes)) => bytes,
                Ok(None) => continue, // expired or deleted since the listing
                Err(e) => {
                    tracing::warn!(%key, error = %e, "Skipping unreadable entry during sweep");
                    continue;
                }
            };
            let entry: CacheEntry = match serde_json::from_slice(&bytes) {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(%key, error = %e, "Skipping undecodable entry during sweep");
                    continue;
                }
            };
            if !entry.is_expired(now) {
                entries.push(entry);
            }
        }

        let scanned = entries.len();
        let selected = self.selector.select(&entries, access_stats, now);

        if self.config.dry_run {
            for entry in &selected {
                tracing::info!(key = %entry.key, age_secs = entry.age(now).as_secs(), "DRY RUN: would archive");
            }
            self.metrics.record_sweep(scanned, selected.len(), 0, 0);
            return Ok(self.metrics.clone());
        }

        let candidates: Vec<(CacheEntry, u64)> = selected
            .into_iter()
            .map(|entry| {
                let count = self.selector.access_count(&entry.key, access_stats);
                (entry, count)
            })
            .collect();

        let archived = self.worker.archive(&candidates).await;
        let failed = candidates.len() - archived;
        self.metrics.record_sweep(scanned, candidates.len(), archived, failed);

        if let Ok(elapsed) = start.elapsed() {
            self.metrics.total_runtime_secs += elapsed.as_secs();
        }

        tracing::info!(scanned, selected = candidates.len(), archived, failed, "Sweep completed");
        Ok(self.metrics.clone())
    }

    /// Run the sweeper indefinitely
    ///
    /// Sweeps at the configured interval until a shutdown signal (Ctrl+C)
    /// is received. Each cycle pulls a fresh access-stats snapshot from the
    /// attached source, if any.
    pub async fn run(&mut self) -> Result<(), ArchiveError> {
        let mut ticker = interval(self.config.sweep_interval());

        tracing::info!(interval = ?self.config.sweep_interval(), "Archive sweeper started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_once().await;
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received, stopping sweeper");
                    break;
                }
            }
        }

        tracing::info!("Sweeper stopped. Final metrics:\n{}", self.metrics.summary());
        Ok(())
    }

    /// Run for a specific number of cycles (useful for testing)
    pub async fn run_cycles(&mut self, cycles: usize) -> Result<(), ArchiveError> {
        let mut ticker = interval(self.config.sweep_interval());

        for cycle in 0..cycles {
            ticker.tick().await;
            tracing::debug!("Starting sweep cycle {}/{}", cycle + 1, cycles);
            self.run_once().await;
        }

        tracing::info!("Sweeper finished {} cycles. Final metrics:\n{}", cycles, self.metrics.summary());
        Ok(())
    }

    async fn run_once(&mut self) {
        let snapshot = match &self.stats_source {
            Some(source) => source.snapshot().await,
            None => None,
        };

        match self.sweep(snapshot.as_ref()).await {
            Ok(metrics) => {
                tracing::debug!(sweeps = metrics.sweep_count, archived = metrics.archived, "Sweep cycle done");
            }
            Err(e) => {
                tracing::error!(error = %e, "Sweep failed");
            }
        }
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
