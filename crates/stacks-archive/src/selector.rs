//! Candidate selection for cold-storage demotion

use crate::ArchiveConfig;
use async_trait::async_trait;
use stacks_domain::{keyspace, CacheEntry};
use std::collections::HashMap;

/// Source of the access-frequency signal consumed by the selector
///
/// The signal comes from upstream analytics aggregation and may not exist
/// yet when a sweep runs. Implementations return `None` when the snapshot
/// is unavailable; the selector degrades gracefully by treating every entry
/// as never-accessed rather than blocking or failing the sweep.
#[async_trait]
pub trait AccessStatsSource: Send + Sync {
    /// Access counts per key over the lookback window, `None` if the
    /// aggregation is not available
    async fn snapshot(&self) -> Option<HashMap<String, u64>>;
}

/// Picks durable-tier entries for demotion to cold storage
///
/// The rule is hybrid and both halves must hold: the entry is older than the
/// age threshold AND was accessed fewer times than the access threshold over
/// the lookback window. Entries under reserved namespaces are always
/// excluded.
#[derive(Debug, Clone)]
pub struct ArchivalSelector {
    config: ArchiveConfig,
}

impl ArchivalSelector {
    /// Create a selector with the given thresholds
    pub fn new(config: ArchiveConfig) -> Self {
        Self { config }
    }

    /// Select archival candidates from a durable-tier scan
    ///
    /// `access_stats` is the optional frequency signal; a missing map, or a
    /// key absent from it, counts as zero accesses.
    pub fn select(
        &self,
        entries: &[CacheEntry],
        access_stats: Option<&HashMap<String, u64>>,
        now: u64,
    ) -> Vec<CacheEntry> {
        if access_stats.is_none() {
            tracing::debug!("Access stats unavailable, treating all entries as never-accessed");
        }

        entries
            .iter()
            .filter(|entry| self.is_candidate(entry, access_stats, now))
            .cloned()
            .collect()
    }

    /// Access count observed for an entry, zero when the signal is missing
    pub fn access_count(
        &self,
        key: &str,
        access_stats: Option<&HashMap<String, u64>>,
    ) -> u64 {
        access_stats
            .and_then(|stats| stats.get(key).copied())
            .unwrap_or(0)
    }

    fn is_candidate(
        &self,
        entry: &CacheEntry,
        access_stats: Option<&HashMap<String, u64>>,
        now: u64,
    ) -> bool {
        if keyspace::is_reserved(&entry.key) {
            return false;
        }

        let old_enough = entry.age(now) > self.config.age_threshold();
        let cold_enough = self.access_count(&entry.key, access_stats) < self.config.access_threshold;

        old_enough && cold_enough
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const DAY: u64 = 86_400;

    fn entry_aged(key: &str, age_days: u64, now: u64) -> CacheEntry {
        CacheEntry::new(key, vec![1], Duration::from_secs(365 * DAY), now - age_days * DAY)
    }

    fn selector() -> ArchivalSelector {
        // Defaults: 30-day age threshold, access threshold 3
        ArchivalSelector::new(ArchiveConfig::default())
    }

    #[test]
    fn test_selects_old_cold_entries() {
        let now = 1_000 * DAY;
        let entries = vec![entry_aged("books:lookup:isbn=1", 45, now)];
        let selected = selector().select(&entries, None, now);
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn test_never_selects_young_entries_even_if_never_accessed() {
        let now = 1_000 * DAY;
        let entries = vec![entry_aged("books:lookup:isbn=1", 10, now)];
        assert!(selector().select(&entries, None, now).is_empty());
    }

    #[test]
    fn test_never_selects_hot_entries_even_if_old() {
        let now = 1_000 * DAY;
        let entries = vec![entry_aged("books:lookup:isbn=1", 400, now)];
        let stats = HashMap::from([("books:lookup:isbn=1".to_string(), 3u64)]);
        assert!(selector().select(&entries, Some(&stats), now).is_empty());
    }

    #[test]
    fn test_below_threshold_access_still_selected() {
        let now = 1_000 * DAY;
        let entries = vec![entry_aged("books:lookup:isbn=1", 45, now)];
        let stats = HashMap::from([("books:lookup:isbn=1".to_string(), 2u64)]);
        assert_eq!(selector().select(&entries, Some(&stats), now).len(), 1);
    }

    #[test]
    fn test_missing_stats_degrade_to_zero() {
        let now = 1_000 * DAY;
        let entries = vec![entry_aged("books:lookup:isbn=1", 45, now)];
        // Stats exist but have no entry for this key
        let stats = HashMap::from([("other:key:x".to_string(), 99u64)]);
        assert_eq!(selector().select(&entries, Some(&stats), now).len(), 1);
    }

    #[test]
    fn test_reserved_namespaces_always_excluded() {
        let now = 1_000 * DAY;
        let entries = vec![
            entry_aged("cold-index:books:lookup:isbn=1", 400, now),
            entry_aged("ratelimit:203.0.113.9", 400, now),
            entry_aged("config:archive", 400, now),
        ];
        assert!(selector().select(&entries, None, now).is_empty());
    }
}
