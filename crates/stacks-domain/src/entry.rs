//! Entry module - envelopes stored in the cache tiers
//!
//! A key has *either* a live [`CacheEntry`] in the durable tier *or* a
//! [`ColdIndexEntry`], never both. The only permitted overlap is the
//! rehydration-in-flight window, which is kept safe by idempotent per-key
//! operations rather than locking.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A cached value plus the metadata needed for expiry and archival decisions
///
/// This is the envelope written to the durable tier. The fast tier stores the
/// raw value bytes only; the durable tier is the source of truth and carries
/// the full envelope.
///
/// # Examples
///
/// ```
/// use stacks_domain::CacheEntry;
/// use std::time::Duration;
///
/// let entry = CacheEntry::new("books:lookup:isbn=123", b"{}".to_vec(), Duration::from_secs(60), 1_000);
/// assert!(!entry.is_expired(1_030));
/// assert!(entry.is_expired(1_061));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The full namespaced key this entry was stored under
    pub key: String,

    /// Raw value bytes
    pub value: Vec<u8>,

    /// When the entry was written (seconds since Unix epoch)
    pub cached_at: u64,

    /// Time-to-live in seconds, counted from `cached_at`
    pub ttl_secs: u64,
}

impl CacheEntry {
    /// Create a new entry cached at the given timestamp
    pub fn new(key: impl Into<String>, value: Vec<u8>, ttl: Duration, cached_at: u64) -> Self {
        Self {
            key: key.into(),
            value,
            cached_at,
            ttl_secs: ttl.as_secs(),
        }
    }

    /// Whether the entry's TTL has elapsed at `now` (seconds since Unix epoch)
    pub fn is_expired(&self, now: u64) -> bool {
        now > self.cached_at.saturating_add(self.ttl_secs)
    }

    /// Age of the entry at `now`, zero if `now` predates `cached_at`
    pub fn age(&self, now: u64) -> Duration {
        Duration::from_secs(now.saturating_sub(self.cached_at))
    }

    /// Original TTL as a [`Duration`]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Pointer left in the durable tier when a value is demoted to cold storage
///
/// Its presence under `cold-index:{originalKey}` is the authoritative signal
/// that the value lives in the archival tier. It is deleted as soon as
/// rehydration completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColdIndexEntry {
    /// The key the value was originally cached under
    pub original_key: String,

    /// Location of the value in the archival tier
    pub archive_path: String,

    /// When the value was demoted (seconds since Unix epoch)
    pub archived_at: u64,

    /// The entry's TTL at the time of archival, restored verbatim on
    /// rehydration to avoid thrashing
    pub original_ttl_secs: u64,

    /// Access count observed by the selector when it chose this entry
    pub access_count_at_archival: u64,
}

impl ColdIndexEntry {
    /// Original TTL as a [`Duration`]
    pub fn original_ttl(&self) -> Duration {
        Duration::from_secs(self.original_ttl_secs)
    }
}
