//! In-memory tier implementation
//!
//! Backs the in-process fast tier in production and stands in for the
//! durable and archival tiers in tests. Bounded instances evict their
//! oldest insertion when over capacity, which makes them honest fast-tier
//! citizens: a value may disappear at any time, even right after a put.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use stacks_domain::{CacheTierStore, TierError};

struct Stored {
    value: Vec<u8>,
    expires_at: Option<Instant>,
    seq: u64,
}

impl Stored {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// In-memory [`CacheTierStore`]
///
/// Unbounded instances never evict except via TTL; bounded instances
/// additionally evict oldest-first when over capacity. Expired entries are
/// pruned lazily on read.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Stored>>,
    capacity: Option<usize>,
    next_seq: AtomicU64,
}

impl MemoryStore {
    /// Create an unbounded store (durable/archival stand-in)
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: None,
            next_seq: AtomicU64::new(0),
        }
    }

    /// Create a bounded store that evicts oldest-first over `capacity`
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: Some(capacity),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Number of live (non-expired) entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|s| !s.is_expired(now))
            .count()
    }

    /// Whether the store holds no live entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Stored>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheTierStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, TierError> {
        let now = Instant::now();
        let mut entries = self.lock_write();
        match entries.get(key) {
            Some(stored) if stored.is_expired(now) => {
                entries.remove(key);
                Ok(None)
            }
            Some(stored) => Ok(Some(stored.value.clone())),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), TierError> {
        let now = Instant::now();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.lock_write();
        entries.insert(
            key.to_string(),
            Stored {
                value,
                expires_at: now.checked_add(ttl),
                seq,
            },
        );

        if let Some(capacity) = self.capacity {
            while entries.len() > capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, s)| s.seq)
                    .map(|(k, _)| k.clone());
                match oldest {
                    Some(k) => {
                        entries.remove(&k);
                    }
                    None => break,
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), TierError> {
        self.lock_write().remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, TierError> {
        let now = Instant::now();
        let mut entries = self.lock_write();
        entries.retain(|_, s| !s.is_expired(now));
        Ok(entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryStore::new();
        store.put("k", b"v".to_vec(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));

        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        // Deleting an absent key is a no-op
        store.delete("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_entries_read_as_misses() {
        let store = MemoryStore::new();
        store.put("k", b"v".to_vec(), Duration::ZERO).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_list_by_prefix() {
        let store = MemoryStore::new();
        store.put("books:a", vec![1], Duration::from_secs(60)).await.unwrap();
        store.put("books:b", vec![2], Duration::from_secs(60)).await.unwrap();
        store.put("covers:c", vec![3], Duration::from_secs(60)).await.unwrap();

        let mut keys = store.list("books:").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["books:a", "books:b"]);
        assert_eq!(store.list("").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_bounded_store_evicts_oldest() {
        let store = MemoryStore::with_capacity(2);
        store.put("a", vec![1], Duration::from_secs(60)).await.unwrap();
        store.put("b", vec![2], Duration::from_secs(60)).await.unwrap();
        store.put("c", vec![3], Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("a").await.unwrap(), None);
        assert!(store.get("c").await.unwrap().is_some());
    }
}
