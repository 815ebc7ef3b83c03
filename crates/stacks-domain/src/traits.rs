//! Trait definitions for the cache tier seam
//!
//! These traits define the boundary between the cache orchestration logic
//! and the backing stores. Implementations live in `stacks-cache`; the
//! archival worker and the unified service stay tier-agnostic and are tested
//! against in-memory fakes.

use crate::TierError;
use async_trait::async_trait;
use std::time::Duration;

/// Uniform interface over one cache tier
///
/// Three implementations back the system: an in-process fast tier, a durable
/// key-value tier, and an archival object-storage tier. The contract differs
/// by tier:
///
/// - The fast tier is best-effort: it may evict under memory pressure at any
///   time, and callers must tolerate a miss immediately after a put.
/// - The durable and archival tiers are authoritative: an acknowledged write
///   is never silently dropped, and entries leave only via explicit TTL
///   expiry or the archival workflow.
#[async_trait]
pub trait CacheTierStore: Send + Sync {
    /// Get the raw bytes stored under `key`, `None` on a miss
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, TierError>;

    /// Store `value` under `key` with the given time-to-live
    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), TierError>;

    /// Remove `key`; removing an absent key is a no-op, not an error
    async fn delete(&self, key: &str) -> Result<(), TierError>;

    /// List all live keys starting with `prefix`
    async fn list(&self, prefix: &str) -> Result<Vec<String>, TierError>;
}
