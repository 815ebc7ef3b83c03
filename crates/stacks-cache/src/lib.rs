//! Stacks Cache
//!
//! Three-tier read-through cache for aggregated book metadata: a best-effort
//! in-process fast tier, an authoritative durable key-value tier, and a cold
//! archival tier reached through the cold index.
//!
//! # Overview
//!
//! [`UnifiedCacheService`] orchestrates the read/write path:
//!
//! 1. Query the fast tier; return on hit
//! 2. Query the durable tier; on hit, repopulate the fast tier in the
//!    background and return
//! 3. Query the cold index; on a cold hit, return a logical miss immediately
//!    and restore the value in the background for future callers
//!
//! Writes go to the durable tier synchronously (it is the source of truth)
//! with best-effort fast-tier population. The archival tier is never written
//! here; only the archival workflow in `stacks-archive` moves entries across
//! that boundary.
//!
//! # Usage
//!
//! ```no_run
//! use stacks_cache::{CacheConfig, UnifiedCacheService};
//! use std::time::Duration;
//!
//! # async fn demo() -> Result<(), stacks_cache::CacheError> {
//! let cache = UnifiedCacheService::in_memory(CacheConfig::default());
//! cache.put("books:lookup:isbn=9780141439518", b"{}".to_vec(), Duration::from_secs(3600)).await?;
//! let hit = cache.get("books:lookup:isbn=9780141439518").await?;
//! assert!(hit.is_some());
//! # Ok(())
//! # }
//! ```
//!
//! Background work (fast-tier population, rehydration) runs on detached
//! tasks; call [`UnifiedCacheService::shutdown`] to let in-flight tasks
//! finish within a bounded grace period before process exit.

#![warn(missing_docs)]

mod config;
mod error;
mod memory;
mod service;
mod stats;

pub use config::CacheConfig;
pub use error::CacheError;
pub use memory::MemoryStore;
pub use service::UnifiedCacheService;
pub use stats::{CacheStats, CacheStatsSnapshot};
