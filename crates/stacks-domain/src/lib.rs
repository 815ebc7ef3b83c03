//! Stacks Domain Layer
//!
//! This crate contains the core types and trait interfaces for the Stacks
//! caching and background-job subsystem. It defines the fundamental concepts
//! that all other layers depend upon; infrastructure implementations live in
//! other crates.
//!
//! ## Key Concepts
//!
//! - **CacheEntry**: The durable-tier envelope - value bytes plus TTL metadata
//! - **ColdIndexEntry**: A durable-tier pointer recording that a value was
//!   demoted to the archival tier
//! - **Keyspace**: Reserved prefixes that keep normal entries, cold-index
//!   pointers, and rate-limit counters collision-free by construction
//! - **JobRecord**: The state of one background job, owned by exactly one
//!   coordinator for its lifetime
//! - **CacheTierStore**: The trait seam over the fast, durable, and archival
//!   tiers
//!
//! ## Architecture
//!
//! - Pure types and trait definitions only
//! - No tokio runtime dependency - async trait signatures, no spawning
//! - Tier implementations live in `stacks-cache`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entry;
pub mod error;
pub mod job;
pub mod keyspace;
pub mod traits;

// Re-exports for convenience
pub use entry::{CacheEntry, ColdIndexEntry};
pub use error::TierError;
pub use job::{JobFailure, JobId, JobRecord, JobState, JobSummary, UnitResult, UnitStatus};
pub use traits::CacheTierStore;
