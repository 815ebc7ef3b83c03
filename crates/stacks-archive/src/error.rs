//! Error types for archival operations

use std::time::Duration;
use stacks_domain::TierError;
use thiserror::Error;

/// Errors that can occur during archival operations
///
/// Per-candidate failures during a sweep are logged and skipped, never
/// surfaced through this type; a sweep only fails as a whole when the
/// durable tier itself cannot be scanned.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// A backing tier call failed
    #[error(transparent)]
    Tier(#[from] TierError),

    /// A backing tier call exceeded the configured timeout
    #[error("Tier call timed out after {0:?}")]
    Timeout(Duration),

    /// The archival object referenced by a cold-index entry is missing
    #[error("Archived value missing at {path} for key {key}")]
    ArchiveObjectMissing {
        /// The original entry key
        key: String,
        /// The archival-tier path the cold index pointed at
        path: String,
    },
}
