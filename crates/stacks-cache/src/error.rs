//! Error types for cache operations

use std::time::Duration;
use stacks_domain::TierError;
use thiserror::Error;

/// Errors that can occur on the unified cache path
#[derive(Debug, Error)]
pub enum CacheError {
    /// An authoritative tier call failed
    #[error(transparent)]
    Tier(#[from] TierError),

    /// An authoritative tier call exceeded the configured timeout
    #[error("Tier call timed out after {0:?}")]
    Timeout(Duration),

    /// The key collides with a reserved namespace
    #[error("Key uses a reserved namespace: {0}")]
    ReservedKey(String),
}
