//! Error types shared by all tier implementations

use thiserror::Error;

/// Errors surfaced by [`crate::CacheTierStore`] implementations
///
/// Tier errors never corrupt state: a failed call leaves the tier exactly as
/// it was, and the caller may retry at its discretion.
#[derive(Debug, Error)]
pub enum TierError {
    /// The backing store could not be reached or rejected the call
    #[error("Tier unavailable: {0}")]
    Unavailable(String),

    /// An envelope could not be encoded or decoded
    #[error("Envelope serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for TierError {
    fn from(err: serde_json::Error) -> Self {
        TierError::Serialization(err.to_string())
    }
}
