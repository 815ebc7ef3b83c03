//! Error types for admission control

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during admission
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdmissionError {
    /// The caller exceeded the inbound window limit; expected and
    /// user-facing, carries everything needed for a retry-after response
    #[error("Rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until the current window resets
        retry_after_secs: u64,
        /// The window's request limit
        limit: u64,
        /// Requests remaining in the window (zero on rejection)
        remaining: u64,
    },

    /// No token became available within the caller-supplied timeout
    #[error("Timed out waiting for a token after {0:?}")]
    AcquireTimeout(Duration),
}
