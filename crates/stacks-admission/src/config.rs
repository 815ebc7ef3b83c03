//! Configuration for admission control

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for both rate limiters
///
/// # Examples
///
/// ```
/// use stacks_admission::AdmissionConfig;
///
/// let config = AdmissionConfig::default();
/// assert_eq!(config.bucket_capacity, 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Token bucket capacity (burst size)
    /// Default: 10
    pub bucket_capacity: u32,

    /// Continuous refill rate in tokens per second
    /// Default: 10.0
    pub bucket_refill_per_sec: f64,

    /// Upper bound on the random post-acquisition jitter (in milliseconds)
    /// Default: 100
    pub max_jitter_ms: u64,

    /// Inbound fixed-window length (in seconds)
    /// Default: 60
    pub window_secs: u64,

    /// Maximum requests per identity per window
    /// Default: 60
    pub window_max_requests: u64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            bucket_capacity: 10,
            bucket_refill_per_sec: 10.0,
            max_jitter_ms: 100,
            window_secs: 60,
            window_max_requests: 60,
        }
    }
}

impl AdmissionConfig {
    /// Strict admission (small bursts, tight inbound window)
    ///
    /// Suitable when the upstream provider quota is nearly exhausted.
    pub fn strict() -> Self {
        Self {
            bucket_capacity: 3,
            bucket_refill_per_sec: 2.0,
            max_jitter_ms: 250,
            window_secs: 60,
            window_max_requests: 20,
        }
    }

    /// Permissive admission (large bursts, generous inbound window)
    pub fn permissive() -> Self {
        Self {
            bucket_capacity: 50,
            bucket_refill_per_sec: 25.0,
            max_jitter_ms: 50,
            window_secs: 60,
            window_max_requests: 300,
        }
    }

    /// Get the jitter bound as Duration
    pub fn max_jitter(&self) -> Duration {
        Duration::from_millis(self.max_jitter_ms)
    }

    /// Get the window length as Duration
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}
