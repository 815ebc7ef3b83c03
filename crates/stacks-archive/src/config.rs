//! Configuration for the archival workflow
//!
//! Defines the hybrid selection thresholds, sweep interval, and per-call
//! timeouts.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the archival sweep and worker
///
/// # Examples
///
/// ```
/// use stacks_archive::ArchiveConfig;
///
/// // Default configuration (daily sweep, 30-day age threshold)
/// let config = ArchiveConfig::default();
/// assert_eq!(config.age_threshold_days, 30);
///
/// // Aggressive archival for storage-constrained deployments
/// let config = ArchiveConfig::aggressive();
/// assert_eq!(config.age_threshold_days, 7);
///
/// // Lenient archival
/// let config = ArchiveConfig::lenient();
/// assert_eq!(config.age_threshold_days, 90);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Minimum age before an entry becomes an archival candidate (in days)
    /// Default: 30
    pub age_threshold_days: u64,

    /// Entries accessed at least this many times in the lookback window are
    /// never archived, regardless of age
    /// Default: 3
    pub access_threshold: u64,

    /// How often the scheduled sweep runs (in minutes)
    /// Default: 1440 (daily)
    pub sweep_interval_minutes: u64,

    /// Timeout applied to each individual tier call during a sweep, so one
    /// slow candidate cannot stall the batch (in seconds)
    /// Default: 10
    pub op_timeout_secs: u64,

    /// TTL written on archival-tier objects and cold-index pointers (in
    /// days); actual expiry of archived objects is lifecycle-policy driven
    /// Default: 365
    pub archive_retention_days: u64,

    /// Dry-run mode: log what would be archived without mutating any tier
    /// Default: false
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            age_threshold_days: 30,
            access_threshold: 3,
            sweep_interval_minutes: 1440,
            op_timeout_secs: 10,
            archive_retention_days: 365,
            dry_run: false,
        }
    }
}

impl ArchiveConfig {
    /// Aggressive archival (shorter age threshold, twice-daily sweeps)
    ///
    /// Suitable when durable-tier storage is at a premium.
    pub fn aggressive() -> Self {
        Self {
            age_threshold_days: 7,
            access_threshold: 5,
            sweep_interval_minutes: 720,
            op_timeout_secs: 10,
            archive_retention_days: 365,
            dry_run: false,
        }
    }

    /// Lenient archival (longer age threshold, every-other-day sweeps)
    pub fn lenient() -> Self {
        Self {
            age_threshold_days: 90,
            access_threshold: 1,
            sweep_interval_minutes: 2880,
            op_timeout_secs: 10,
            archive_retention_days: 365,
            dry_run: false,
        }
    }

    /// Get age threshold as Duration
    pub fn age_threshold(&self) -> Duration {
        Duration::from_secs(self.age_threshold_days * 86_400)
    }

    /// Get sweep interval as Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_minutes * 60)
    }

    /// Get per-call timeout as Duration
    pub fn op_timeout(&self) -> Duration {
        Duration::from_secs(self.op_timeout_secs)
    }

    /// Get archive retention as Duration
    pub fn archive_retention(&self) -> Duration {
        Duration::from_secs(self.archive_retention_days * 86_400)
    }
}
