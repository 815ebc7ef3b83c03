//! Configuration for job coordination

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for job coordinators and the registry
///
/// # Examples
///
/// ```
/// use stacks_jobs::JobsConfig;
///
/// let config = JobsConfig::default();
/// assert_eq!(config.retention_secs, 300);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// How long a terminal record is retained for late subscribers before
    /// the coordinator exits (in seconds)
    /// Default: 300 (5 minutes)
    pub retention_secs: u64,

    /// Depth of each coordinator's command mailbox
    /// Default: 64
    pub mailbox_capacity: usize,

    /// Frames buffered per subscriber before it is considered too slow
    /// and dropped
    /// Default: 64
    pub subscriber_buffer: usize,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            retention_secs: 300,
            mailbox_capacity: 64,
            subscriber_buffer: 64,
        }
    }
}

impl JobsConfig {
    /// Get the terminal retention window as Duration
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = JobsConfig::default();
        assert_eq!(config.retention(), Duration::from_secs(300));
        assert_eq!(config.mailbox_capacity, 64);
        assert_eq!(config.subscriber_buffer, 64);
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = JobsConfig::default();
        let serialized = serde_json::to_string(&config).unwrap();
        let deserialized: JobsConfig = serde_json::from_str(&serialized).unwrap();
        assert_eq!(config.retention_secs, deserialized.retention_secs);
        assert_eq!(config.subscriber_buffer, deserialized.subscriber_buffer);
    }
}
