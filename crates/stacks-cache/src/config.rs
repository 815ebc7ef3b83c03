//! Configuration for the unified cache service

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for [`crate::UnifiedCacheService`]
///
/// # Examples
///
/// ```
/// use stacks_cache::CacheConfig;
///
/// let config = CacheConfig::default();
/// assert_eq!(config.fast_capacity, 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries the fast tier holds before evicting
    /// Default: 1024
    pub fast_capacity: usize,

    /// TTL applied by [`crate::UnifiedCacheService::put_with_default`]
    /// (in seconds)
    /// Default: 86400 (one day)
    pub default_ttl_secs: u64,

    /// Timeout applied to each authoritative tier call (in seconds)
    /// Default: 5
    pub op_timeout_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            fast_capacity: 1024,
            default_ttl_secs: 86_400,
            op_timeout_secs: 5,
        }
    }
}

impl CacheConfig {
    /// Get the default TTL as Duration
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    /// Get the per-call timeout as Duration
    pub fn op_timeout(&self) -> Duration {
        Duration::from_secs(self.op_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.default_ttl(), Duration::from_secs(86_400));
        assert_eq!(config.op_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = CacheConfig::default();
        let serialized = serde_json::to_string(&config).unwrap();
        let deserialized: CacheConfig = serde_json::from_str(&serialized).unwrap();
        assert_eq!(config.fast_capacity, deserialized.fast_capacity);
    }
}
