//! Fixed-window inbound limiter backed by the durable tier

use crate::{AdmissionConfig, AdmissionError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use stacks_domain::{keyspace, CacheTierStore};

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

/// Counter record persisted under `ratelimit:{identity}`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WindowCounter {
    window_start: u64,
    count: u64,
}

/// Outcome of one admission check
///
/// Always carries the window's limit and remaining counters so a rejection
/// can be rendered as a structured retry-after response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request is admitted
    pub allowed: bool,

    /// The window's request limit
    pub limit: u64,

    /// Requests remaining in the current window
    pub remaining: u64,

    /// Seconds until the window resets, present on rejection
    pub retry_after_secs: Option<u64>,
}

/// Per-identity fixed-window limiter over the durable tier
///
/// Counters live in the reserved `ratelimit:` namespace with a TTL matching
/// the window, so abandoned identities clean themselves up. The
/// read-modify-write is not atomic across concurrent checks for the same
/// identity; under a race the window may admit a request or two beyond the
/// limit, which is acceptable for an availability-first inbound guard.
///
/// Any failure to read or write the counter fails open: the request is
/// allowed and the failure is logged.
pub struct FixedWindowLimiter {
    store: Arc<dyn CacheTierStore>,
    window_secs: u64,
    max_requests: u64,
}

impl FixedWindowLimiter {
    /// Create a limiter over the given counter store
    pub fn new(store: Arc<dyn CacheTierStore>, config: &AdmissionConfig) -> Self {
        Self {
            store,
            window_secs: config.window_secs,
            max_requests: config.window_max_requests,
        }
    }

    /// Check whether `identity` may proceed, counting this request
    pub async fn check(&self, identity: &str) -> RateLimitDecision {
        self.check_at(identity, current_timestamp()).await
    }

    /// Like [`check`](Self::check), but returns the structured rate-limit
    /// error on rejection
    pub async fn enforce(&self, identity: &str) -> Result<RateLimitDecision, AdmissionError> {
        let decision = self.check(identity).await;
        if decision.allowed {
            Ok(decision)
        } else {
            Err(AdmissionError::RateLimited {
                retry_after_secs: decision.retry_after_secs.unwrap_or(self.window_secs),
                limit: decision.limit,
                remaining: decision.remaining,
            })
        }
    }

    pub(crate) async fn check_at(&self, identity: &str, now: u64) -> RateLimitDecision {
        let key = keyspace::rate_limit_key(identity);

        let counter = match self.store.get(&key).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<WindowCounter>(&bytes) {
                Ok(counter) => Some(counter),
                Err(e) => {
                    tracing::warn!(%identity, error = %e, "Corrupt rate-limit counter, starting fresh window");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(%identity, error = %e, "Rate-limit counter read failed, failing open");
                return self.allowed(self.max_requests.saturating_sub(1), None);
            }
        };

        let mut counter = match counter {
            Some(c) if now < c.window_start + self.window_secs => c,
            _ => WindowCounter {
                window_start: now,
                count: 0,
            },
        };

        let window_end = counter.window_start + self.window_secs;
        if counter.count >= self.max_requests {
            return RateLimitDecision {
                allowed: false,
                limit: self.max_requests,
                remaining: 0,
                retry_after_secs: Some(window_end.saturating_sub(now).max(1)),
            };
        }

        counter.count += 1;
        let remaining = self.max_requests - counter.count;
        let ttl = Duration::from_secs(window_end.saturating_sub(now).max(1));
        match serde_json::to_vec(&counter) {
            Ok(bytes) => {
                if let Err(e) = self.store.put(&key, bytes, ttl).await {
                    tracing::warn!(%identity, error = %e, "Rate-limit counter write failed, failing open");
                }
            }
            Err(e) => {
                tracing::warn!(%identity, error = %e, "Rate-limit counter encode failed, failing open");
            }
        }

        self.allowed(remaining, None)
    }

    fn allowed(&self, remaining: u64, retry_after_secs: Option<u64>) -> RateLimitDecision {
        RateLimitDecision {
            allowed: true,
            limit: self.max_requests,
            remaining,
            retry_after_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use stacks_domain::TierError;

    struct MemStore {
        entries: Mutex<HashMap<String, Vec<u8>>>,
        fail: bool,
    }

    impl MemStore {
        fn new() -> Self {
            Self {
                entries: Mutex::new(HashMap::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                entries: Mutex::new(HashMap::new()),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl CacheTierStore for MemStore {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, TierError> {
            if self.fail {
                return Err(TierError::Unavailable("simulated outage".to_string()));
            }
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn put(&self, key: &str, value: Vec<u8>, _ttl: Duration) -> Result<(), TierError> {
            if self.fail {
                return Err(TierError::Unavailable("simulated outage".to_string()));
            }
            self.entries.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), TierError> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }

        async fn list(&self, prefix: &str) -> Result<Vec<String>, TierError> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect())
        }
    }

    fn limiter_with(max: u64, window: u64, store: Arc<MemStore>) -> FixedWindowLimiter {
        let config = AdmissionConfig {
            window_secs: window,
            window_max_requests: max,
            ..Default::default()
        };
        FixedWindowLimiter::new(store, &config)
    }

    #[tokio::test]
    async fn test_allows_up_to_limit_then_rejects() {
        let limiter = limiter_with(3, 60, Arc::new(MemStore::new()));

        for expected_remaining in [2, 1, 0] {
            let d = limiter.check_at("203.0.113.9", 1_000).await;
            assert!(d.allowed);
            assert_eq!(d.remaining, expected_remaining);
        }

        let d = limiter.check_at("203.0.113.9", 1_030).await;
        assert!(!d.allowed);
        assert_eq!(d.limit, 3);
        assert_eq!(d.remaining, 0);
        // 30s into a 60s window
        assert_eq!(d.retry_after_secs, Some(30));
    }

    #[tokio::test]
    async fn test_window_resets_after_expiry() {
        let limiter = limiter_with(1, 60, Arc::new(MemStore::new()));

        assert!(limiter.check_at("id", 1_000).await.allowed);
        assert!(!limiter.check_at("id", 1_059).await.allowed);
        assert!(limiter.check_at("id", 1_060).await.allowed);
    }

    #[tokio::test]
    async fn test_identities_are_independent() {
        let limiter = limiter_with(1, 60, Arc::new(MemStore::new()));

        assert!(limiter.check_at("a", 1_000).await.allowed);
        assert!(limiter.check_at("b", 1_000).await.allowed);
        assert!(!limiter.check_at("a", 1_001).await.allowed);
    }

    #[tokio::test]
    async fn test_counter_store_failure_fails_open() {
        let limiter = limiter_with(1, 60, Arc::new(MemStore::failing()));

        // Every check is allowed despite the store being down
        for _ in 0..5 {
            assert!(limiter.check_at("id", 1_000).await.allowed);
        }
    }

    #[tokio::test]
    async fn test_enforce_returns_structured_error() {
        let limiter = limiter_with(1, 60, Arc::new(MemStore::new()));

        limiter.check_at("id", 1_000).await;
        let decision = limiter.check_at("id", 1_000).await;
        assert!(!decision.allowed);

        // enforce() uses the wall clock; drive the same rejection through
        // the public path with a fresh identity at the real time
        let err = match limiter.enforce("id").await {
            Err(e) => e,
            Ok(d) => {
                // Wall clock landed in a new window; consume it and retry
                assert!(d.allowed);
                limiter.enforce("id").await.unwrap_err()
            }
        };
        match err {
            AdmissionError::RateLimited { limit, remaining, retry_after_secs } => {
                assert_eq!(limit, 1);
                assert_eq!(remaining, 0);
                assert!(retry_after_secs >= 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
