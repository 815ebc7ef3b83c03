//! Token-bucket admission for expensive upstream calls

use crate::{AdmissionConfig, AdmissionError};
use rand::Rng;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket with continuous elapsed-time refill
///
/// Capacity `N` refilling at `rate` tokens per second. Acquisition and refill
/// are a single atomic update under one lock: the caller's token is deducted
/// immediately (the balance may go negative) and the caller then sleeps off
/// its own deficit, which keeps waiting callers in arrival order without a
/// queue.
///
/// A small random jitter is added after acquisition so that many callers
/// unblocking at once do not hit the upstream in a burst.
pub struct TokenBucket {
    state: Mutex<BucketState>,
    capacity: f64,
    rate: f64,
    max_jitter: Duration,
}

impl TokenBucket {
    /// Create a bucket with the given capacity and refill rate, no jitter
    pub fn new(capacity: u32, rate_per_sec: f64) -> Self {
        Self {
            state: Mutex::new(BucketState {
                tokens: f64::from(capacity),
                last_refill: Instant::now(),
            }),
            capacity: f64::from(capacity),
            rate: rate_per_sec,
            max_jitter: Duration::ZERO,
        }
    }

    /// Create a bucket from config, including the jitter bound
    pub fn from_config(config: &AdmissionConfig) -> Self {
        Self::new(config.bucket_capacity, config.bucket_refill_per_sec).with_jitter(config.max_jitter())
    }

    /// Set the post-acquisition jitter bound
    pub fn with_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    /// Acquire one token, sleeping off the deficit if none is available
    pub async fn acquire(&self) {
        let wait = self.take_token().await;
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
        self.jitter().await;
    }

    /// Acquire one token, giving up if the expected wait exceeds `limit`
    ///
    /// A timed-out call consumes nothing, so request-serving code can bail
    /// out without stealing capacity from callers willing to wait.
    pub async fn acquire_timeout(&self, limit: Duration) -> Result<(), AdmissionError> {
        let wait = {
            let mut state = self.state.lock().await;
            self.refill(&mut state);
            let wait = if state.tokens >= 1.0 {
                Duration::ZERO
            } else {
                Duration::from_secs_f64((1.0 - state.tokens) / self.rate)
            };
            if wait > limit {
                return Err(AdmissionError::AcquireTimeout(limit));
            }
            state.tokens -= 1.0;
            wait
        };
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
        self.jitter().await;
        Ok(())
    }

    /// Restore full capacity (test hook only)
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.tokens = self.capacity;
        state.last_refill = Instant::now();
    }

    async fn take_token(&self) -> Duration {
        let mut state = self.state.lock().await;
        self.refill(&mut state);
        state.tokens -= 1.0;
        if state.tokens >= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(-state.tokens / self.rate)
        }
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.last_refill = now;
        state.tokens = (state.tokens + elapsed * self.rate).min(self.capacity);
    }

    async fn jitter(&self) {
        if self.max_jitter.is_zero() {
            return;
        }
        let bound = self.max_jitter.as_millis() as u64;
        let ms = rand::thread_rng().gen_range(0..=bound);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}
