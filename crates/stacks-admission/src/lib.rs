//! Stacks Admission
//!
//! Rate limiting for the metadata backend, in two independent shapes:
//!
//! - [`TokenBucket`]: guards expensive *outbound* calls to upstream metadata
//!   providers. Callers block until a token is available (with an optional
//!   timeout) and get a small random jitter after acquisition so a crowd of
//!   unblocked callers does not stampede the provider.
//! - [`FixedWindowLimiter`]: guards *inbound* endpoints per caller identity
//!   (source IP), with counters persisted in the durable tier under the
//!   `ratelimit:` namespace. On any counter store failure it fails open -
//!   availability over strict enforcement, a deliberate choice for this
//!   subsystem.
//!
//! # Usage
//!
//! ```no_run
//! use stacks_admission::{AdmissionConfig, TokenBucket};
//! use std::time::Duration;
//!
//! # async fn demo() {
//! let bucket = TokenBucket::from_config(&AdmissionConfig::default());
//! bucket.acquire().await;
//! // ... expensive upstream call ...
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod token_bucket;
mod window;

pub use config::AdmissionConfig;
pub use error::AdmissionError;
pub use token_bucket::TokenBucket;
pub use window::{FixedWindowLimiter, RateLimitDecision};
