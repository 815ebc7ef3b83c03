//! # Stacks Jobs
//!
//! Background-job coordination for the stacks cache system.
//!
//! ## Overview
//!
//! Batch imports and enrichment passes run for seconds to minutes and are
//! driven by several callers at once: an upload endpoint initializes the
//! batch, workers report per-unit results, and any number of clients watch
//! progress over a persistent connection. This crate serializes all of that
//! through one actor per job id:
//!
//! - **JobCoordinator**: a spawned task that owns a single `JobRecord` and
//!   applies mutating RPCs one at a time, in arrival order
//! - **JobHandle**: a cheap clonable handle that turns method calls into
//!   mailbox messages
//! - **JobRegistry**: the `job id -> handle` map, creating a coordinator on
//!   first use and evicting handles whose actor has exited
//! - **ProgressFrame**: the JSON frame broadcast to subscribers on every
//!   state change
//!
//! Subscribers get a snapshot of the current record before any live frames,
//! with no gap between the two, so a client that connects mid-job (or after
//! the job already finished) always learns the current state.
//!
//! ## Usage
//!
//! ```no_run
//! use stacks_jobs::{JobRegistry, JobsConfig};
//! use stacks_domain::{JobSummary, UnitStatus};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = JobRegistry::new(JobsConfig::default());
//!
//!     let job = registry.spawn_job();
//!     let mut sub = job.subscribe().await?;
//!
//!     job.init_batch(2).await?;
//!     job.update_unit(0, UnitStatus::Ok, "matched by isbn").await?;
//!     job.update_unit(1, UnitStatus::Skipped, "duplicate").await?;
//!     job.complete_batch(JobSummary {
//!         total_processed: 2,
//!         success_count: 1,
//!         failure_count: 0,
//!         duration_ms: 840,
//!         resource_id: None,
//!     })
//!     .await?;
//!
//!     while let Some(frame) = sub.recv().await {
//!         println!("{}", serde_json::to_string(&frame)?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! [`JobsConfig`] controls the terminal-state retention window, the actor
//! mailbox depth, and the per-subscriber buffer. A subscriber that cannot
//! drain its buffer is dropped rather than allowed to stall the job.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod registry;

pub use config::JobsConfig;
pub use coordinator::{JobHandle, Subscription};
pub use error::JobError;
pub use events::{FrameKind, ProgressFrame};
pub use registry::JobRegistry;
