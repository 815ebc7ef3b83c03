//! Stacks Archive
//!
//! Cold-storage workflow for the durable cache tier: candidate selection,
//! demotion to the archival tier, and restoration on renewed access.
//!
//! # Overview
//!
//! The archive crate owns both directions of the durable/archival boundary:
//!
//! - **Selection**: [`ArchivalSelector`] scans durable-tier entries and an
//!   optional access-frequency signal to pick cold candidates
//! - **Demotion**: [`ArchivalWorker::archive`] moves candidates into the
//!   archival tier, leaving a cold-index pointer behind
//! - **Restoration**: [`ArchivalWorker::restore`] moves a value back on
//!   renewed access and deletes the pointer
//! - **Scheduling**: [`ArchiveSweeper`] runs selection plus demotion on a
//!   fixed interval and collects [`ArchiveMetrics`]
//!
//! Keeping both transitions in one crate is what preserves the cold-index
//! invariant: a key has either a live durable entry or a cold-index pointer,
//! and only these two code paths ever move a value across the boundary.
//!
//! # Usage
//!
//! ## One-time Sweep
//!
//! ```no_run
//! use stacks_archive::{ArchiveConfig, ArchiveSweeper};
//! use stacks_domain::CacheTierStore;
//! use std::sync::Arc;
//!
//! # async fn demo(durable: Arc<dyn CacheTierStore>, archival: Arc<dyn CacheTierStore>) {
//! let mut sweeper = ArchiveSweeper::new(durable, archival, ArchiveConfig::default());
//! let metrics = sweeper.sweep(None).await.unwrap();
//! println!("{}", metrics.summary());
//! # }
//! ```
//!
//! ## Scheduled Worker
//!
//! ```no_run
//! use stacks_archive::{ArchiveConfig, ArchiveSweeper};
//! use stacks_domain::CacheTierStore;
//! use std::sync::Arc;
//!
//! # async fn demo(durable: Arc<dyn CacheTierStore>, archival: Arc<dyn CacheTierStore>) {
//! let mut sweeper = ArchiveSweeper::new(durable, archival, ArchiveConfig::default());
//! // Run indefinitely (until Ctrl+C)
//! sweeper.run().await.unwrap();
//! # }
//! ```
//!
//! # Configuration
//!
//! [`ArchiveConfig`] controls the hybrid selection rule (age threshold AND
//! access threshold), the sweep interval, per-call timeouts, and a dry-run
//! mode that logs candidates without mutating any tier.

#![warn(missing_docs)]

mod config;
mod error;
mod metrics;
mod selector;
mod sweeper;
mod worker;

pub use config::ArchiveConfig;
pub use error::ArchiveError;
pub use metrics::ArchiveMetrics;
pub use selector::{AccessStatsSource, ArchivalSelector};
pub use sweeper::ArchiveSweeper;
pub use worker::{archive_path, ArchivalWorker};
