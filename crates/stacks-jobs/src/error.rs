//! Error types for job coordination

use stacks_domain::{JobId, JobState};
use thiserror::Error;

/// Errors that can occur driving a background job
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JobError {
    /// A mutating RPC was called from a state it is not valid in.
    ///
    /// This is a programming error in the caller, surfaced rather than
    /// silently ignored so that the job's counters cannot be corrupted.
    #[error("Invalid transition for job {job_id}: cannot {action} while {from:?}")]
    InvalidTransition {
        /// The job the call addressed
        job_id: JobId,
        /// The state the job was in when the call arrived
        from: JobState,
        /// The RPC that was attempted
        action: &'static str,
    },

    /// The job's coordinator has exited (retention elapsed or shutdown)
    #[error("Job coordinator has exited")]
    Closed,
}
