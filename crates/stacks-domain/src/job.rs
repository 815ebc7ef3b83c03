//! Job module - the state owned by one background-job coordinator
//!
//! Batch enrichment, multi-image scans, and imports all report through the
//! same [`JobRecord`] shape. A record is created on the first RPC for a job
//! id, mutated only by that job's own coordinator, and retained for a
//! bounded window after reaching a terminal state so late subscribers can
//! still observe the outcome.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a background job
///
/// Server-spawned jobs get a UUIDv7-backed id (chronologically sortable,
/// no coordination required); callers may also address jobs by an id of
/// their own choosing, e.g. one minted by an upload endpoint.
///
/// # Examples
///
/// ```
/// use stacks_domain::JobId;
///
/// let id = JobId::new();
/// let same = JobId::from(id.as_str());
/// assert_eq!(id, same);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generate a new UUIDv7-based JobId
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a background job
///
/// Valid transitions: `Pending → Uploading → Processing → Complete`, with
/// `Failed` reachable from any non-terminal state. `Complete` and `Failed`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Created, no batch initialized yet
    Pending,

    /// Batch initialized, units still arriving
    Uploading,

    /// At least one unit result recorded
    Processing,

    /// All units processed, summary attached (terminal)
    Complete,

    /// Job failed (terminal)
    Failed,
}

impl JobState {
    /// Get the state name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Uploading => "uploading",
            JobState::Processing => "processing",
            JobState::Complete => "complete",
            JobState::Failed => "failed",
        }
    }

    /// Parse a state from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(JobState::Pending),
            "uploading" => Some(JobState::Uploading),
            "processing" => Some(JobState::Processing),
            "complete" => Some(JobState::Complete),
            "failed" => Some(JobState::Failed),
            _ => None,
        }
    }

    /// Whether no further transitions are possible from this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Complete | JobState::Failed)
    }
}

impl std::str::FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid job state: {}", s))
    }
}

/// Outcome of one unit of work within a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    /// Unit processed successfully
    Ok,

    /// Unit failed; detail carries the reason
    Failed,

    /// Unit skipped (duplicate, unparseable input, etc.)
    Skipped,
}

impl UnitStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitStatus::Ok => "ok",
            UnitStatus::Failed => "failed",
            UnitStatus::Skipped => "skipped",
        }
    }
}

/// Per-unit result recorded by `update_unit`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitResult {
    /// Zero-based index of the unit within the batch
    pub index: usize,

    /// Outcome for this unit
    pub status: UnitStatus,

    /// Human-readable detail (title matched, error text, ...)
    pub detail: String,
}

/// Final summary attached when a batch completes
///
/// `resource_id` is optional: imports produce a resource, pure enrichment
/// passes do not. Consumers must tolerate its absence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    /// Units the job attempted
    pub total_processed: usize,

    /// Units that succeeded
    pub success_count: usize,

    /// Units that failed
    pub failure_count: usize,

    /// Wall-clock duration of the whole batch in milliseconds
    pub duration_ms: u64,

    /// Identifier of a created resource, when the job produced one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
}

/// Terminal error attached when a job fails
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFailure {
    /// What went wrong
    pub message: String,

    /// Whether resubmitting the same job is worth attempting
    pub retryable: bool,
}

/// The full state of one background job
///
/// Held inside a coordinator; never shared mutably. Snapshots of this record
/// are what subscribers receive on replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    /// Job identifier
    pub job_id: JobId,

    /// Current lifecycle state
    pub state: JobState,

    /// Number of units declared by `init_batch`
    pub total_units: usize,

    /// Number of unit results recorded so far
    pub completed_units: usize,

    /// Ordered per-unit results
    pub unit_results: Vec<UnitResult>,

    /// Final summary, present once `Complete`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<JobSummary>,

    /// Terminal error, present once `Failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JobFailure>,

    /// When the record was created (seconds since Unix epoch)
    pub created_at: u64,

    /// When a terminal record stops being served (seconds since Unix epoch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

impl JobRecord {
    /// Create a fresh `Pending` record
    pub fn new(job_id: JobId, created_at: u64) -> Self {
        Self {
            job_id,
            state: JobState::Pending,
            total_units: 0,
            completed_units: 0,
            unit_results: Vec::new(),
            summary: None,
            error: None,
            created_at,
            expires_at: None,
        }
    }
}
