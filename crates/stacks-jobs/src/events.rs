//! Progress-frame protocol
//!
//! Every state change a coordinator applies is broadcast to subscribers as
//! one JSON frame:
//!
//! ```json
//! { "type": "progress", "jobId": "...", "timestamp": 1716402000123, "data": { ... } }
//! ```
//!
//! `progress` frames carry the full record snapshot; `job_complete` carries
//! the final summary (plus `expiresAt` when retention is configured) and
//! `job_failed` carries the error message and a retryable flag. Consumers
//! must treat `expiresAt` as optional.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stacks_domain::{JobId, JobRecord, JobState};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub(crate) fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Discriminator for the frames a subscriber can receive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    /// Non-terminal state change; `data` is a record snapshot
    Progress,

    /// Job reached `Complete`; `data` carries the summary
    JobComplete,

    /// Job reached `Failed`; `data` carries the error
    JobFailed,
}

/// One frame of the job progress protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressFrame {
    /// Frame discriminator
    #[serde(rename = "type")]
    pub kind: FrameKind,

    /// The job this frame describes
    #[serde(rename = "jobId")]
    pub job_id: JobId,

    /// When the frame was emitted (milliseconds since Unix epoch)
    pub timestamp: u64,

    /// State-specific payload
    pub data: Value,
}

impl ProgressFrame {
    /// Non-terminal frame carrying a full record snapshot
    pub fn progress(record: &JobRecord) -> Self {
        Self {
            kind: FrameKind::Progress,
            job_id: record.job_id.clone(),
            timestamp: current_timestamp_ms(),
            data: serde_json::to_value(record).unwrap_or_default(),
        }
    }

    /// Terminal frame for a completed job
    pub fn complete(record: &JobRecord) -> Self {
        let mut data = serde_json::Map::new();
        if let Some(summary) = &record.summary {
            data.insert(
                "summary".to_string(),
                serde_json::to_value(summary).unwrap_or_default(),
            );
        }
        if let Some(expires_at) = record.expires_at {
            data.insert("expiresAt".to_string(), expires_at.into());
        }
        Self {
            kind: FrameKind::JobComplete,
            job_id: record.job_id.clone(),
            timestamp: current_timestamp_ms(),
            data: Value::Object(data),
        }
    }

    /// Terminal frame for a failed job
    pub fn failed(record: &JobRecord) -> Self {
        let mut data = serde_json::Map::new();
        if let Some(error) = &record.error {
            data.insert("message".to_string(), error.message.clone().into());
            data.insert("retryable".to_string(), error.retryable.into());
        }
        if let Some(expires_at) = record.expires_at {
            data.insert("expiresAt".to_string(), expires_at.into());
        }
        Self {
            kind: FrameKind::JobFailed,
            job_id: record.job_id.clone(),
            timestamp: current_timestamp_ms(),
            data: Value::Object(data),
        }
    }

    /// The frame a new subscriber is replayed: the terminal frame for a
    /// finished job, a plain snapshot otherwise
    pub fn snapshot(record: &JobRecord) -> Self {
        match record.state {
            JobState::Complete => Self::complete(record),
            JobState::Failed => Self::failed(record),
            _ => Self::progress(record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stacks_domain::{JobFailure, JobSummary};

    fn record() -> JobRecord {
        JobRecord::new(JobId::from("job-9"), 100)
    }

    #[test]
    fn test_progress_frame_wire_shape() {
        let frame = ProgressFrame::progress(&record());
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "progress");
        assert_eq!(json["jobId"], "job-9");
        assert!(json["timestamp"].as_u64().is_some());
        assert_eq!(json["data"]["state"], "pending");
        assert_eq!(json["data"]["completedUnits"], 0);
    }

    #[test]
    fn test_complete_frame_carries_summary_and_expiry() {
        let mut rec = record();
        rec.state = JobState::Complete;
        rec.summary = Some(JobSummary {
            total_processed: 3,
            success_count: 3,
            failure_count: 0,
            duration_ms: 420,
            resource_id: Some("shelf-7".to_string()),
        });
        rec.expires_at = Some(400);

        let json = serde_json::to_value(ProgressFrame::complete(&rec)).unwrap();
        assert_eq!(json["type"], "job_complete");
        assert_eq!(json["data"]["summary"]["totalProcessed"], 3);
        assert_eq!(json["data"]["summary"]["resourceId"], "shelf-7");
        assert_eq!(json["data"]["expiresAt"], 400);
    }

    #[test]
    fn test_complete_frame_expiry_is_optional() {
        let mut rec = record();
        rec.state = JobState::Complete;
        rec.summary = Some(JobSummary {
            total_processed: 0,
            success_count: 0,
            failure_count: 0,
            duration_ms: 0,
            resource_id: None,
        });

        let json = serde_json::to_value(ProgressFrame::complete(&rec)).unwrap();
        assert!(json["data"].get("expiresAt").is_none());
    }

    #[test]
    fn test_failed_frame_carries_error() {
        let mut rec = record();
        rec.state = JobState::Failed;
        rec.error = Some(JobFailure {
            message: "upstream returned 503".to_string(),
            retryable: true,
        });

        let json = serde_json::to_value(ProgressFrame::failed(&rec)).unwrap();
        assert_eq!(json["type"], "job_failed");
        assert_eq!(json["data"]["message"], "upstream returned 503");
        assert_eq!(json["data"]["retryable"], true);
    }

    #[test]
    fn test_snapshot_dispatches_on_state() {
        let mut rec = record();
        assert_eq!(ProgressFrame::snapshot(&rec).kind, FrameKind::Progress);

        rec.state = JobState::Complete;
        assert_eq!(ProgressFrame::snapshot(&rec).kind, FrameKind::JobComplete);

        rec.state = JobState::Failed;
        assert_eq!(ProgressFrame::snapshot(&rec).kind, FrameKind::JobFailed);
    }
}
