//! Per-job coordinator actor
//!
//! Each job id is owned by exactly one spawned task for the job's lifetime.
//! All mutating RPCs arrive through the task's mailbox and are applied one
//! at a time in arrival order, so the `JobRecord` needs no lock and no two
//! callers can race on the same job's counters. RPCs for different job ids
//! run fully in parallel.
//!
//! After a job reaches a terminal state the actor lingers for the configured
//! retention window so late subscribers still receive the outcome, then
//! exits. A handle whose actor has exited reports [`JobError::Closed`].

use crate::events::current_timestamp;
use crate::{JobError, JobsConfig, ProgressFrame};
use stacks_domain::{JobFailure, JobId, JobRecord, JobState, JobSummary, UnitResult, UnitStatus};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_stream::wrappers::ReceiverStream;

pub(crate) enum Command {
    InitBatch {
        total_units: usize,
        reply: oneshot::Sender<Result<(), JobError>>,
    },
    UpdateUnit {
        result: UnitResult,
        reply: oneshot::Sender<Result<(), JobError>>,
    },
    CompleteBatch {
        summary: JobSummary,
        reply: oneshot::Sender<Result<(), JobError>>,
    },
    Fail {
        message: String,
        retryable: bool,
        reply: oneshot::Sender<Result<(), JobError>>,
    },
    Subscribe {
        reply: oneshot::Sender<Subscription>,
    },
    Unsubscribe {
        id: u64,
    },
}

/// A registered subscriber's end of the frame stream
///
/// The first frame received is always a snapshot of the record as of the
/// subscribe call; live frames follow with no gap. The stream ends when the
/// job reaches a terminal state or the subscriber falls too far behind.
pub struct Subscription {
    id: u64,
    rx: mpsc::Receiver<ProgressFrame>,
}

impl Subscription {
    /// Identifier to pass to `unsubscribe`
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Receive the next frame, or `None` once the stream has ended
    pub async fn recv(&mut self) -> Option<ProgressFrame> {
        self.rx.recv().await
    }

    /// Convert into a `Stream` of frames
    pub fn into_stream(self) -> ReceiverStream<ProgressFrame> {
        ReceiverStream::new(self.rx)
    }
}

struct JobCoordinator {
    record: JobRecord,
    subscribers: HashMap<u64, mpsc::Sender<ProgressFrame>>,
    next_subscriber_id: u64,
    retention: Duration,
    subscriber_buffer: usize,
}

impl JobCoordinator {
    /// Spawn the actor task for `job_id` and return a handle to it
    pub(crate) fn spawn(job_id: JobId, config: &JobsConfig) -> JobHandle {
        let (tx, rx) = mpsc::channel(config.mailbox_capacity.max(1));
        let coordinator = Self {
            record: JobRecord::new(job_id.clone(), current_timestamp()),
            subscribers: HashMap::new(),
            next_subscriber_id: 0,
            retention: config.retention(),
            subscriber_buffer: config.subscriber_buffer.max(1),
        };
        tokio::spawn(coordinator.run(rx));
        JobHandle { job_id, tx }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        tracing::debug!(job_id = %self.record.job_id, "Job coordinator started");
        let mut expiry: Option<Instant> = None;
        loop {
            tokio::select! {
                cmd = rx.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
                _ = tokio::time::sleep_until(expiry.unwrap_or_else(Instant::now)), if expiry.is_some() => {
                    tracing::debug!(job_id = %self.record.job_id, "Retention elapsed, coordinator exiting");
                    break;
                }
            }
            if expiry.is_none() && self.record.state.is_terminal() {
                expiry = Some(Instant::now() + self.retention);
            }
        }
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::InitBatch { total_units, reply } => {
                let _ = reply.send(self.init_batch(total_units));
            }
            Command::UpdateUnit { result, reply } => {
                let _ = reply.send(self.update_unit(result));
            }
            Command::CompleteBatch { summary, reply } => {
                let _ = reply.send(self.complete_batch(summary));
            }
            Command::Fail {
                message,
                retryable,
                reply,
            } => {
                let _ = reply.send(self.fail(message, retryable));
            }
            Command::Subscribe { reply } => {
                let _ = reply.send(self.subscribe());
            }
            Command::Unsubscribe { id } => {
                self.subscribers.remove(&id);
            }
        }
    }

    fn init_batch(&mut self, total_units: usize) -> Result<(), JobError> {
        if self.record.state != JobState::Pending {
            return Err(self.invalid("init_batch"));
        }
        self.record.total_units = total_units;
        self.record.state = JobState::Uploading;
        self.broadcast(ProgressFrame::progress(&self.record));
        Ok(())
    }

    fn update_unit(&mut self, result: UnitResult) -> Result<(), JobError> {
        if !matches!(
            self.record.state,
            JobState::Uploading | JobState::Processing
        ) {
            return Err(self.invalid("update_unit"));
        }
        self.record.state = JobState::Processing;
        self.record.completed_units += 1;
        self.record.unit_results.push(result);
        self.broadcast(ProgressFrame::progress(&self.record));
        Ok(())
    }

    fn complete_batch(&mut self, summary: JobSummary) -> Result<(), JobError> {
        if self.record.state != JobState::Processing {
            return Err(self.invalid("complete_batch"));
        }
        self.record.state = JobState::Complete;
        self.record.summary = Some(summary);
        self.record.expires_at = Some(current_timestamp() + self.retention.as_secs());
        tracing::info!(
            job_id = %self.record.job_id,
            completed_units = self.record.completed_units,
            "Job complete"
        );
        self.finish(ProgressFrame::complete(&self.record));
        Ok(())
    }

    fn fail(&mut self, message: String, retryable: bool) -> Result<(), JobError> {
        if self.record.state.is_terminal() {
            return Err(self.invalid("fail"));
        }
        self.record.state = JobState::Failed;
        self.record.error = Some(JobFailure { message, retryable });
        self.record.expires_at = Some(current_timestamp() + self.retention.as_secs());
        tracing::warn!(job_id = %self.record.job_id, retryable, "Job failed");
        self.finish(ProgressFrame::failed(&self.record));
        Ok(())
    }

    fn subscribe(&mut self) -> Subscription {
        let id = self.next_subscriber_id;
        self.next_subscriber_id += 1;

        let (tx, rx) = mpsc::channel(self.subscriber_buffer);
        // Snapshot goes into the channel before the sender is registered,
        // so no live frame can slip in ahead of it.
        let _ = tx.try_send(ProgressFrame::snapshot(&self.record));
        if !self.record.state.is_terminal() {
            self.subscribers.insert(id, tx);
        }
        Subscription { id, rx }
    }

    /// Broadcast the terminal frame exactly once, then drop every
    /// subscriber sender so their streams end.
    fn finish(&mut self, frame: ProgressFrame) {
        self.broadcast(frame);
        self.subscribers.clear();
    }

    fn broadcast(&mut self, frame: ProgressFrame) {
        let job_id = self.record.job_id.clone();
        self.subscribers.retain(|id, tx| match tx.try_send(frame.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(%job_id, subscriber = id, "Subscriber too slow, dropping");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }

    fn invalid(&self, action: &'static str) -> JobError {
        JobError::InvalidTransition {
            job_id: self.record.job_id.clone(),
            from: self.record.state,
            action,
        }
    }
}

/// Clonable handle to one job's coordinator
///
/// Every method is an RPC into the actor's mailbox; results come back on a
/// oneshot reply channel. All methods return [`JobError::Closed`] once the
/// actor has exited.
#[derive(Clone)]
pub struct JobHandle {
    job_id: JobId,
    tx: mpsc::Sender<Command>,
}

impl JobHandle {
    /// The job this handle addresses
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Whether the coordinator task has exited
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Declare the batch size; valid only from `Pending`
    pub async fn init_batch(&self, total_units: usize) -> Result<(), JobError> {
        self.call(|reply| Command::InitBatch { total_units, reply })
            .await
    }

    /// Record one unit's outcome; valid from `Uploading` and `Processing`
    pub async fn update_unit(
        &self,
        index: usize,
        status: UnitStatus,
        detail: impl Into<String>,
    ) -> Result<(), JobError> {
        let result = UnitResult {
            index,
            status,
            detail: detail.into(),
        };
        self.call(|reply| Command::UpdateUnit { result, reply }).await
    }

    /// Attach the final summary and complete the job; valid from `Processing`
    pub async fn complete_batch(&self, summary: JobSummary) -> Result<(), JobError> {
        self.call(|reply| Command::CompleteBatch { summary, reply })
            .await
    }

    /// Fail the job; valid from any non-terminal state
    pub async fn fail(
        &self,
        message: impl Into<String>,
        retryable: bool,
    ) -> Result<(), JobError> {
        let message = message.into();
        self.call(|reply| Command::Fail {
            message,
            retryable,
            reply,
        })
        .await
    }

    /// Register a subscriber; the snapshot is replayed as its first frame
    pub async fn subscribe(&self) -> Result<Subscription, JobError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Subscribe { reply })
            .await
            .map_err(|_| JobError::Closed)?;
        rx.await.map_err(|_| JobError::Closed)
    }

    /// Remove a subscriber; never errors, even if already removed or the
    /// coordinator has exited
    pub async fn unsubscribe(&self, id: u64) {
        let _ = self.tx.send(Command::Unsubscribe { id }).await;
    }

    async fn call(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<(), JobError>>) -> Command,
    ) -> Result<(), JobError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| JobError::Closed)?;
        rx.await.map_err(|_| JobError::Closed)?
    }
}

/// Spawn a coordinator for `job_id` (crate-internal; the registry is the
/// public entry point)
pub(crate) fn spawn(job_id: JobId, config: &JobsConfig) -> JobHandle {
    JobCoordinator::spawn(job_id, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FrameKind;

    fn handle(config: &JobsConfig) -> JobHandle {
        spawn(JobId::from("job-1"), config)
    }

    fn summary() -> JobSummary {
        JobSummary {
            total_processed: 1,
            success_count: 1,
            failure_count: 0,
            duration_ms: 10,
            resource_id: None,
        }
    }

    #[tokio::test]
    async fn test_complete_before_init_is_rejected() {
        let job = handle(&JobsConfig::default());

        let err = job.complete_batch(summary()).await.unwrap_err();
        assert_eq!(
            err,
            JobError::InvalidTransition {
                job_id: JobId::from("job-1"),
                from: JobState::Pending,
                action: "complete_batch",
            }
        );
    }

    #[tokio::test]
    async fn test_complete_accepted_exactly_once() {
        let job = handle(&JobsConfig::default());
        let mut sub = job.subscribe().await.unwrap();

        job.init_batch(1).await.unwrap();
        job.update_unit(0, UnitStatus::Ok, "done").await.unwrap();
        job.complete_batch(summary()).await.unwrap();
        // The second call is rejected and must not broadcast again
        assert!(job.complete_batch(summary()).await.is_err());

        let mut complete_frames = 0;
        while let Some(frame) = sub.recv().await {
            if frame.kind == FrameKind::JobComplete {
                complete_frames += 1;
            }
        }
        assert_eq!(complete_frames, 1);
    }

    #[tokio::test]
    async fn test_rejected_call_broadcasts_nothing() {
        let job = handle(&JobsConfig::default());
        let mut sub = job.subscribe().await.unwrap();

        // Snapshot replay comes first
        let snapshot = sub.recv().await.unwrap();
        assert_eq!(snapshot.data["state"], "pending");

        assert!(job.complete_batch(summary()).await.is_err());
        job.init_batch(2).await.unwrap();

        // The frame after the snapshot is the init, nothing in between
        let frame = sub.recv().await.unwrap();
        assert_eq!(frame.data["state"], "uploading");
        assert_eq!(frame.data["totalUnits"], 2);
    }

    #[tokio::test]
    async fn test_fail_from_any_nonterminal_state() {
        let job = handle(&JobsConfig::default());
        let mut sub = job.subscribe().await.unwrap();
        sub.recv().await.unwrap();

        job.fail("source file unreadable", false).await.unwrap();

        let frame = sub.recv().await.unwrap();
        assert_eq!(frame.kind, FrameKind::JobFailed);
        assert_eq!(frame.data["message"], "source file unreadable");
        assert_eq!(frame.data["retryable"], false);
        // Terminal frame ends the stream
        assert!(sub.recv().await.is_none());

        // Terminal states reject further mutation
        assert!(job.fail("again", false).await.is_err());
    }

    #[tokio::test]
    async fn test_subscribe_after_complete_gets_terminal_snapshot_only() {
        let job = handle(&JobsConfig::default());
        job.init_batch(1).await.unwrap();
        job.update_unit(0, UnitStatus::Ok, "done").await.unwrap();
        job.complete_batch(summary()).await.unwrap();

        let mut sub = job.subscribe().await.unwrap();
        let frame = sub.recv().await.unwrap();
        assert_eq!(frame.kind, FrameKind::JobComplete);
        assert_eq!(frame.data["summary"]["totalProcessed"], 1);
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery_and_never_errors() {
        let job = handle(&JobsConfig::default());
        let mut sub = job.subscribe().await.unwrap();
        sub.recv().await.unwrap();

        job.unsubscribe(sub.id()).await;
        job.init_batch(1).await.unwrap();
        assert!(sub.recv().await.is_none());

        // Repeat removal of an unknown id is fine
        job.unsubscribe(sub.id()).await;
        job.unsubscribe(999).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_coordinator_exits_after_retention() {
        let config = JobsConfig {
            retention_secs: 1,
            ..Default::default()
        };
        let job = handle(&config);
        job.init_batch(1).await.unwrap();
        job.update_unit(0, UnitStatus::Ok, "done").await.unwrap();
        job.complete_batch(summary()).await.unwrap();

        // Still answering during the retention window
        let mut sub = job.subscribe().await.unwrap();
        assert_eq!(sub.recv().await.unwrap().kind, FrameKind::JobComplete);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(job.is_closed());
        assert_eq!(job.init_batch(1).await.unwrap_err(), JobError::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_subscriber_is_dropped() {
        let config = JobsConfig {
            subscriber_buffer: 1,
            ..Default::default()
        };
        let job = handle(&config);
        // Never drained: the snapshot already fills the one-frame buffer
        let mut sub = job.subscribe().await.unwrap();

        job.init_batch(3).await.unwrap();
        job.update_unit(0, UnitStatus::Ok, "a").await.unwrap();

        // Only the snapshot made it through before the drop
        assert_eq!(sub.recv().await.unwrap().data["state"], "pending");
        assert!(sub.recv().await.is_none());
    }
}
