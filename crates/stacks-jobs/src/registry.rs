//! Registry mapping job ids to coordinator handles

use crate::{coordinator, JobHandle, JobsConfig};
use stacks_domain::JobId;
use std::collections::HashMap;
use std::sync::RwLock;

/// The `job id -> handle` map
///
/// A coordinator is created on the first RPC for a job id, whether the id
/// was minted here ([`spawn_job`](Self::spawn_job)) or supplied by the
/// caller ([`handle`](Self::handle)). Handles whose actor has exited (the
/// terminal retention window elapsed) are replaced transparently on next
/// use and can be swept out with [`evict_finished`](Self::evict_finished).
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, JobHandle>>,
    config: JobsConfig,
}

impl JobRegistry {
    /// Create an empty registry
    pub fn new(config: JobsConfig) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Start a new job under a server-generated id
    pub fn spawn_job(&self) -> JobHandle {
        self.handle(&JobId::new())
    }

    /// Get the handle for `job_id`, spawning a coordinator if none is live
    pub fn handle(&self, job_id: &JobId) -> JobHandle {
        let mut jobs = self
            .jobs
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(existing) = jobs.get(job_id) {
            if !existing.is_closed() {
                return existing.clone();
            }
            tracing::debug!(%job_id, "Replacing exited coordinator");
        }
        let handle = coordinator::spawn(job_id.clone(), &self.config);
        jobs.insert(job_id.clone(), handle.clone());
        handle
    }

    /// Drop handles whose coordinator has exited
    pub fn evict_finished(&self) {
        let mut jobs = self
            .jobs
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = jobs.len();
        jobs.retain(|_, handle| !handle.is_closed());
        let evicted = before - jobs.len();
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted finished jobs");
        }
    }

    /// Number of tracked jobs, live or awaiting eviction
    pub fn job_count(&self) -> usize {
        self.jobs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JobError;
    use stacks_domain::{JobState, JobSummary, UnitStatus};
    use std::time::Duration;

    fn summary() -> JobSummary {
        JobSummary {
            total_processed: 1,
            success_count: 1,
            failure_count: 0,
            duration_ms: 5,
            resource_id: None,
        }
    }

    #[tokio::test]
    async fn test_same_id_addresses_same_coordinator() {
        let registry = JobRegistry::new(JobsConfig::default());
        let id = JobId::from("import-42");

        registry.handle(&id).init_batch(3).await.unwrap();

        // A fresh lookup reaches the same actor: re-init is invalid
        let err = registry.handle(&id).init_batch(3).await.unwrap_err();
        assert!(matches!(
            err,
            JobError::InvalidTransition {
                from: JobState::Uploading,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_jobs_are_independent() {
        let registry = JobRegistry::new(JobsConfig::default());
        let a = registry.spawn_job();
        let b = registry.spawn_job();
        assert_ne!(a.job_id(), b.job_id());

        a.init_batch(1).await.unwrap();
        // b is untouched by a's transition
        b.init_batch(5).await.unwrap();
        assert_eq!(registry.job_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_evict_finished_removes_exited_actors() {
        let registry = JobRegistry::new(JobsConfig {
            retention_secs: 1,
            ..Default::default()
        });
        let job = registry.spawn_job();
        job.init_batch(1).await.unwrap();
        job.update_unit(0, UnitStatus::Ok, "done").await.unwrap();
        job.complete_batch(summary()).await.unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(job.is_closed());
        assert_eq!(registry.job_count(), 1);

        registry.evict_finished();
        assert_eq!(registry.job_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exited_coordinator_replaced_on_next_use() {
        let registry = JobRegistry::new(JobsConfig {
            retention_secs: 1,
            ..Default::default()
        });
        let id = JobId::from("import-7");
        let job = registry.handle(&id);
        job.init_batch(1).await.unwrap();
        job.update_unit(0, UnitStatus::Ok, "done").await.unwrap();
        job.complete_batch(summary()).await.unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;

        // Same id now reaches a fresh Pending coordinator
        registry.handle(&id).init_batch(4).await.unwrap();
    }
}
