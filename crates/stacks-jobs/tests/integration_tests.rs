//! End-to-end job lifecycle tests

use stacks_domain::{JobState, JobSummary, UnitStatus};
use stacks_jobs::{FrameKind, JobRegistry, JobsConfig, ProgressFrame};

fn summary(total: usize) -> JobSummary {
    JobSummary {
        total_processed: total,
        success_count: total,
        failure_count: 0,
        duration_ms: 1200,
        resource_id: Some("collection-3".to_string()),
    }
}

async fn drain(mut sub: stacks_jobs::Subscription) -> Vec<ProgressFrame> {
    let mut frames = Vec::new();
    while let Some(frame) = sub.recv().await {
        frames.push(frame);
    }
    frames
}

#[tokio::test]
async fn test_full_batch_emits_ordered_frames() {
    let registry = JobRegistry::new(JobsConfig::default());
    let job = registry.spawn_job();
    let sub = job.subscribe().await.unwrap();

    job.init_batch(3).await.unwrap();
    for index in 0..3 {
        job.update_unit(index, UnitStatus::Ok, format!("unit {index}"))
            .await
            .unwrap();
    }
    job.complete_batch(summary(3)).await.unwrap();

    let frames = drain(sub).await;

    // Snapshot replay, then one frame per mutation
    assert_eq!(frames.len(), 6);
    assert_eq!(frames[0].data["state"], "pending");
    assert_eq!(frames[1].data["state"], "uploading");
    assert_eq!(frames[1].data["totalUnits"], 3);
    for (i, frame) in frames[2..5].iter().enumerate() {
        assert_eq!(frame.kind, FrameKind::Progress);
        assert_eq!(frame.data["state"], "processing");
        assert_eq!(frame.data["completedUnits"], (i + 1) as u64);
    }
    assert_eq!(frames[5].kind, FrameKind::JobComplete);
    assert_eq!(frames[5].data["summary"]["totalProcessed"], 3);
    assert_eq!(frames[5].data["summary"]["resourceId"], "collection-3");
}

#[tokio::test]
async fn test_concurrent_updates_never_lose_counts() {
    let registry = JobRegistry::new(JobsConfig {
        // Room for the snapshot plus every mutation frame
        subscriber_buffer: 64,
        ..Default::default()
    });
    let job = registry.spawn_job();
    job.init_batch(16).await.unwrap();

    let mut handles = Vec::new();
    for index in 0..16 {
        let job = job.clone();
        handles.push(tokio::spawn(async move {
            job.update_unit(index, UnitStatus::Ok, "parallel worker")
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // The post-update snapshot reflects every call, no lost increments
    let mut sub = job.subscribe().await.unwrap();
    let frame = sub.recv().await.unwrap();
    assert_eq!(frame.data["state"], JobState::Processing.as_str());
    assert_eq!(frame.data["completedUnits"], 16);
    assert_eq!(frame.data["unitResults"].as_array().unwrap().len(), 16);

    job.complete_batch(summary(16)).await.unwrap();
}

#[tokio::test]
async fn test_late_subscriber_sees_failure_outcome() {
    let registry = JobRegistry::new(JobsConfig::default());
    let job = registry.spawn_job();
    job.init_batch(2).await.unwrap();
    job.fail("provider quota exhausted", true).await.unwrap();

    let frames = drain(job.subscribe().await.unwrap()).await;
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].kind, FrameKind::JobFailed);
    assert_eq!(frames[0].data["message"], "provider quota exhausted");
    assert_eq!(frames[0].data["retryable"], true);
    assert!(frames[0].data["expiresAt"].as_u64().is_some());
}

#[tokio::test]
async fn test_multiple_subscribers_see_identical_history() {
    let registry = JobRegistry::new(JobsConfig::default());
    let job = registry.spawn_job();
    let first = job.subscribe().await.unwrap();
    let second = job.subscribe().await.unwrap();

    job.init_batch(1).await.unwrap();
    job.update_unit(0, UnitStatus::Failed, "no match").await.unwrap();
    job.complete_batch(JobSummary {
        total_processed: 1,
        success_count: 0,
        failure_count: 1,
        duration_ms: 90,
        resource_id: None,
    })
    .await
    .unwrap();

    let a = drain(first).await;
    let b = drain(second).await;
    assert_eq!(a.len(), 4);
    let kinds_a: Vec<_> = a.iter().map(|f| f.kind).collect();
    let kinds_b: Vec<_> = b.iter().map(|f| f.kind).collect();
    assert_eq!(kinds_a, kinds_b);
    assert_eq!(a.last().unwrap().data, b.last().unwrap().data);
}
