//! Integration tests for optimize-job tracking.

use clipforge_core::{AssetId, JobConfig};
use clipforge_jobs::{
    JobError, JobNotice, JobPhase, JobPoller, JobState, JobStatusReport, RemoteStatus,
    ScriptedJobApi,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

#[tokio::test(start_paused = true)]
async fn recovered_transport_failures_keep_polling() {
    let api = Arc::new(ScriptedJobApi::new());
    api.push_failures(3)
        .push(Ok(JobStatusReport::running(RemoteStatus::Processing, 0.7)))
        .push(Ok(JobStatusReport::completed("https://cdn/a-opt.mp4")));
    let (poller, rx) = JobPoller::new(Arc::clone(&api), JobConfig::default());
    let asset = AssetId::from("a");

    poller.start(&asset, "videos/a.mp4").await.unwrap();
    sleep(Duration::from_secs(19)).await;
    assert_eq!(poller.job_state(&asset), Some(JobState::Polling));
    assert_eq!(poller.retry_count(&asset), Some(0));
    assert_eq!(poller.status(&asset), JobPhase::InProgress { progress: 0.7 });

    sleep(Duration::from_secs(3)).await;
    assert_eq!(poller.job_state(&asset), Some(JobState::Completed));
    let notices: Vec<_> = rx.try_iter().collect();
    assert!(notices.iter().all(|n| n.asset() == &asset));
    assert!(!notices.iter().any(JobNotice::is_error));
}

#[tokio::test(start_paused = true)]
async fn timeout_wins_over_pending_retries() {
    let api = Arc::new(ScriptedJobApi::new());
    api.push_failures(2);
    let config = JobConfig {
        timeout_ms: 10_000,
        ..JobConfig::default()
    };
    let (poller, rx) = JobPoller::new(Arc::clone(&api), config);
    let asset = AssetId::from("a");

    poller.start(&asset, "a").await.unwrap();
    // Failed checks at 0 s and 6 s; the one due at 12 s finds the job expired.
    sleep(Duration::from_secs(11)).await;
    assert_eq!(poller.retry_count(&asset), Some(2));

    sleep(Duration::from_secs(2)).await;
    assert_eq!(poller.job_state(&asset), Some(JobState::TimedOut));
    assert_eq!(api.status_calls(), 2);
    assert!(rx
        .try_iter()
        .any(|n| matches!(n, JobNotice::TimedOut { .. })));
}

#[tokio::test(start_paused = true)]
async fn nothing_lands_after_abort_all() {
    let api = Arc::new(ScriptedJobApi::new().with_latency(Duration::from_millis(200)));
    api.push(Ok(JobStatusReport::running(RemoteStatus::Pending, 0.0)))
        .push(Ok(JobStatusReport::running(RemoteStatus::Pending, 0.0)));
    for _ in 0..10 {
        api.push(Ok(JobStatusReport::completed("late")));
    }
    let (poller, rx) = JobPoller::new(Arc::clone(&api), JobConfig::default());
    let assets: Vec<AssetId> = ["a", "b"].into_iter().map(AssetId::from).collect();
    for asset in &assets {
        poller.start(asset, asset.as_str()).await.unwrap();
    }
    // The second job's first check is still in flight.
    sleep(Duration::from_millis(100)).await;
    let _ = rx.try_iter().count();

    assert_eq!(poller.abort_all(), 2);
    sleep(Duration::from_secs(600)).await;

    assert_eq!(rx.try_iter().count(), 0);
    assert_eq!(poller.live_count(), 0);
    for asset in &assets {
        assert_eq!(poller.status(asset), JobPhase::NotStarted);
        assert_eq!(poller.job_state(asset), Some(JobState::Aborted));
    }
}

#[tokio::test(start_paused = true)]
async fn duplicate_start_leaves_first_job_alone() {
    let api = Arc::new(ScriptedJobApi::new().with_latency(Duration::from_secs(1)));
    let (poller, _rx) = JobPoller::new(Arc::clone(&api), JobConfig::default());
    let poller = Arc::new(poller);
    let asset = AssetId::from("a");

    let first = {
        let poller = Arc::clone(&poller);
        let asset = asset.clone();
        tokio::spawn(async move { poller.start(&asset, "a").await })
    };
    sleep(Duration::from_millis(10)).await;

    // The first start is still waiting for its task id.
    let err = poller.start(&asset, "a").await.unwrap_err();
    assert_eq!(err, JobError::AlreadyInProgress { asset: asset.clone() });

    let task = first.await.unwrap().unwrap();
    assert_eq!(poller.live_count(), 1);
    assert_eq!(poller.task_id(&asset), Some(task));
    assert_eq!(api.jobs_started(), 1);
}

#[tokio::test(start_paused = true)]
async fn deletion_refused_until_job_finishes() {
    let api = Arc::new(ScriptedJobApi::new());
    api.push(Ok(JobStatusReport::running(RemoteStatus::Pending, 0.0)))
        .push(Ok(JobStatusReport::failed(Some("codec not supported"))));
    let (poller, rx) = JobPoller::new(Arc::clone(&api), JobConfig::default());
    let asset = AssetId::from("a");

    poller.start(&asset, "a").await.unwrap();
    assert!(matches!(
        poller.ensure_deletable(&asset),
        Err(JobError::AssetBusy { .. })
    ));
    assert!(rx
        .try_iter()
        .any(|n| matches!(n, JobNotice::AssetBusy { .. })));

    sleep(Duration::from_secs(4)).await;
    assert_eq!(
        poller.status(&asset),
        JobPhase::Failed {
            reason: "codec not supported".into()
        }
    );
    assert!(poller.ensure_deletable(&asset).is_ok());
    poller.forget(&asset);
    assert_eq!(poller.status(&asset), JobPhase::NotStarted);
    assert_eq!(poller.job_state(&asset), None);
}
