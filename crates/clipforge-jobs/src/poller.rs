//! Optimize-job poller.
//!
//! One live job per asset. Each job is a tokio task that checks the
//! remote status on a fixed cadence, retries transport failures with a
//! longer delay, and gives up after a wall-clock ceiling. The task's
//! `JoinHandle` is its cancellation token: aborting sets the job's
//! `aborted` flag, cancels the task, and removes the registry entry, in
//! that order and under the registry lock. Every continuation re-checks
//! the flag and its registry entry before touching state, so nothing a
//! cancelled job does can land after the abort returns.

use crate::api::{JobApi, JobStatusReport, RemoteStatus, TaskId};
use crate::error::{JobError, Result};
use crate::notice::{JobNotice, NoticeSink};
use clipforge_core::{AssetId, JobConfig};
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Lifecycle of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Reserved; waiting for the service to hand out a task id.
    Created,
    Polling,
    Completed,
    Failed,
    TimedOut,
    Aborted,
}

impl JobState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Created | Self::Polling)
    }
}

/// Job status as shown next to an asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum JobPhase {
    NotStarted,
    InProgress { progress: f64 },
    Succeeded { output_url: Option<String> },
    Failed { reason: String },
}

impl JobPhase {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::InProgress { .. })
    }
}

// ── Registry ───────────────────────────────────────────────────

struct LiveJob {
    generation: u64,
    state: JobState,
    task: Option<TaskId>,
    started_at: Instant,
    retry_count: u32,
    progress: f64,
    aborted: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl LiveJob {
    /// Flag, cancel. The caller removes the entry afterwards.
    fn cancel(&mut self) {
        self.aborted.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[derive(Default)]
struct Registry {
    live: HashMap<AssetId, LiveJob>,
    /// Last outcome per asset. Cleared only by `JobPoller::forget`.
    finished: HashMap<AssetId, (JobState, JobPhase)>,
    next_generation: u64,
}

impl Registry {
    /// The live entry for `asset`, if it still belongs to `generation`
    /// and has not been aborted.
    fn current_mut(&mut self, asset: &AssetId, generation: u64) -> Option<&mut LiveJob> {
        self.live
            .get_mut(asset)
            .filter(|job| job.generation == generation && !job.aborted.load(Ordering::SeqCst))
    }

    /// Terminal teardown: drop the live entry and record the outcome.
    fn finish(&mut self, asset: &AssetId, state: JobState, phase: JobPhase) {
        self.live.remove(asset);
        self.finished.insert(asset.clone(), (state, phase));
    }
}

type SharedRegistry = Arc<Mutex<Registry>>;

/// Releases a start reservation if `start` is dropped or fails before
/// the polling task exists.
struct Reservation<'a> {
    registry: &'a Mutex<Registry>,
    asset: &'a AssetId,
    generation: u64,
    armed: bool,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut reg = self.registry.lock();
        if reg
            .live
            .get(self.asset)
            .is_some_and(|job| job.generation == self.generation)
        {
            reg.live.remove(self.asset);
        }
    }
}

// ── Poller ─────────────────────────────────────────────────────

/// Tracks remote optimize jobs, at most one per asset.
pub struct JobPoller<A> {
    api: Arc<A>,
    config: JobConfig,
    registry: SharedRegistry,
    notices: NoticeSink,
}

impl<A: JobApi> JobPoller<A> {
    /// Create a poller and the receiver its notices arrive on.
    pub fn new(api: Arc<A>, config: JobConfig) -> (Self, Receiver<JobNotice>) {
        let (notices, rx) = NoticeSink::channel();
        let poller = Self {
            api,
            config,
            registry: Arc::new(Mutex::new(Registry::default())),
            notices,
        };
        (poller, rx)
    }

    /// Start optimizing `asset`.
    ///
    /// The asset is reserved before the service is contacted, so a second
    /// request for the same asset is rejected with no state change even
    /// while the first is still waiting for its task id.
    pub async fn start(&self, asset: &AssetId, resource: &str) -> Result<TaskId> {
        let generation = {
            let mut reg = self.registry.lock();
            if reg.live.contains_key(asset) {
                drop(reg);
                warn!(asset = %asset, "Optimization already in progress");
                self.notices.send(JobNotice::AlreadyInProgress {
                    asset: asset.clone(),
                });
                return Err(JobError::AlreadyInProgress {
                    asset: asset.clone(),
                });
            }
            reg.next_generation += 1;
            let generation = reg.next_generation;
            reg.finished.remove(asset);
            reg.live.insert(
                asset.clone(),
                LiveJob {
                    generation,
                    state: JobState::Created,
                    task: None,
                    started_at: Instant::now(),
                    retry_count: 0,
                    progress: 0.0,
                    aborted: Arc::new(AtomicBool::new(false)),
                    handle: None,
                },
            );
            generation
        };
        let mut reservation = Reservation {
            registry: &self.registry,
            asset,
            generation,
            armed: true,
        };

        let task = match self.api.start_job(resource).await {
            Ok(task) => task,
            Err(e) => {
                warn!(asset = %asset, "Failed to start optimization: {}", e);
                drop(reservation);
                self.notices.send(JobNotice::Failed {
                    asset: asset.clone(),
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };

        let mut reg = self.registry.lock();
        let Some(job) = reg.current_mut(asset, generation) else {
            // Aborted while the start request was in flight.
            reservation.armed = false;
            debug!(asset = %asset, task = %task, "Start finished after abort");
            return Err(JobError::Aborted);
        };
        job.state = JobState::Polling;
        job.task = Some(task.clone());
        let worker = JobWorker {
            api: Arc::clone(&self.api),
            registry: Arc::clone(&self.registry),
            notices: self.notices.clone(),
            config: self.config.clone(),
            asset: asset.clone(),
            task: task.clone(),
            generation,
            started_at: job.started_at,
            aborted: Arc::clone(&job.aborted),
        };
        job.handle = Some(tokio::spawn(worker.run()));
        reservation.armed = false;
        drop(reg);

        info!(asset = %asset, task = %task, "Optimization started");
        self.notices.send(JobNotice::Started {
            asset: asset.clone(),
            task: task.clone(),
        });
        Ok(task)
    }
}

impl<A> JobPoller<A> {
    /// Abort the live job for `asset`. Returns whether there was one.
    pub fn abort(&self, asset: &AssetId) -> bool {
        let mut reg = self.registry.lock();
        let Some(job) = reg.live.get_mut(asset) else {
            return false;
        };
        job.cancel();
        reg.finish(asset, JobState::Aborted, JobPhase::NotStarted);
        info!(asset = %asset, "Optimization aborted");
        true
    }

    /// Abort every live job. On return no job callback can run again.
    pub fn abort_all(&self) -> usize {
        let mut reg = self.registry.lock();
        for job in reg.live.values_mut() {
            job.cancel();
        }
        let aborted: Vec<AssetId> = reg.live.keys().cloned().collect();
        let count = aborted.len();
        for asset in &aborted {
            reg.finish(asset, JobState::Aborted, JobPhase::NotStarted);
        }
        if count > 0 {
            info!(count, "Aborted all optimizations");
        }
        count
    }

    /// Status for display next to `asset`. Aborted jobs read as not started.
    pub fn status(&self, asset: &AssetId) -> JobPhase {
        let reg = self.registry.lock();
        if let Some(job) = reg.live.get(asset) {
            return JobPhase::InProgress {
                progress: job.progress,
            };
        }
        reg.finished
            .get(asset)
            .map(|(_, phase)| phase.clone())
            .unwrap_or(JobPhase::NotStarted)
    }

    /// Lifecycle state of the latest job for `asset`, live or finished.
    pub fn job_state(&self, asset: &AssetId) -> Option<JobState> {
        let reg = self.registry.lock();
        reg.live
            .get(asset)
            .map(|job| job.state)
            .or_else(|| reg.finished.get(asset).map(|(state, _)| *state))
    }

    pub fn is_optimizing(&self, asset: &AssetId) -> bool {
        self.registry.lock().live.contains_key(asset)
    }

    /// Refuse deletion of an asset that is being optimized.
    pub fn ensure_deletable(&self, asset: &AssetId) -> Result<()> {
        if !self.is_optimizing(asset) {
            return Ok(());
        }
        warn!(asset = %asset, "Refusing to delete asset while optimizing");
        self.notices.send(JobNotice::AssetBusy {
            asset: asset.clone(),
        });
        Err(JobError::AssetBusy {
            asset: asset.clone(),
        })
    }

    /// Forget the finished status of a deleted asset.
    ///
    /// Finished statuses are kept until this is called, so callers must
    /// call it whenever an asset leaves the library.
    pub fn forget(&self, asset: &AssetId) {
        self.registry.lock().finished.remove(asset);
    }

    pub fn live_count(&self) -> usize {
        self.registry.lock().live.len()
    }

    /// Consecutive failed status queries of the live job for `asset`.
    pub fn retry_count(&self, asset: &AssetId) -> Option<u32> {
        self.registry.lock().live.get(asset).map(|job| job.retry_count)
    }

    /// Task id of the live job for `asset`.
    pub fn task_id(&self, asset: &AssetId) -> Option<TaskId> {
        self.registry.lock().live.get(asset).and_then(|job| job.task.clone())
    }
}

impl<A> Drop for JobPoller<A> {
    fn drop(&mut self) {
        self.abort_all();
    }
}

// ── Worker ─────────────────────────────────────────────────────

/// What a single status check decided.
enum Step {
    Next(Duration),
    Done,
}

struct JobWorker<A> {
    api: Arc<A>,
    registry: SharedRegistry,
    notices: NoticeSink,
    config: JobConfig,
    asset: AssetId,
    task: TaskId,
    generation: u64,
    started_at: Instant,
    aborted: Arc<AtomicBool>,
}

impl<A: JobApi> JobWorker<A> {
    async fn run(self) {
        let mut delay = Duration::ZERO;
        loop {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if self.aborted.load(Ordering::SeqCst) {
                return;
            }
            if !self.check_timeout() {
                return;
            }
            let response = self.api.job_status(&self.task).await;
            match self.apply(response) {
                Step::Next(next) => delay = next,
                Step::Done => return,
            }
        }
    }

    /// Returns `false` when the job is gone or just timed out.
    fn check_timeout(&self) -> bool {
        let mut reg = self.registry.lock();
        if reg.current_mut(&self.asset, self.generation).is_none() {
            return false;
        }
        let elapsed = self.started_at.elapsed();
        if elapsed <= self.config.timeout() {
            return true;
        }
        reg.finish(
            &self.asset,
            JobState::TimedOut,
            JobPhase::Failed {
                reason: JobError::TimedOut {
                    elapsed_ms: elapsed.as_millis() as u64,
                }
                .to_string(),
            },
        );
        drop(reg);
        warn!(asset = %self.asset, task = %self.task, elapsed_ms = elapsed.as_millis() as u64, "Optimization timed out");
        self.notices.send(JobNotice::TimedOut {
            asset: self.asset.clone(),
        });
        false
    }

    fn apply(&self, response: Result<JobStatusReport>) -> Step {
        let mut reg = self.registry.lock();
        let Some(job) = reg.current_mut(&self.asset, self.generation) else {
            return Step::Done;
        };

        let report = match response {
            Ok(report) => report,
            Err(e) if job.retry_count < self.config.max_retries => {
                job.retry_count += 1;
                warn!(
                    asset = %self.asset,
                    task = %self.task,
                    retry = job.retry_count,
                    "Status query failed, retrying: {}", e
                );
                return Step::Next(self.config.retry_interval());
            }
            Err(e) => {
                reg.finish(
                    &self.asset,
                    JobState::Failed,
                    JobPhase::Failed {
                        reason: "status query failed".into(),
                    },
                );
                drop(reg);
                warn!(asset = %self.asset, task = %self.task, "Giving up on status queries: {}", e);
                self.notices.send(JobNotice::Failed {
                    asset: self.asset.clone(),
                    reason: "status query failed".into(),
                });
                return Step::Done;
            }
        };

        match report.status {
            RemoteStatus::Pending | RemoteStatus::Processing => {
                job.retry_count = 0;
                job.progress = report.progress.clamp(0.0, 1.0);
                let progress = job.progress;
                drop(reg);
                debug!(asset = %self.asset, status = %report.status, progress, "Job still running");
                self.notices.send(JobNotice::Progress {
                    asset: self.asset.clone(),
                    progress,
                    message: report.message,
                });
                Step::Next(self.config.poll_interval())
            }
            RemoteStatus::Completed => {
                reg.finish(
                    &self.asset,
                    JobState::Completed,
                    JobPhase::Succeeded {
                        output_url: report.output_url.clone(),
                    },
                );
                drop(reg);
                info!(asset = %self.asset, task = %self.task, "Optimization completed");
                self.notices.send(JobNotice::Completed {
                    asset: self.asset.clone(),
                    output_url: report.output_url,
                });
                Step::Done
            }
            RemoteStatus::Failed | RemoteStatus::Cancelled => {
                let reason = report.failure_reason();
                reg.finish(
                    &self.asset,
                    JobState::Failed,
                    JobPhase::Failed {
                        reason: reason.clone(),
                    },
                );
                drop(reg);
                warn!(asset = %self.asset, task = %self.task, reason = %reason, "Optimization failed");
                self.notices.send(JobNotice::Failed {
                    asset: self.asset.clone(),
                    reason,
                });
                Step::Done
            }
        }
    }
}
