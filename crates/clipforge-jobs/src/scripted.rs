//! Scriptable in-memory job service for tests and demos.

use crate::api::{JobApi, JobStatusReport, RemoteStatus, TaskId};
use crate::error::{JobError, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Job service that answers status queries from a queue of scripted
/// responses. Once the queue runs dry every query reports `pending`.
#[derive(Debug, Default)]
pub struct ScriptedJobApi {
    responses: Mutex<VecDeque<Result<JobStatusReport>>>,
    start_failure: Mutex<Option<JobError>>,
    latency: Duration,
    started: AtomicUsize,
    status_calls: AtomicUsize,
}

impl ScriptedJobApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every answer by `latency` (virtual time under tokio test-util).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queue one status answer.
    pub fn push(&self, response: Result<JobStatusReport>) -> &Self {
        self.responses.lock().push_back(response);
        self
    }

    /// Queue `count` transport failures.
    pub fn push_failures(&self, count: usize) -> &Self {
        let mut responses = self.responses.lock();
        for _ in 0..count {
            responses.push_back(Err(JobError::Transport("connection reset".into())));
        }
        drop(responses);
        self
    }

    /// Make the next `start_job` call fail.
    pub fn fail_next_start(&self, error: JobError) {
        *self.start_failure.lock() = Some(error);
    }

    /// Number of status queries answered so far.
    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    /// Number of jobs started so far.
    pub fn jobs_started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    async fn wait(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl JobApi for ScriptedJobApi {
    async fn start_job(&self, resource: &str) -> Result<TaskId> {
        self.wait().await;
        if let Some(error) = self.start_failure.lock().take() {
            return Err(error);
        }
        let n = self.started.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TaskId::new(format!("task-{n}-{resource}")))
    }

    async fn job_status(&self, _task: &TaskId) -> Result<JobStatusReport> {
        self.wait().await;
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(JobStatusReport::running(RemoteStatus::Pending, 0.0)))
    }
}
