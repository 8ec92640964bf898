//! Remote job service contract.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

/// Identifier the job service assigns to a started task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Task status as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl RemoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// No further updates will follow.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for RemoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One status record from the job service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobStatusReport {
    pub status: RemoteStatus,
    /// Fraction complete, 0 to 1.
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub output_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobStatusReport {
    /// A non-terminal report.
    pub fn running(status: RemoteStatus, progress: f64) -> Self {
        Self {
            status,
            progress,
            ..Default::default()
        }
    }

    pub fn completed(output_url: impl Into<String>) -> Self {
        Self {
            status: RemoteStatus::Completed,
            progress: 1.0,
            output_url: Some(output_url.into()),
            ..Default::default()
        }
    }

    pub fn failed(error: Option<&str>) -> Self {
        Self {
            status: RemoteStatus::Failed,
            error: error.map(str::to_string),
            ..Default::default()
        }
    }

    /// Parse a status body returned by the service.
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Failure reason for a terminal non-success report.
    pub fn failure_reason(&self) -> String {
        match self.status {
            RemoteStatus::Cancelled => "cancelled".to_string(),
            _ => self
                .error
                .clone()
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

/// Operations the poller needs from the remote job service.
pub trait JobApi: Send + Sync + 'static {
    /// Submit an optimize job for `resource` and return its task id.
    fn start_job(&self, resource: &str) -> impl Future<Output = Result<TaskId>> + Send;

    /// Fetch the current status of `task`.
    fn job_status(&self, task: &TaskId) -> impl Future<Output = Result<JobStatusReport>> + Send;
}
