//! ClipForge Jobs - Remote optimize-job tracking
//!
//! Submits long-running optimize jobs to a remote service and follows
//! them to completion without blocking the caller:
//! - `JobApi`: the remote service contract and its status records
//! - `JobPoller`: one polling task per asset with retry, timeout and abort
//! - `JobNotice`: user-visible notices delivered over a channel

pub mod api;
pub mod error;
pub mod notice;
pub mod poller;
pub mod scripted;

pub use api::{JobApi, JobStatusReport, RemoteStatus, TaskId};
pub use error::{JobError, Result};
pub use notice::JobNotice;
pub use poller::{JobPhase, JobPoller, JobState};
pub use scripted::ScriptedJobApi;
