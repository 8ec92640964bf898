//! User-visible notices emitted by the job poller.

use crate::api::TaskId;
use clipforge_core::AssetId;
use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;

/// Something the UI should tell the user about a job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobNotice {
    Started {
        asset: AssetId,
        task: TaskId,
    },
    Progress {
        asset: AssetId,
        progress: f64,
        message: Option<String>,
    },
    Completed {
        asset: AssetId,
        output_url: Option<String>,
    },
    Failed {
        asset: AssetId,
        reason: String,
    },
    TimedOut {
        asset: AssetId,
    },
    /// A second start was requested while one is live.
    AlreadyInProgress {
        asset: AssetId,
    },
    /// Deletion was requested while the asset is being optimized.
    AssetBusy {
        asset: AssetId,
    },
}

impl JobNotice {
    pub fn asset(&self) -> &AssetId {
        match self {
            Self::Started { asset, .. }
            | Self::Progress { asset, .. }
            | Self::Completed { asset, .. }
            | Self::Failed { asset, .. }
            | Self::TimedOut { asset }
            | Self::AlreadyInProgress { asset }
            | Self::AssetBusy { asset } => asset,
        }
    }

    /// Whether the notice reports a problem rather than progress.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::Failed { .. } | Self::TimedOut { .. } | Self::AlreadyInProgress { .. } | Self::AssetBusy { .. }
        )
    }
}

/// Sending half handed to the poller and its tasks.
#[derive(Debug, Clone)]
pub(crate) struct NoticeSink {
    tx: Sender<JobNotice>,
}

impl NoticeSink {
    pub(crate) fn channel() -> (Self, Receiver<JobNotice>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }

    /// Deliver a notice. Nobody listening is fine.
    pub(crate) fn send(&self, notice: JobNotice) {
        let _ = self.tx.send(notice);
    }
}
