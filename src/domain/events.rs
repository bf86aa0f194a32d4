use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Lifecycle of a job as seen by the orchestrator.
///
/// Every `RenditionStarted` is followed by exactly one of `RenditionFinished`
/// or `RenditionFailed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JobEvent {
    JobStarted {
        job_id: String,
        renditions: usize,
    },
    RenditionStarted {
        job_id: String,
        height: u32,
    },
    RenditionFinished {
        job_id: String,
        height: u32,
    },
    RenditionFailed {
        job_id: String,
        height: u32,
        reason: String,
    },
    JobCompleted {
        job_id: String,
        job_dir: PathBuf,
        elapsed_seconds: u64,
    },
    JobFailed {
        job_id: Option<String>,
        reason: String,
    },
}

impl JobEvent {
    pub fn job_id(&self) -> Option<&str> {
        match self {
            JobEvent::JobStarted { job_id, .. }
            | JobEvent::RenditionStarted { job_id, .. }
            | JobEvent::RenditionFinished { job_id, .. }
            | JobEvent::RenditionFailed { job_id, .. }
            | JobEvent::JobCompleted { job_id, .. } => Some(job_id),
            JobEvent::JobFailed { job_id, .. } => job_id.as_deref(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobEvent::JobCompleted { .. } | JobEvent::JobFailed { .. })
    }
}
