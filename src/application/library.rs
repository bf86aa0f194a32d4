use super::orchestrator::{ActiveJobs, TranscodeOrchestrator};
use crate::adapters::local::retention;
use crate::domain::jobs::{CompletedJob, InputSource, RenditionLadder, MASTER_PLAYLIST};
use crate::error::TranscodeError;
use crate::ports::encoder::RenditionEncoder;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// The shared output root: prunes old jobs, then runs new ones into it.
pub struct StreamLibrary<E> {
    orchestrator: TranscodeOrchestrator<E>,
    streams_dir: PathBuf,
    keep: usize,
    ladder: RenditionLadder,
    permits: Option<Arc<Semaphore>>,
}

impl<E> StreamLibrary<E>
where
    E: RenditionEncoder,
{
    pub fn new(orchestrator: TranscodeOrchestrator<E>, streams_dir: impl Into<PathBuf>) -> Self {
        Self {
            orchestrator,
            streams_dir: streams_dir.into(),
            keep: retention::DEFAULT_KEEP,
            ladder: RenditionLadder::default(),
            permits: None,
        }
    }

    pub fn with_keep(mut self, keep: usize) -> Self {
        self.keep = keep;
        self
    }

    pub fn with_ladder(mut self, ladder: RenditionLadder) -> Self {
        self.ladder = ladder;
        self
    }

    /// Caps how many jobs may run at once; `None` leaves it unbounded.
    pub fn with_max_concurrent_jobs(mut self, limit: Option<usize>) -> Self {
        self.permits = limit.map(|n| Arc::new(Semaphore::new(n.max(1))));
        self
    }

    pub fn streams_dir(&self) -> &Path {
        &self.streams_dir
    }

    pub fn ladder(&self) -> &RenditionLadder {
        &self.ladder
    }

    /// Prunes the output root down to the retention count. Directories of running jobs are kept.
    pub async fn prune(&self) -> Result<Vec<PathBuf>, TranscodeError> {
        let dir = self.streams_dir.clone();
        let keep = self.keep;
        let active: ActiveJobs = self.orchestrator.active_jobs();

        let removed = tokio::task::spawn_blocking(move || {
            retention::prune_except(&dir, keep, |name| {
                name.to_str().map_or(false, |name| active.contains(name))
            })
        })
        .await
        .map_err(|e| TranscodeError::Filesystem(std::io::Error::other(e)))??;
        Ok(removed)
    }

    /// Prunes, then transcodes `input` with the library's ladder.
    pub async fn submit(&self, input: &InputSource) -> Result<CompletedJob, TranscodeError> {
        // The semaphore is never closed, so acquiring only waits.
        let _permit = match &self.permits {
            Some(permits) => permits.acquire().await.ok(),
            None => None,
        };

        match self.prune().await {
            Ok(removed) if !removed.is_empty() => {
                debug!(count = removed.len(), "Pruned old jobs before transcoding");
            }
            Ok(_) => {}
            Err(e) => warn!("Could not prune {}: {}", self.streams_dir.display(), e),
        }

        self.orchestrator
            .run(input, &self.streams_dir, &self.ladder)
            .await
    }
}

/// URL path of a job's master playlist under the `/streams` mount.
pub fn playlist_url(job: &CompletedJob) -> String {
    format!("/streams/{}/{}", job.job_id, MASTER_PLAYLIST)
}
