use crate::adapters::local::events::EventHub;
use crate::adapters::local::fs::JobWorkspace;
use crate::domain::events::JobEvent;
use crate::domain::hls::MasterPlaylist;
use crate::domain::id;
use crate::domain::jobs::{CompletedJob, InputSource, RenditionLadder, RenditionResult};
use crate::error::TranscodeError;
use crate::ports::encoder::RenditionEncoder;
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::{error, info, warn};

/// Ids of jobs whose directories are still being written.
#[derive(Debug, Clone, Default)]
pub struct ActiveJobs {
    ids: Arc<Mutex<HashSet<String>>>,
}

impl ActiveJobs {
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.ids.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.lock().contains(job_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Ids reserved by one run; released when the run ends, however it ends.
struct Reservation<'a> {
    active: &'a ActiveJobs,
    ids: Vec<String>,
}

impl<'a> Reservation<'a> {
    fn new(active: &'a ActiveJobs) -> Self {
        Self {
            active,
            ids: Vec::new(),
        }
    }

    fn reserve(&mut self) -> String {
        let job_id = id::job_id();
        self.active.lock().insert(job_id.clone());
        self.ids.push(job_id.clone());
        job_id
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        let mut active = self.active.lock();
        for job_id in &self.ids {
            active.remove(job_id);
        }
    }
}

/// Runs one job: every rendition of the ladder, one after the other, then the master playlist.
pub struct TranscodeOrchestrator<E> {
    encoder: E,
    events: Option<Arc<EventHub>>,
    active: ActiveJobs,
    cleanup_failed: bool,
}

impl<E> TranscodeOrchestrator<E>
where
    E: RenditionEncoder,
{
    pub fn new(encoder: E) -> Self {
        Self {
            encoder,
            events: None,
            active: ActiveJobs::default(),
            cleanup_failed: false,
        }
    }

    pub fn with_events(mut self, event_hub: Arc<EventHub>) -> Self {
        self.events = Some(event_hub);
        self
    }

    /// Remove the job directory of a failed job instead of leaving partial renditions behind.
    pub fn with_cleanup_on_failure(mut self, cleanup: bool) -> Self {
        self.cleanup_failed = cleanup;
        self
    }

    pub fn active_jobs(&self) -> ActiveJobs {
        self.active.clone()
    }

    fn publish(&self, event: JobEvent) {
        if let Some(hub) = &self.events {
            hub.publish(event);
        }
    }

    /// Transcodes `input` into a new job directory under `output_root`.
    ///
    /// The error, if any, is already logged; the first failing rendition
    /// stops the job and no master playlist is written.
    pub async fn run(
        &self,
        input: &InputSource,
        output_root: &Path,
        ladder: &RenditionLadder,
    ) -> Result<CompletedJob, TranscodeError> {
        let started = Instant::now();
        let mut reservation = Reservation::new(&self.active);

        let workspace = match JobWorkspace::create_with(output_root, || reservation.reserve()).await {
            Ok(workspace) => workspace,
            Err(e) => {
                let err = TranscodeError::from(e);
                error!(root = %output_root.display(), "Could not create job directory: {}", err);
                self.publish(JobEvent::JobFailed {
                    job_id: None,
                    reason: err.to_string(),
                });
                return Err(err);
            }
        };
        info!(job_id = workspace.job_id(), input = %input, "Transcoding into {}", workspace.dir().display());

        match self.execute(&workspace, input, ladder, started).await {
            Ok(job) => {
                info!(
                    job_id = %job.job_id,
                    "Time taken to compress: {} seconds",
                    job.elapsed_seconds
                );
                self.publish(JobEvent::JobCompleted {
                    job_id: job.job_id.clone(),
                    job_dir: job.job_dir.clone(),
                    elapsed_seconds: job.elapsed_seconds,
                });
                Ok(job)
            }
            Err(err) => {
                error!(job_id = workspace.job_id(), "Transcode failed: {}", err);
                self.publish(JobEvent::JobFailed {
                    job_id: Some(workspace.job_id().to_string()),
                    reason: err.to_string(),
                });
                if self.cleanup_failed {
                    if let Err(e) = workspace.remove().await {
                        warn!(job_id = workspace.job_id(), "Could not remove failed job: {}", e);
                    }
                }
                Err(err)
            }
        }
    }

    /// Same as [`run`](Self::run) with the ladder given as two index-aligned lists.
    pub async fn run_with_lists(
        &self,
        input: &InputSource,
        output_root: &Path,
        resolutions: &[u32],
        bandwidths: &[u64],
    ) -> Result<CompletedJob, TranscodeError> {
        let ladder = match RenditionLadder::from_lists(resolutions, bandwidths) {
            Ok(ladder) => ladder,
            Err(err) => {
                error!("Rejected transcode request: {}", err);
                self.publish(JobEvent::JobFailed {
                    job_id: None,
                    reason: err.to_string(),
                });
                return Err(err);
            }
        };
        self.run(input, output_root, &ladder).await
    }

    /// Success or nothing; the cause only shows up in the logs.
    pub async fn run_or_none(
        &self,
        input: &InputSource,
        output_root: &Path,
        ladder: &RenditionLadder,
    ) -> Option<CompletedJob> {
        self.run(input, output_root, ladder).await.ok()
    }

    async fn execute(
        &self,
        workspace: &JobWorkspace,
        input: &InputSource,
        ladder: &RenditionLadder,
        started: Instant,
    ) -> Result<CompletedJob, TranscodeError> {
        let job_id = workspace.job_id().to_string();
        self.publish(JobEvent::JobStarted {
            job_id: job_id.clone(),
            renditions: ladder.len(),
        });

        let mut renditions = Vec::with_capacity(ladder.len());
        for spec in ladder.iter() {
            let output_dir = workspace.create_rendition_dir(spec).await?;
            let playlist = workspace.rendition_playlist(spec);

            self.publish(JobEvent::RenditionStarted {
                job_id: job_id.clone(),
                height: spec.height,
            });
            let mut outcome = self.encoder.encode(input, spec.height, &output_dir).await;
            if outcome.is_ok() && !tokio::fs::try_exists(&playlist).await.unwrap_or(false) {
                outcome = Err(TranscodeError::encode(
                    spec.height,
                    "engine produced no rendition playlist",
                ));
            }

            match outcome {
                Ok(()) => {
                    self.publish(JobEvent::RenditionFinished {
                        job_id: job_id.clone(),
                        height: spec.height,
                    });
                    renditions.push(RenditionResult {
                        height: spec.height,
                        output_dir,
                        playlist,
                    });
                }
                Err(err) => {
                    self.publish(JobEvent::RenditionFailed {
                        job_id: job_id.clone(),
                        height: spec.height,
                        reason: err.to_string(),
                    });
                    return Err(err);
                }
            }
        }

        let elapsed_seconds = started.elapsed().as_secs();
        let master = MasterPlaylist::from_renditions(ladder.iter());
        let master_playlist = workspace.write_master(&master).await?;

        Ok(CompletedJob {
            job_id,
            job_dir: workspace.dir().to_path_buf(),
            master_playlist,
            elapsed_seconds,
            renditions,
        })
    }
}
