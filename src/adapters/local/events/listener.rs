use super::hub::EventHub;
use crate::domain::events::JobEvent;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Spawns a task that logs every job event published on `event_hub`.
pub fn start(event_hub: Arc<EventHub>) -> JoinHandle<()> {
    let mut rx = event_hub.subscribe();

    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event listener lagged behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn log_event(event: &JobEvent) {
    match event {
        JobEvent::JobStarted { job_id, renditions } => {
            info!(%job_id, renditions, "Job started");
        }
        JobEvent::RenditionStarted { job_id, height } => {
            info!(%job_id, height, "Rendition started");
        }
        JobEvent::RenditionFinished { job_id, height } => {
            info!(%job_id, height, "Rendition finished");
        }
        JobEvent::RenditionFailed {
            job_id,
            height,
            reason,
        } => {
            error!(%job_id, height, %reason, "Rendition failed");
        }
        JobEvent::JobCompleted {
            job_id,
            job_dir,
            elapsed_seconds,
        } => {
            info!(%job_id, dir = %job_dir.display(), elapsed_seconds, "Job completed");
        }
        JobEvent::JobFailed { job_id, reason } => {
            error!(job_id = job_id.as_deref().unwrap_or("-"), %reason, "Job failed");
        }
    }
}
