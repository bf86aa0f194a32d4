//! hls-ladder - Multi-rendition HLS transcoding
//!
//! Hexagonal Architecture:
//! - domain/: Pure business logic (ladder, jobs, events, ids, master playlist)
//! - ports/: Trait definitions
//! - adapters/: Concrete implementations (ffmpeg, filesystem, HTTP)
//! - application/: Orchestration services
//! - config: Environment configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;

// Re-exports for convenience
pub use adapters::ffmpeg::FfmpegEncoder;
pub use application::{StreamLibrary, TranscodeOrchestrator};
pub use config::AppConfig;
pub use domain::jobs::{CompletedJob, InputSource, RenditionLadder, RenditionSpec};
pub use error::TranscodeError;

use adapters::local::http::AppState;
use std::sync::Arc;

/// Orchestrator configured from `config`, publishing to `event_hub`.
pub fn orchestrator_from_config(
    config: &AppConfig,
    event_hub: Arc<adapters::local::EventHub>,
) -> TranscodeOrchestrator<FfmpegEncoder> {
    let encoder =
        FfmpegEncoder::from_command_line(&config.ffmpeg_bin).with_timeout(config.rendition_timeout);
    TranscodeOrchestrator::new(encoder)
        .with_events(event_hub)
        .with_cleanup_on_failure(config.cleanup_failed_jobs)
}

/// HTTP state for the server binary.
pub fn app_state(
    config: &AppConfig,
    event_hub: Arc<adapters::local::EventHub>,
) -> AppState<FfmpegEncoder> {
    let library = StreamLibrary::new(
        orchestrator_from_config(config, event_hub),
        &config.streams_dir,
    )
    .with_keep(config.keep_jobs)
    .with_ladder(config.ladder.clone())
    .with_max_concurrent_jobs(config.max_concurrent_jobs);

    AppState {
        library,
        upload_dir: config.upload_dir.clone(),
        public_dir: config.public_dir.clone(),
        max_upload_bytes: config.max_upload_bytes,
    }
}

/// `RUST_LOG`-driven fmt subscriber, `info` by default.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
