//! Error types for the transcode pipeline.

use std::io;

/// Everything that can make a transcode job fail.
///
/// The orchestrator turns any of these into the failure outcome of a job;
/// callers that only care about success can collapse it with
/// [`crate::application::orchestrator::TranscodeOrchestrator::run_or_none`].
#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    /// The source file or URL cannot be read by the encoding engine.
    #[error("input unavailable: {0}")]
    InputUnavailable(String),

    /// The engine reported a fatal error for one rendition.
    #[error("encode failed for {height}p: {reason}")]
    EncodeFailure { height: u32, reason: String },

    /// The engine did not finish a rendition in time.
    #[error("encode for {height}p timed out after {seconds}s")]
    Timeout { height: u32, seconds: u64 },

    /// Directory or file creation/write failure.
    #[error("filesystem error: {0}")]
    Filesystem(#[from] io::Error),

    /// Resolutions and bandwidths do not form a usable ladder.
    #[error("invalid rendition ladder: {0}")]
    InvalidLadder(String),
}

impl TranscodeError {
    pub fn encode<S: Into<String>>(height: u32, reason: S) -> Self {
        Self::EncodeFailure {
            height,
            reason: reason.into(),
        }
    }

    pub fn invalid_ladder<S: Into<String>>(msg: S) -> Self {
        Self::InvalidLadder(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, TranscodeError>;
