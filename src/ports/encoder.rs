use crate::domain::jobs::InputSource;
use crate::error::TranscodeError;
use async_trait::async_trait;
use std::path::Path;

/// Drives the encoding engine for a single rendition.
///
/// An implementation resolves exactly once per call: `Ok(())` when the engine
/// finished normally, `Err` for anything else. On success `output_dir` holds
/// the segment files and an `output.m3u8` rendition playlist.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RenditionEncoder: Send + Sync {
    async fn encode(
        &self,
        input: &InputSource,
        height: u32,
        output_dir: &Path,
    ) -> Result<(), TranscodeError>;
}
