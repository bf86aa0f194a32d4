#![allow(dead_code)]

use async_trait::async_trait;
use hls_ladder::domain::jobs::{InputSource, RENDITION_PLAYLIST};
use hls_ladder::ports::RenditionEncoder;
use hls_ladder::TranscodeError;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Encoder double that writes a one-segment rendition instead of running an engine.
#[derive(Clone, Default)]
pub struct FakeEncoder {
    pub calls: Arc<Mutex<Vec<u32>>>,
    pub inputs_seen: Arc<Mutex<Vec<bool>>>,
    pub fail_at: Option<u32>,
}

impl FakeEncoder {
    pub fn failing_at(height: u32) -> Self {
        Self {
            fail_at: Some(height),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RenditionEncoder for FakeEncoder {
    async fn encode(
        &self,
        input: &InputSource,
        height: u32,
        output_dir: &Path,
    ) -> Result<(), TranscodeError> {
        self.calls.lock().unwrap().push(height);
        let readable = match input {
            InputSource::Local(path) => path.exists(),
            InputSource::Remote(_) => true,
        };
        self.inputs_seen.lock().unwrap().push(readable);

        if !readable {
            return Err(TranscodeError::InputUnavailable(input.to_string()));
        }
        if self.fail_at == Some(height) {
            return Err(TranscodeError::encode(height, "simulated fatal error"));
        }

        std::fs::write(output_dir.join("output0.ts"), b"segment")?;
        std::fs::write(
            output_dir.join(RENDITION_PLAYLIST),
            "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:10\n#EXTINF:10.0,\noutput0.ts\n#EXT-X-ENDLIST\n",
        )?;
        Ok(())
    }
}
