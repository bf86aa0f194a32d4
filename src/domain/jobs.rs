use crate::error::{Result, TranscodeError};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File name of every per-rendition playlist.
pub const RENDITION_PLAYLIST: &str = "output.m3u8";

/// File name of the job-level master playlist.
pub const MASTER_PLAYLIST: &str = "master.m3u8";

/// Where the engine reads the source video from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputSource {
    Local(PathBuf),
    Remote(String),
}

impl InputSource {
    /// Anything carrying a URL scheme is handed to the engine as a remote input.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.split_once("://") {
            Some((scheme, rest))
                if !scheme.is_empty()
                    && !rest.is_empty()
                    && scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+') =>
            {
                InputSource::Remote(raw.to_string())
            }
            _ => InputSource::Local(PathBuf::from(raw)),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, InputSource::Remote(_))
    }

    /// Argument passed to the engine's `-i`.
    pub fn as_arg(&self) -> OsString {
        match self {
            InputSource::Local(path) => path.as_os_str().to_owned(),
            InputSource::Remote(url) => OsString::from(url),
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::Local(path) => write!(f, "{}", path.display()),
            InputSource::Remote(url) => write!(f, "{}", url),
        }
    }
}

impl From<PathBuf> for InputSource {
    fn from(path: PathBuf) -> Self {
        InputSource::Local(path)
    }
}

impl From<&Path> for InputSource {
    fn from(path: &Path) -> Self {
        InputSource::Local(path.to_path_buf())
    }
}

/// One target rendition: vertical resolution in pixels and bandwidth in bits/sec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenditionSpec {
    pub height: u32,
    pub bandwidth: u64,
}

impl RenditionSpec {
    pub fn new(height: u32, bandwidth: u64) -> Self {
        Self { height, bandwidth }
    }

    /// Advertised width, assuming 16:9 whatever the source really is.
    pub fn width(&self) -> u32 {
        (u64::from(self.height) * 16 / 9) as u32
    }

    /// Subdirectory (relative to the job directory) holding this rendition.
    pub fn dir_name(&self) -> String {
        self.height.to_string()
    }

    /// Playlist path relative to the job directory, as referenced by the master playlist.
    pub fn playlist_uri(&self) -> String {
        format!("{}/{}", self.height, RENDITION_PLAYLIST)
    }
}

/// Ordered, validated list of renditions for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenditionLadder {
    renditions: Vec<RenditionSpec>,
}

impl RenditionLadder {
    /// Pair index-aligned resolution and bandwidth lists.
    pub fn from_lists(resolutions: &[u32], bandwidths: &[u64]) -> Result<Self> {
        if resolutions.len() != bandwidths.len() {
            return Err(TranscodeError::invalid_ladder(format!(
                "{} resolutions but {} bandwidths",
                resolutions.len(),
                bandwidths.len()
            )));
        }
        let renditions = resolutions
            .iter()
            .zip(bandwidths)
            .map(|(&height, &bandwidth)| RenditionSpec::new(height, bandwidth))
            .collect();
        Self::new(renditions)
    }

    pub fn new(renditions: Vec<RenditionSpec>) -> Result<Self> {
        if renditions.is_empty() {
            return Err(TranscodeError::invalid_ladder("no renditions"));
        }
        for (i, spec) in renditions.iter().enumerate() {
            if spec.height == 0 || spec.bandwidth == 0 {
                return Err(TranscodeError::invalid_ladder(format!(
                    "rendition {} must have a positive resolution and bandwidth",
                    i
                )));
            }
            // Each rendition owns a directory named after its height.
            if renditions[..i].iter().any(|s| s.height == spec.height) {
                return Err(TranscodeError::invalid_ladder(format!(
                    "duplicate resolution {}",
                    spec.height
                )));
            }
        }
        Ok(Self { renditions })
    }

    pub fn renditions(&self) -> &[RenditionSpec] {
        &self.renditions
    }

    pub fn len(&self) -> usize {
        self.renditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renditions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenditionSpec> {
        self.renditions.iter()
    }
}

impl Default for RenditionLadder {
    fn default() -> Self {
        Self {
            renditions: vec![
                RenditionSpec::new(480, 1_400_000),
                RenditionSpec::new(720, 2_800_000),
                RenditionSpec::new(1080, 5_000_000),
            ],
        }
    }
}

/// Parses `height:bandwidth` pairs separated by commas, e.g. `480:1400000,720:2800000`.
impl FromStr for RenditionLadder {
    type Err = TranscodeError;

    fn from_str(s: &str) -> Result<Self> {
        let renditions = s
            .split(',')
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (height, bandwidth) = pair.split_once(':').ok_or_else(|| {
                    TranscodeError::invalid_ladder(format!("expected height:bandwidth, got {pair:?}"))
                })?;
                let height = height.trim().parse::<u32>().map_err(|e| {
                    TranscodeError::invalid_ladder(format!("bad height in {pair:?}: {e}"))
                })?;
                let bandwidth = bandwidth.trim().parse::<u64>().map_err(|e| {
                    TranscodeError::invalid_ladder(format!("bad bandwidth in {pair:?}: {e}"))
                })?;
                Ok(RenditionSpec::new(height, bandwidth))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(renditions)
    }
}

/// A rendition the engine produced successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenditionResult {
    pub height: u32,
    pub output_dir: PathBuf,
    pub playlist: PathBuf,
}

/// Successful outcome of a job; every rendition in the ladder succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedJob {
    pub job_id: String,
    pub job_dir: PathBuf,
    pub master_playlist: PathBuf,
    pub elapsed_seconds: u64,
    pub renditions: Vec<RenditionResult>,
}
