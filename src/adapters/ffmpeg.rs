//! Rendition encoder backed by the `ffmpeg` command line tool.

use crate::domain::jobs::{InputSource, RENDITION_PLAYLIST};
use crate::error::TranscodeError;
use crate::ports::encoder::RenditionEncoder;
use async_trait::async_trait;
use regex::Regex;
use std::ffi::OsString;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::OnceLock;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error, info};

/// Target segment duration in seconds.
pub const SEGMENT_SECONDS: u32 = 10;

/// Engine diagnostics that mean the source itself could not be read.
fn input_unavailable_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)(no such file or directory|server returned [45]\d\d|connection refused|connection timed out|failed to resolve hostname|name or service not known|invalid data found when processing input|permission denied|protocol not found)",
        )
        .expect("input-unavailable pattern is valid")
    })
}

#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: OsString,
    leading_args: Vec<OsString>,
    timeout: Option<Duration>,
}

impl FfmpegEncoder {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            timeout: None,
        }
    }

    /// Splits a command line such as `nice -n 10 ffmpeg` into program and wrapper args.
    pub fn from_command_line(command_line: &str) -> Self {
        let mut parts = command_line.split_whitespace();
        let program = parts.next().unwrap_or("ffmpeg");
        Self::new(program).with_leading_args(parts)
    }

    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Engine arguments for one rendition.
    ///
    /// Width is `-2`: the engine keeps the source aspect ratio (rounded to an
    /// even number), only the height is pinned.
    pub fn rendition_args(input: &InputSource, height: u32, output_dir: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "fatal".into(),
            "-err_detect".into(),
            "ignore_err".into(),
            "-y".into(),
            "-i".into(),
        ];
        args.push(input.as_arg());
        args.extend(
            [
                "-vf".to_string(),
                format!("scale=-2:{}", height),
                "-c:v".to_string(),
                "libx264".to_string(),
                "-c:a".to_string(),
                "aac".to_string(),
                "-hls_time".to_string(),
                SEGMENT_SECONDS.to_string(),
                "-hls_list_size".to_string(),
                "0".to_string(),
                "-f".to_string(),
                "hls".to_string(),
            ]
            .into_iter()
            .map(OsString::from),
        );
        args.push(output_dir.join(RENDITION_PLAYLIST).into_os_string());
        args
    }

    fn command(&self, input: &InputSource, height: u32, output_dir: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.leading_args)
            .args(Self::rendition_args(input, height, output_dir))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl RenditionEncoder for FfmpegEncoder {
    async fn encode(
        &self,
        input: &InputSource,
        height: u32,
        output_dir: &Path,
    ) -> Result<(), TranscodeError> {
        if let InputSource::Local(path) = input {
            if !tokio::fs::try_exists(path).await.unwrap_or(false) {
                return Err(TranscodeError::InputUnavailable(format!(
                    "{} does not exist",
                    path.display()
                )));
            }
        }

        let child = self
            .command(input, height, output_dir)
            .spawn()
            .map_err(|e| {
                TranscodeError::encode(
                    height,
                    format!("failed to start {}: {}", self.program.to_string_lossy(), e),
                )
            })?;
        info!(height, "Starting streaming job for resolution: {}p", height);

        let output = match self.timeout {
            // Dropping the wait future kills the child.
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(output) => output,
                Err(_) => {
                    error!(height, "Engine timed out after {:?}", limit);
                    return Err(TranscodeError::Timeout {
                        height,
                        seconds: limit.as_secs(),
                    });
                }
            },
            None => child.wait_with_output().await,
        }
        .map_err(|e| TranscodeError::encode(height, e.to_string()))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if output.status.success() {
            if !stderr.trim().is_empty() {
                debug!(height, stderr = %stderr.trim(), "Engine diagnostics");
            }
            info!(height, "Finished processing resolution: {}p", height);
            Ok(())
        } else {
            let err = classify_failure(height, output.status, &stderr);
            error!(height, "FFmpeg error: {}", err);
            Err(err)
        }
    }
}

/// Maps a non-zero engine exit to an error kind.
pub fn classify_failure(height: u32, status: ExitStatus, stderr: &str) -> TranscodeError {
    let reason = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .map(str::to_string)
        .unwrap_or_else(|| format!("engine exited with {}", status));

    if input_unavailable_pattern().is_match(stderr) {
        TranscodeError::InputUnavailable(reason)
    } else {
        TranscodeError::encode(height, reason)
    }
}
