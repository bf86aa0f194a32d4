//! Configuration loaded from the environment (and an optional `.env` file).

use crate::adapters::local::retention::DEFAULT_KEEP;
use crate::domain::jobs::RenditionLadder;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Default upload cap: 200MB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// Static root served at `/`
    pub public_dir: PathBuf,
    /// Job output root, served at `/streams`
    pub streams_dir: PathBuf,
    /// Spool directory for uploaded source files
    pub upload_dir: PathBuf,
    /// How many job directories survive a prune
    pub keep_jobs: usize,
    /// Largest accepted upload, in bytes
    pub max_upload_bytes: usize,
    /// Engine command line, e.g. `ffmpeg` or `nice -n 10 ffmpeg`
    pub ffmpeg_bin: String,
    /// Per-rendition engine timeout; `None` waits forever
    pub rendition_timeout: Option<Duration>,
    /// Cap on simultaneously running jobs; `None` is unbounded
    pub max_concurrent_jobs: Option<usize>,
    /// Remove the directory of a failed job
    pub cleanup_failed_jobs: bool,
    /// Renditions produced for every job
    pub ladder: RenditionLadder,
    /// Settings that could not be parsed and fell back to their default
    pub fallbacks: Vec<String>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut fallbacks = Vec::new();
        let public_dir = PathBuf::from(lookup("PUBLIC_DIR").unwrap_or_else(|| "public".into()));
        let streams_dir = lookup("STREAMS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| public_dir.join("streams"));
        let upload_dir = lookup("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join("video-uploads"));

        Self {
            addr: lookup("ADDR").unwrap_or_else(|| String::from("127.0.0.1")),
            port: lookup("PORT").unwrap_or_else(|| String::from("3000")),
            public_dir,
            streams_dir,
            upload_dir,
            keep_jobs: parse_or(&lookup, &mut fallbacks, "KEEP_JOBS", DEFAULT_KEEP),
            max_upload_bytes: parse_or(
                &lookup,
                &mut fallbacks,
                "MAX_UPLOAD_BYTES",
                DEFAULT_MAX_UPLOAD_BYTES,
            ),
            ffmpeg_bin: lookup("FFMPEG_BIN").unwrap_or_else(|| String::from("ffmpeg")),
            rendition_timeout: parse_opt::<u64, _>(&lookup, &mut fallbacks, "RENDITION_TIMEOUT_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            max_concurrent_jobs: parse_opt::<usize, _>(&lookup, &mut fallbacks, "MAX_CONCURRENT_JOBS")
                .filter(|n| *n > 0),
            cleanup_failed_jobs: parse_or(&lookup, &mut fallbacks, "CLEANUP_FAILED_JOBS", false),
            ladder: parse_or(&lookup, &mut fallbacks, "RENDITIONS", RenditionLadder::default()),
            fallbacks,
        }
    }

    /// Logs every ignored setting. Call once tracing is initialized.
    pub fn log_fallbacks(&self) {
        for note in &self.fallbacks {
            warn!("{}", note);
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }
}

fn parse_opt<T, F>(lookup: &F, fallbacks: &mut Vec<String>, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            fallbacks.push(format!("Ignoring {}={:?}: {}", key, raw, e));
            None
        }
    }
}

fn parse_or<T, F>(lookup: &F, fallbacks: &mut Vec<String>, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    parse_opt(lookup, fallbacks, key).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::jobs::RenditionSpec;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.streams_dir, PathBuf::from("public").join("streams"));
        assert_eq!(config.keep_jobs, 5);
        assert_eq!(config.max_upload_bytes, 209_715_200);
        assert_eq!(config.ffmpeg_bin, "ffmpeg");
        assert_eq!(config.rendition_timeout, None);
        assert_eq!(config.max_concurrent_jobs, None);
        assert!(!config.cleanup_failed_jobs);
        assert_eq!(config.ladder, RenditionLadder::default());
        assert!(config.fallbacks.is_empty());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("PUBLIC_DIR", "/srv/www"),
            ("KEEP_JOBS", "10"),
            ("RENDITION_TIMEOUT_SECS", "600"),
            ("MAX_CONCURRENT_JOBS", "2"),
            ("CLEANUP_FAILED_JOBS", "true"),
            ("RENDITIONS", "360:800000"),
        ]);
        assert_eq!(config.streams_dir, PathBuf::from("/srv/www/streams"));
        assert_eq!(config.keep_jobs, 10);
        assert_eq!(config.rendition_timeout, Some(Duration::from_secs(600)));
        assert_eq!(config.max_concurrent_jobs, Some(2));
        assert!(config.cleanup_failed_jobs);
        assert_eq!(config.ladder.renditions(), &[RenditionSpec::new(360, 800_000)]);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config(&[
            ("KEEP_JOBS", "many"),
            ("RENDITIONS", "480:1400000,720"),
            ("RENDITION_TIMEOUT_SECS", "0"),
        ]);
        assert_eq!(config.keep_jobs, 5);
        assert_eq!(config.ladder, RenditionLadder::default());
        assert_eq!(config.rendition_timeout, None);

        assert_eq!(config.fallbacks.len(), 2);
        assert!(config.fallbacks[0].starts_with("Ignoring KEEP_JOBS=\"many\""));
        assert!(config.fallbacks[1].starts_with("Ignoring RENDITIONS="));
    }
}
