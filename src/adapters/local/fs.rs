//! On-disk layout of job outputs:
//!
//! ```text
//! <output_root>/<job_id>/master.m3u8
//! <output_root>/<job_id>/<height>/output.m3u8
//! <output_root>/<job_id>/<height>/<segments>
//! ```

use crate::domain::hls::MasterPlaylist;
use crate::domain::id;
use crate::domain::jobs::{RenditionSpec, MASTER_PLAYLIST, RENDITION_PLAYLIST};
use std::io;
use std::path::{Path, PathBuf};

/// How many fresh ids to try before giving up on a crowded output root.
const MAX_ID_ATTEMPTS: usize = 8;

#[derive(Debug, Clone)]
pub struct JobWorkspace {
    job_id: String,
    dir: PathBuf,
}

impl JobWorkspace {
    /// Creates `output_root` if needed, then a fresh, previously absent job directory in it.
    pub async fn create(output_root: &Path) -> io::Result<Self> {
        Self::create_with(output_root, id::job_id).await
    }

    pub async fn create_with<F>(output_root: &Path, mut next_id: F) -> io::Result<Self>
    where
        F: FnMut() -> String,
    {
        tokio::fs::create_dir_all(output_root).await?;

        for _ in 0..MAX_ID_ATTEMPTS {
            let job_id = next_id();
            let dir = output_root.join(&job_id);
            // Non-recursive: an existing directory means the id is taken.
            match tokio::fs::create_dir(&dir).await {
                Ok(()) => return Ok(Self { job_id, dir }),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    tracing::warn!(job_id = %job_id, "Job id already in use, drawing another");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!(
                "no free job id in {} after {} attempts",
                output_root.display(),
                MAX_ID_ATTEMPTS
            ),
        ))
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn rendition_dir(&self, spec: &RenditionSpec) -> PathBuf {
        self.dir.join(spec.dir_name())
    }

    pub fn rendition_playlist(&self, spec: &RenditionSpec) -> PathBuf {
        self.rendition_dir(spec).join(RENDITION_PLAYLIST)
    }

    pub fn master_playlist(&self) -> PathBuf {
        self.dir.join(MASTER_PLAYLIST)
    }

    pub async fn create_rendition_dir(&self, spec: &RenditionSpec) -> io::Result<PathBuf> {
        let dir = self.rendition_dir(spec);
        tokio::fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    pub async fn write_master(&self, playlist: &MasterPlaylist) -> io::Result<PathBuf> {
        let path = self.master_playlist();
        playlist.write_to(&path).await?;
        Ok(path)
    }

    /// Removes the whole job directory, for callers that opt out of keeping failed output.
    pub async fn remove(&self) -> io::Result<()> {
        match tokio::fs::remove_dir_all(&self.dir).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_create_makes_root_and_job_dir() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("nested").join("streams");

        let workspace = JobWorkspace::create(&root).await.unwrap();

        assert!(workspace.dir().is_dir());
        assert_eq!(workspace.dir().parent().unwrap(), root);
        assert_eq!(workspace.job_id().len(), id::JOB_ID_LENGTH);
    }

    #[tokio::test]
    async fn test_create_retries_on_collision() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("taken")).unwrap();

        let mut ids = vec!["fresh".to_string(), "taken".to_string()];
        let workspace = JobWorkspace::create_with(dir.path(), || ids.pop().unwrap())
            .await
            .unwrap();

        assert_eq!(workspace.job_id(), "fresh");
    }

    #[tokio::test]
    async fn test_create_gives_up_when_every_id_is_taken() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("same")).unwrap();

        let result = JobWorkspace::create_with(dir.path(), || "same".to_string()).await;
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn test_layout_paths() {
        let dir = tempdir().unwrap();
        let workspace = JobWorkspace::create(dir.path()).await.unwrap();
        let spec = RenditionSpec::new(720, 2_800_000);

        let rendition_dir = workspace.create_rendition_dir(&spec).await.unwrap();
        assert!(rendition_dir.is_dir());
        assert_eq!(rendition_dir, workspace.dir().join("720"));
        assert_eq!(
            workspace.rendition_playlist(&spec),
            workspace.dir().join("720").join("output.m3u8")
        );
        assert_eq!(
            workspace.master_playlist(),
            workspace.dir().join("master.m3u8")
        );

        workspace.remove().await.unwrap();
        assert!(!workspace.dir().exists());
        workspace.remove().await.unwrap();
    }
}
