//! Keeps the output root bounded to the most recent job directories.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};

pub const DEFAULT_KEEP: usize = 5;

/// Deletes every entry of `directory` except the `keep` most recently modified.
///
/// Returns the removed paths. A missing directory prunes nothing.
pub fn prune(directory: &Path, keep: usize) -> io::Result<Vec<PathBuf>> {
    prune_except(directory, keep, |_| false)
}

/// Like [`prune`], but never touches entries for which `is_protected` holds.
pub fn prune_except<F>(directory: &Path, keep: usize, is_protected: F) -> io::Result<Vec<PathBuf>>
where
    F: Fn(&OsStr) -> bool,
{
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut dated: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in entries {
        let entry = entry?;
        // Entries can vanish between listing and stat.
        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };
        dated.push((modified, entry.path()));
    }
    dated.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    let mut removed = Vec::new();
    for (_, path) in dated.into_iter().skip(keep) {
        let name = path.file_name().unwrap_or_default();
        if is_protected(name) {
            debug!(path = %path.display(), "Skipping in-flight job directory");
            continue;
        }
        remove_entry(&path)?;
        info!(path = %path.display(), "Pruned old output");
        removed.push(path);
    }
    Ok(removed)
}

fn remove_entry(path: &Path) -> io::Result<()> {
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) => Err(e),
    };
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_directory_prunes_nothing() {
        let dir = tempdir().unwrap();
        let removed = prune(&dir.path().join("absent"), 5).unwrap();
        assert!(removed.is_empty());
    }

    #[test]
    fn test_fewer_entries_than_keep() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();

        let removed = prune(dir.path(), 5).unwrap();
        assert!(removed.is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_keep_zero_removes_files_and_directories() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("job").join("480")).unwrap();
        fs::write(dir.path().join("job").join("master.m3u8"), "#EXTM3U").unwrap();
        fs::write(dir.path().join("stray.txt"), "x").unwrap();

        let removed = prune(dir.path(), 0).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_protected_entries_survive() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("running")).unwrap();
        fs::create_dir(dir.path().join("done")).unwrap();

        let removed = prune_except(dir.path(), 0, |name| name == "running").unwrap();
        assert_eq!(removed, vec![dir.path().join("done")]);
        assert!(dir.path().join("running").exists());
    }
}
