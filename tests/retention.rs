use filetime::{set_file_mtime, FileTime};
use hls_ladder::adapters::local::retention::prune;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_prune_keeps_five_most_recent_of_eight() {
    let root = tempdir().unwrap();
    for i in 0..8 {
        let job = root.path().join(format!("job{}", i));
        fs::create_dir_all(job.join("720")).unwrap();
        fs::write(job.join("720").join("output.m3u8"), "#EXTM3U\n").unwrap();
        fs::write(job.join("master.m3u8"), "#EXTM3U\n").unwrap();
        set_file_mtime(&job, FileTime::from_unix_time(1_700_000_000 + i * 60, 0)).unwrap();
    }

    let mut removed = prune(root.path(), 5).unwrap();
    removed.sort();

    assert_eq!(
        removed,
        vec![
            root.path().join("job0"),
            root.path().join("job1"),
            root.path().join("job2"),
        ]
    );

    let mut remaining: Vec<String> = fs::read_dir(root.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    remaining.sort();
    assert_eq!(remaining, vec!["job3", "job4", "job5", "job6", "job7"]);

    for name in ["job0", "job1", "job2"] {
        assert!(!root.path().join(name).exists());
    }
}

#[test]
fn test_prune_uses_modification_time_not_name() {
    let root = tempdir().unwrap();
    let names = ["zzz", "aaa", "mmm"];
    for (i, name) in names.iter().enumerate() {
        let path = root.path().join(name);
        fs::write(&path, name).unwrap();
        set_file_mtime(&path, FileTime::from_unix_time(1_700_000_000 + i as i64, 0)).unwrap();
    }

    let removed = prune(root.path(), 1).unwrap();

    assert_eq!(removed.len(), 2);
    assert!(root.path().join("mmm").exists());
    assert!(!root.path().join("zzz").exists());
    assert!(!root.path().join("aaa").exists());
}
