//! Folder population against temporary directory trees.

use std::fs;
use std::path::{Path, PathBuf};

use populator::{
    FileFactory, Format, PopulateConfig, PopulateStats, populate, populate_dir, target_folders,
    user_directories, validate,
};
use tempfile::TempDir;

/// Every regular file below `dir`, recursively.
fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            out.extend(files_under(&path));
        } else {
            out.push(path);
        }
    }
    out
}

fn subdirs_under(dir: &Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter(|e| e.as_ref().unwrap().path().is_dir())
        .count()
}

#[test]
fn test_populate_dir_counts_match_disk() {
    let dir = TempDir::new().unwrap();
    let mut factory = FileFactory::seeded(1);
    let stats = populate_dir(&mut factory, dir.path(), &PopulateConfig::default());

    assert_eq!(stats.failures, 0);
    assert!(stats.files >= 5);
    assert_eq!(subdirs_under(dir.path()), stats.subdirs);
    assert_eq!(files_under(dir.path()).len(), stats.files);
}

#[test]
fn test_every_written_file_is_valid() {
    let dir = TempDir::new().unwrap();
    let mut factory = FileFactory::seeded(42);
    let config = PopulateConfig {
        verify: true,
        ..Default::default()
    };
    let stats = populate_dir(&mut factory, dir.path(), &config);
    assert_eq!(stats.failures, 0);

    for path in files_under(dir.path()) {
        let format = Format::from_path(&path).unwrap();
        let bytes = fs::read(&path).unwrap();
        validate::check(format, &bytes).unwrap_or_else(|e| panic!("{}: {e}", path.display()));
    }
}

#[test]
fn test_no_subdirectories_when_disabled() {
    let dir = TempDir::new().unwrap();
    let mut factory = FileFactory::seeded(7);
    let config = PopulateConfig {
        files_per_dir: (3, 3),
        subdir_probability: 0.0,
        formats: vec![Format::Text],
        ..Default::default()
    };
    let stats = populate_dir(&mut factory, dir.path(), &config);

    assert_eq!(stats.files, 3);
    assert_eq!(stats.subdirs, 0);
    assert_eq!(subdirs_under(dir.path()), 0);
    for path in files_under(dir.path()) {
        assert_eq!(path.extension().unwrap(), "txt");
    }
}

#[test]
fn test_always_subdirectory() {
    let dir = TempDir::new().unwrap();
    let mut factory = FileFactory::seeded(9);
    let config = PopulateConfig {
        files_per_dir: (2, 2),
        subdir_probability: 1.0,
        files_per_subdir: (1, 1),
        formats: vec![Format::Png],
        ..Default::default()
    };
    let stats = populate_dir(&mut factory, dir.path(), &config);

    assert_eq!(
        stats,
        PopulateStats {
            files: 4,
            subdirs: 2,
            failures: 0
        }
    );
}

#[test]
fn test_failures_are_counted_and_cleaned_up() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("gone");
    let mut factory = FileFactory::seeded(3);
    let config = PopulateConfig {
        files_per_dir: (4, 4),
        subdir_probability: 0.0,
        ..Default::default()
    };
    let stats = populate_dir(&mut factory, &missing, &config);

    assert_eq!(stats.files, 0);
    assert_eq!(stats.failures, 4);
    assert!(!missing.exists());
}

#[test]
fn test_full_run_over_user_tree() {
    let root = TempDir::new().unwrap();
    for user in ["alice", "Public", "Default"] {
        for folder in ["Desktop", "Documents", "AppData"] {
            fs::create_dir_all(root.path().join(user).join(folder)).unwrap();
        }
    }

    let config = PopulateConfig {
        subdir_probability: 0.0,
        ..Default::default()
    };
    let mut factory = FileFactory::seeded(11);
    let mut stats = PopulateStats::default();
    for user in user_directories(root.path(), &config).unwrap() {
        let dirs = target_folders(&user, &config).unwrap();
        assert_eq!(dirs.len(), 2);
        stats += populate(&mut factory, &dirs, &config);
    }

    assert!(stats.files >= 10);
    assert_eq!(stats.failures, 0);
    assert!(files_under(&root.path().join("Public")).is_empty());
    assert!(files_under(&root.path().join("alice/AppData")).is_empty());
    assert!(!files_under(&root.path().join("alice/Desktop")).is_empty());
}
