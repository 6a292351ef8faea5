//! Folder population.
//!
//! Finds user profile folders and fills them with synthetic files. Every
//! step returns a [`PopulateStats`] value that the caller folds; a failed
//! file is logged, counted, removed, and skipped.

use std::fs;
use std::io;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::error::Error;
use crate::factory::FileFactory;
use crate::format::Format;
use crate::lorem::TextSource;
use crate::validate;

/// Population policy.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "cli", derive(serde::Deserialize), serde(default))]
pub struct PopulateConfig {
    /// Inclusive range of files created directly in each target folder.
    pub files_per_dir: (usize, usize),
    /// Chance, after each file, of also creating a populated subdirectory.
    pub subdir_probability: f64,
    /// Inclusive range of files created inside each new subdirectory.
    pub files_per_subdir: (usize, usize),
    /// Formats drawn from when naming files.
    pub formats: Vec<Format>,
    /// Profile sub-folders that get populated.
    pub folders: Vec<String>,
    /// Accounts under the users root that are never touched.
    pub skip_users: Vec<String>,
    /// Re-read and validate every file after writing it.
    pub verify: bool,
}

impl Default for PopulateConfig {
    fn default() -> Self {
        Self {
            files_per_dir: (5, 15),
            subdir_probability: 0.25,
            files_per_subdir: (5, 15),
            formats: Format::ALL.to_vec(),
            folders: ["Desktop", "Documents", "Pictures", "Music", "Downloads", "Videos"]
                .map(String::from)
                .to_vec(),
            skip_users: [
                "Administrator",
                "Public",
                "Default",
                "All Users",
                "defaultuser0",
                "Default User",
            ]
            .map(String::from)
            .to_vec(),
            verify: false,
        }
    }
}

/// Counts accumulated by a population run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulateStats {
    pub files: usize,
    pub subdirs: usize,
    pub failures: usize,
}

impl PopulateStats {
    fn file() -> Self {
        Self {
            files: 1,
            ..Self::default()
        }
    }

    fn failure() -> Self {
        Self {
            failures: 1,
            ..Self::default()
        }
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            files: self.files + other.files,
            subdirs: self.subdirs + other.subdirs,
            failures: self.failures + other.failures,
        }
    }
}

impl AddAssign for PopulateStats {
    fn add_assign(&mut self, other: Self) {
        *self = self.merge(other);
    }
}

/// Non-default account folders under `users_root`.
pub fn user_directories(users_root: &Path, config: &PopulateConfig) -> io::Result<Vec<PathBuf>> {
    let mut users = Vec::new();
    for entry in fs::read_dir(users_root)? {
        let entry = entry?;
        let name = entry.file_name();
        let skipped = config
            .skip_users
            .iter()
            .any(|u| name.to_str() == Some(u.as_str()));
        if entry.file_type()?.is_dir() && !skipped {
            users.push(entry.path());
        }
    }
    if users.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no user directories found in {}", users_root.display()),
        ));
    }
    users.sort();
    Ok(users)
}

/// Existing children of `user_dir` whose names are in `config.folders`.
pub fn target_folders(user_dir: &Path, config: &PopulateConfig) -> io::Result<Vec<PathBuf>> {
    let mut folders = Vec::new();
    for entry in fs::read_dir(user_dir)? {
        let entry = entry?;
        let wanted = entry
            .file_name()
            .to_str()
            .is_some_and(|name| config.folders.iter().any(|f| f == name));
        if wanted && entry.file_type()?.is_dir() {
            folders.push(entry.path());
        }
    }
    folders.sort();
    Ok(folders)
}

/// Populate every directory in `dirs`.
pub fn populate<T: TextSource, R: Rng>(
    factory: &mut FileFactory<T, R>,
    dirs: &[PathBuf],
    config: &PopulateConfig,
) -> PopulateStats {
    dirs.iter().fold(PopulateStats::default(), |stats, dir| {
        log::info!("Populating directory: {}", dir.display());
        stats.merge(populate_dir(factory, dir, config))
    })
}

/// Fill `dir` with files, occasionally adding a populated subdirectory.
pub fn populate_dir<T: TextSource, R: Rng>(
    factory: &mut FileFactory<T, R>,
    dir: &Path,
    config: &PopulateConfig,
) -> PopulateStats {
    let mut stats = PopulateStats::default();
    let count = random_count(factory.rng(), config.files_per_dir);
    for _ in 0..count {
        stats += create_one(factory, dir, config);
        if factory.rng().random_bool(config.subdir_probability.clamp(0.0, 1.0)) {
            stats += create_subdir(factory, dir, config);
        }
    }
    stats
}

/// Names tried per file or directory (`stem`, `stem-2`, ...) before giving up.
const NAME_ATTEMPTS: usize = 100;

fn create_subdir<T: TextSource, R: Rng>(
    factory: &mut FileFactory<T, R>,
    parent: &Path,
    config: &PopulateConfig,
) -> PopulateStats {
    let stem = factory.text().name();
    let mut attempt = 1;
    let (path, created) = loop {
        let path = parent.join(numbered_name(&stem, attempt, None));
        match fs::create_dir(&path) {
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && attempt < NAME_ATTEMPTS => {
                attempt += 1;
            }
            result => break (path, result),
        }
    };
    if let Err(e) = created {
        log::warn!("Error creating directory {}: {e}", path.display());
        return PopulateStats::failure();
    }
    log::info!("Directory created: {}", path.display());

    let mut stats = PopulateStats {
        subdirs: 1,
        ..PopulateStats::default()
    };
    let count = random_count(factory.rng(), config.files_per_subdir);
    for _ in 0..count {
        stats += create_one(factory, &path, config);
    }
    stats
}

fn create_one<T: TextSource, R: Rng>(
    factory: &mut FileFactory<T, R>,
    dir: &Path,
    config: &PopulateConfig,
) -> PopulateStats {
    let Some(&format) = config.formats.choose(factory.rng()) else {
        return PopulateStats::default();
    };
    let ext = format.extension();
    let stem = factory.text().name();

    // Never open an existing file: it may be a real document or one made earlier
    let mut attempt = 1;
    let (path, created) = loop {
        let path = dir.join(numbered_name(&stem, attempt, Some(ext)));
        match factory.create_file(&path, ext) {
            Err(Error::Io(e))
                if e.kind() == io::ErrorKind::AlreadyExists && attempt < NAME_ATTEMPTS =>
            {
                attempt += 1;
            }
            result => break (path, result),
        }
    };

    let result = created.and_then(|_| {
        if config.verify {
            validate::check(format, &fs::read(&path)?)
        } else {
            Ok(())
        }
    });

    match result {
        Ok(()) => {
            log::info!("File created: {}", path.display());
            PopulateStats::file()
        }
        Err(Error::Io(e)) if e.kind() == io::ErrorKind::AlreadyExists => {
            log::warn!("Error creating file {}: {e}", path.display());
            PopulateStats::failure()
        }
        Err(e) => {
            log::warn!("Error creating file {}: {e}", path.display());
            if let Err(rm) = fs::remove_file(&path)
                && rm.kind() != io::ErrorKind::NotFound
            {
                log::warn!("Could not remove partial file {}: {rm}", path.display());
            }
            PopulateStats::failure()
        }
    }
}

/// `stem.ext` for the first attempt, then `stem-2.ext`, `stem-3.ext`, ...
fn numbered_name(stem: &str, attempt: usize, ext: Option<&str>) -> String {
    let stem = if attempt > 1 {
        format!("{stem}-{attempt}")
    } else {
        stem.to_string()
    };
    match ext {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

fn random_count<R: Rng>(rng: &mut R, (min, max): (usize, usize)) -> usize {
    if max <= min {
        min
    } else {
        rng.random_range(min..=max)
    }
}
