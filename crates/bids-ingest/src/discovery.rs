//! Input discovery: subject folders, anatomical outputs and waveform files.

use std::path::{Path, PathBuf};

use bids_model::SubjectFolder;
use tracing::warn;
use walkdir::WalkDir;

use crate::error::{IngestError, Result};

fn read_dir_entries(dir: &Path) -> Result<Vec<std::fs::DirEntry>> {
    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;
    entries
        .map(|entry| {
            entry.map_err(|e| IngestError::DirectoryRead {
                path: dir.to_path_buf(),
                source: e,
            })
        })
        .collect()
}

/// Lists the immediate subdirectories of the input root.
///
/// Returns folders sorted by name so runs are reproducible.
pub fn list_subject_folders(root: &Path) -> Result<Vec<SubjectFolder>> {
    if !root.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut folders: Vec<SubjectFolder> = read_dir_entries(root)?
        .into_iter()
        .filter(|entry| entry.path().is_dir())
        .map(|entry| SubjectFolder {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: entry.path(),
        })
        .collect();
    folders.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(folders)
}

/// Lists regular files directly in `dir` whose name ends with `suffix`.
///
/// Returns files sorted by filename.
pub fn list_files_with_suffix(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files: Vec<PathBuf> = read_dir_entries(dir)?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_suffix(path, suffix))
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Recursively collects files under `root` whose name ends with `suffix`.
///
/// Traversal is sorted by file name, so the result is stable across runs.
/// Unreadable entries are logged and skipped.
pub fn find_files_with_suffix(root: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }
    Ok(walk_files(root)
        .filter(|path| has_suffix(path, suffix))
        .collect())
}

/// First file under `root` whose name ends with `suffix`, stopping the walk
/// as soon as one is found. A missing `root` yields `None`.
pub fn first_file_with_suffix(root: &Path, suffix: &str) -> Option<PathBuf> {
    if !root.is_dir() {
        return None;
    }
    walk_files(root).find(|path| has_suffix(path, suffix))
}

fn walk_files(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "error accessing entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
}

fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(suffix))
}
