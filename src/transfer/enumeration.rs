use std::collections::HashMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::TransferError;
use crate::error::SourceError;
use crate::transfer::helpers::display_path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    File,
    Dir,
}

/// Decide at dispatch time whether a job uploads one file or a tree.
pub fn classify_source(path: &Path) -> Result<SourceKind, SourceError> {
    if path.is_file() {
        Ok(SourceKind::File)
    } else if path.is_dir() {
        Ok(SourceKind::Dir)
    } else {
        Err(SourceError::InvalidSource(path.to_path_buf()))
    }
}

/// Every regular file below `root`, lazily, in a stable (name-sorted) order.
/// Walk errors surface as transfer failures so the attempt is retried.
pub fn list_files_recursive(
    root: &Path,
) -> impl Iterator<Item = Result<PathBuf, TransferError>> + '_ {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(e) if e.file_type().is_file() => Some(Ok(e.into_path())),
            Ok(_) => None,
            Err(e) => Some(Err(TransferError::LocalIo {
                path: e
                    .path()
                    .map(|p| display_path(p).to_string())
                    .unwrap_or_else(|| display_path(root).to_string()),
                msg: e.to_string(),
            })),
        })
}

/// Basenames appearing more than once under `root`. Such files overwrite
/// each other once flattened into a single remote directory.
pub fn colliding_basenames(root: &Path) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for path in list_files_recursive(root).flatten() {
        if let Some(name) = path.file_name() {
            *counts.entry(name.to_string_lossy().into_owned()).or_default() += 1;
        }
    }
    let mut dups: Vec<String> =
        counts.into_iter().filter(|(_, n)| *n > 1).map(|(name, _)| name).collect();
    dups.sort();
    dups
}
