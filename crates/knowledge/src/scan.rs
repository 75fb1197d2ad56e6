//! Dataset file enumeration.

use docchat_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// List every regular file beneath `root`.
///
/// The walk completes before returning. Symlinks are not followed, and any
/// traversal error aborts the scan instead of being skipped.
#[tracing::instrument(level = "debug")]
pub fn enumerate_files(root: &Path) -> AppResult<Vec<PathBuf>> {
    if !root.exists() {
        return Err(AppError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Dataset directory not found: {}", root.display()),
        )));
    }
    if !root.is_dir() {
        return Err(AppError::Knowledge(format!(
            "Dataset root is not a directory: {}",
            root.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| AppError::Io(e.into()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    tracing::debug!("Found {} files under {}", files.len(), root.display());
    Ok(files)
}
