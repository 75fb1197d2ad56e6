//! Extension filtering and document loading.

use crate::types::SourceDocument;
use docchat_core::{AppError, AppResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Keep paths whose file name ends with one of `allowed` (case-sensitive).
pub fn filter_by_extension(paths: Vec<PathBuf>, allowed: &[String]) -> Vec<PathBuf> {
    paths
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| allowed.iter().any(|ext| name.ends_with(ext.as_str())))
        })
        .collect()
}

/// Read each file fully. The first unreadable file aborts the load.
pub fn load_documents(paths: &[PathBuf], datasets_root: &Path) -> AppResult<Vec<SourceDocument>> {
    paths
        .iter()
        .map(|path| {
            let content = fs::read_to_string(path).map_err(|e| {
                AppError::Knowledge(format!("Failed to read {}: {}", path.display(), e))
            })?;

            Ok(SourceDocument {
                path: path.clone(),
                source: source_label(path, datasets_root),
                content,
            })
        })
        .collect()
}

/// Path relative to the datasets root, joined with '/'.
fn source_label(path: &Path, datasets_root: &Path) -> String {
    let relative = path.strip_prefix(datasets_root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
