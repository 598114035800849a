//! Removal of a cycle's intermediate files.

use crate::error::{CamnodeError, Result};
use std::path::{Path, PathBuf};

/// Delete `path`. A file that is already gone counts as removed.
///
/// Returns `true` if a file was actually deleted.
pub async fn remove_if_exists(path: &Path) -> Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CamnodeError::Cleanup {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
    }
}

/// Outcome of one cleanup pass.
#[derive(Debug, Default)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub failures: Vec<CamnodeError>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Remove every path, continuing past failures. Failures are logged and reported,
/// never returned as an error.
pub async fn remove_all(paths: &[PathBuf]) -> CleanupReport {
    let mut report = CleanupReport::default();
    for path in paths {
        match remove_if_exists(path).await {
            Ok(true) => {
                tracing::debug!(path = %path.display(), "removed");
                report.removed.push(path.clone());
            }
            Ok(false) => tracing::debug!(path = %path.display(), "already absent"),
            Err(e) => {
                tracing::warn!("{}", e);
                report.failures.push(e);
            }
        }
    }
    report
}
