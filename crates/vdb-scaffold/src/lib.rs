//! VDB Scaffold - Project folder helpers
//!
//! Plain filesystem operations used to prepare a source folder for
//! ingestion and to reset the index before a fresh run:
//! - copy a fixed list of essential files
//! - mirror a tree while skipping excluded folders and file types
//! - empty a directory
//! - delete a stale index file
//!
//! Author: hephaex@gmail.com

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub mod clean;
pub mod copy;

pub use clean::clean_directory;
pub use copy::{copy_essential_files, copy_recursive, ExclusionFilter};

// ============================================================================
// Reports
// ============================================================================

/// Summary of a copy operation
#[derive(Debug, Clone, Default, Serialize)]
pub struct CopyReport {
    /// Files copied
    pub copied: usize,

    /// Files and folders left out by the exclusion filter
    pub excluded: usize,

    /// Requested sources that do not exist
    pub missing: Vec<PathBuf>,

    /// Entries that failed to copy, with the cause
    pub failed: Vec<(PathBuf, String)>,
}

impl CopyReport {
    /// Whether nothing was missing or failed
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.failed.is_empty()
    }
}

// ============================================================================
// Stale Index Cleanup
// ============================================================================

/// Outcome of deleting a stale index file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The file existed and was removed
    Deleted,
    /// There was nothing to delete
    NotFound,
    /// The file exists but could not be removed
    Failed(String),
}

/// Best-effort removal of an index file before a fresh run
///
/// Never fails: errors are logged and reported as `DeleteOutcome::Failed`.
pub async fn delete_index_file(path: impl AsRef<Path>) -> DeleteOutcome {
    let path = path.as_ref();

    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            info!("File \"{}\" has been deleted successfully.", path.display());
            DeleteOutcome::Deleted
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => DeleteOutcome::NotFound,
        Err(e) => {
            error!("Error deleting file \"{}\": {}", path.display(), e);
            DeleteOutcome::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_delete_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, "{}").unwrap();

        assert_eq!(delete_index_file(&path).await, DeleteOutcome::Deleted);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_delete_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        assert_eq!(delete_index_file(&path).await, DeleteOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_delete_directory_fails_softly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        std::fs::create_dir(&path).unwrap();

        let outcome = delete_index_file(&path).await;
        assert!(matches!(outcome, DeleteOutcome::Failed(_)));
        assert!(path.exists());
    }

    #[test]
    fn test_copy_report_clean() {
        let mut report = CopyReport::default();
        assert!(report.is_clean());
        report.missing.push(PathBuf::from("x"));
        assert!(!report.is_clean());
    }
}
