//! Copy helpers
//!
//! Both helpers log and continue past individual failures; the
//! returned report lists what was left behind.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use vdb_core::{Result, ScaffoldConfig, VdbError};

use crate::CopyReport;

// ============================================================================
// Exclusion Filter
// ============================================================================

/// Folder names and file suffixes skipped by `copy_recursive`
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    dirs: HashSet<String>,
    suffixes: Vec<String>,
}

impl ExclusionFilter {
    /// A filter that excludes nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude folders with this exact name
    pub fn exclude_dir(mut self, name: impl Into<String>) -> Self {
        self.dirs.insert(name.into());
        self
    }

    /// Exclude files whose name ends with this suffix
    pub fn exclude_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffixes.push(suffix.into());
        self
    }

    /// Build from scaffold configuration
    pub fn from_config(config: &ScaffoldConfig) -> Self {
        let filter = config
            .excluded_dirs
            .iter()
            .fold(Self::new(), |f, dir| f.exclude_dir(dir.as_str()));
        config
            .excluded_extensions
            .iter()
            .fold(filter, |f, ext| f.exclude_suffix(ext.as_str()))
    }

    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.dirs.contains(name)
    }

    /// Suffix match, so multi-part extensions like `.d.ts` work
    pub fn is_excluded_file(&self, name: &str) -> bool {
        self.suffixes.iter().any(|suffix| name.ends_with(suffix.as_str()))
    }
}

// ============================================================================
// Copy Operations
// ============================================================================

/// Copy a list of files, given relative to `src`, to the same place under `dest`
pub async fn copy_essential_files(
    src: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    files: &[String],
) -> CopyReport {
    let (src, dest) = (src.as_ref(), dest.as_ref());
    let mut report = CopyReport::default();

    for file in files {
        let src_file = src.join(file);
        let dest_file = dest.join(file);

        match tokio::fs::try_exists(&src_file).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("Source file \"{}\" does not exist.", src_file.display());
                report.missing.push(src_file);
                continue;
            }
            Err(e) => {
                warn!(path = %src_file.display(), error = %e, "Cannot stat source file");
                report.failed.push((src_file, e.to_string()));
                continue;
            }
        }

        match copy_file(&src_file, &dest_file).await {
            Ok(()) => report.copied += 1,
            Err(e) => {
                warn!(error = %e, "Error copying essential file");
                report.failed.push((src_file, e.to_string()));
            }
        }
    }

    report
}

/// Mirror `src` into `dest`, skipping entries matched by `filter`
///
/// A missing `src` is an error; failures below it are recorded in the report.
pub async fn copy_recursive(
    src: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    filter: &ExclusionFilter,
) -> Result<CopyReport> {
    let (src, dest) = (src.as_ref(), dest.as_ref());

    match tokio::fs::metadata(src).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(VdbError::NotADirectory(src.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(VdbError::SourceNotFound(src.to_path_buf()))
        }
        Err(e) => return Err(VdbError::io(src, e)),
    }

    let mut report = CopyReport::default();
    let mut pending: Vec<(PathBuf, PathBuf)> = vec![(src.to_path_buf(), dest.to_path_buf())];

    while let Some((from_dir, to_dir)) = pending.pop() {
        if let Err(e) = tokio::fs::create_dir_all(&to_dir).await {
            warn!(path = %to_dir.display(), error = %e, "Cannot create directory");
            report.failed.push((to_dir, e.to_string()));
            continue;
        }

        let mut entries = match tokio::fs::read_dir(&from_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %from_dir.display(), error = %e, "Cannot read directory");
                report.failed.push((from_dir, e.to_string()));
                continue;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    report.failed.push((from_dir.clone(), e.to_string()));
                    break;
                }
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            let from = entry.path();
            let to = to_dir.join(&name);

            let is_dir = match entry.file_type().await {
                Ok(file_type) => file_type.is_dir(),
                Err(e) => {
                    report.failed.push((from, e.to_string()));
                    continue;
                }
            };

            if is_dir {
                if filter.is_excluded_dir(&name) {
                    debug!(path = %from.display(), "Excluded directory");
                    report.excluded += 1;
                } else {
                    pending.push((from, to));
                }
            } else if filter.is_excluded_file(&name) {
                debug!(path = %from.display(), "Excluded file");
                report.excluded += 1;
            } else {
                match tokio::fs::copy(&from, &to).await {
                    Ok(_) => report.copied += 1,
                    Err(e) => {
                        warn!(path = %from.display(), error = %e, "Error copying file");
                        report.failed.push((from, e.to_string()));
                    }
                }
            }
        }
    }

    Ok(report)
}

async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| VdbError::io(parent, e))?;
    }
    tokio::fs::copy(from, to)
        .await
        .map_err(|e| VdbError::io(from, e))?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
