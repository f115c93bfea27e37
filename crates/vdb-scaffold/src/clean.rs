//! Directory cleanup

use std::path::Path;

use tracing::debug;
use vdb_core::{Result, VdbError};

/// Remove everything inside `dir`, keeping `dir` itself
///
/// Returns the number of top-level entries removed. Stops at the first
/// entry that cannot be removed.
pub async fn clean_directory(dir: impl AsRef<Path>) -> Result<usize> {
    let dir = dir.as_ref();

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(VdbError::SourceNotFound(dir.to_path_buf()))
        }
        Err(e) => return Err(VdbError::io(dir, e)),
    };

    let mut removed = 0;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| VdbError::io(dir, e))?
    {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| VdbError::io(&path, e))?;

        // Symlinks are unlinked, never followed.
        let outcome = if file_type.is_dir() {
            tokio::fs::remove_dir_all(&path).await
        } else {
            tokio::fs::remove_file(&path).await
        };
        outcome.map_err(|e| VdbError::io(&path, e))?;

        debug!(path = %path.display(), "Removed");
        removed += 1;
    }

    Ok(removed)
}
