//! VDB Ingest - Directory ingestion and similarity queries
//!
//! `VectorStoreService` is a thin orchestration layer over an injected
//! vector index and vectorizer:
//! - ensures the index exists
//! - walks a directory tree and stores every regular file as an item
//! - vectorizes query text and reports the nearest items
//!
//! Author: hephaex@gmail.com

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};
use vdb_core::{IndexedItem, Item, Result, StoreConfig, VdbError};
use vdb_vector::{CharCodeVectorizer, LocalIndex, VectorIndex, Vectorizer};

pub mod report;

pub use report::{IngestReport, QueryReport, SkippedFile};

/// Default number of query results
pub const DEFAULT_TOP_K: usize = 3;

// ============================================================================
// Service State
// ============================================================================

/// Lifecycle of a `VectorStoreService`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// `init` has not run yet
    NotInitialized,
    /// Index exists, nothing ingested by this service
    Initialized,
    /// A directory walk is in progress
    Ingesting,
    /// Last ingestion finished
    Idle,
}

// ============================================================================
// Vector Store Service
// ============================================================================

/// Ingestion and query workflows over a vector index
pub struct VectorStoreService {
    /// Index backend
    index: Arc<dyn VectorIndex>,

    /// Text vectorizer
    vectorizer: Arc<dyn Vectorizer>,

    /// Result count used when a query does not give one
    default_top_k: usize,

    /// Directories never descended into, such as the index folder itself
    excluded_dirs: Vec<PathBuf>,

    state: ServiceState,
}

impl VectorStoreService {
    /// Create a new service
    pub fn new(index: Arc<dyn VectorIndex>, vectorizer: Arc<dyn Vectorizer>) -> Self {
        Self {
            index,
            vectorizer,
            default_top_k: DEFAULT_TOP_K,
            excluded_dirs: Vec::new(),
            state: ServiceState::NotInitialized,
        }
    }

    /// Create a service over a local index with the character-code vectorizer
    ///
    /// The index folder is excluded from ingestion so a store kept under
    /// the source tree never ingests its own `index.json`.
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(
            Arc::new(LocalIndex::new(&config.index_dir)),
            Arc::new(CharCodeVectorizer::new()),
        )
        .with_default_top_k(config.default_top_k)
        .with_excluded_dir(&config.index_dir)
    }

    /// Set the default result count
    pub fn with_default_top_k(mut self, k: usize) -> Self {
        self.default_top_k = k;
        self
    }

    /// Skip `dir` and everything below it during ingestion
    pub fn with_excluded_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.excluded_dirs.push(dir.into());
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Underlying index
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Create the index if it does not exist yet
    pub async fn init(&mut self) -> Result<()> {
        if !self.index.is_index_created().await? {
            info!("Creating vector index");
            self.index.create_index().await?;
        } else {
            debug!("Vector index already exists");
        }

        if self.state == ServiceState::NotInitialized {
            self.state = ServiceState::Initialized;
        }
        Ok(())
    }

    /// Vectorize `text` and store it with the text as metadata
    pub async fn add_item(&self, text: impl Into<String>) -> Result<IndexedItem> {
        let text = text.into();
        let vector = self.vectorizer.vectorize(&text);
        self.index.insert_item(Item::new(vector, text)).await
    }

    /// Store every regular file under `root`
    ///
    /// Unreadable files and subdirectories are logged and listed in the
    /// report; only a missing or unreadable root aborts the run.
    pub async fn add_files_from_directory(&mut self, root: impl AsRef<Path>) -> Result<IngestReport> {
        let root = root.as_ref();
        let start_time = Instant::now();

        match tokio::fs::metadata(root).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(VdbError::NotADirectory(root.to_path_buf())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VdbError::SourceNotFound(root.to_path_buf()))
            }
            Err(e) => return Err(VdbError::io(root, e)),
        }

        if self.state == ServiceState::NotInitialized {
            self.init().await?;
        }

        info!(root = %root.display(), vectorizer = self.vectorizer.name(), "Starting ingestion");
        self.state = ServiceState::Ingesting;
        let outcome = self.walk(root).await;
        self.state = ServiceState::Idle;

        let mut report = outcome?;
        report.elapsed_ms = start_time.elapsed().as_millis() as u64;

        info!(
            added = report.files_added,
            skipped = report.skipped.len(),
            elapsed_ms = report.elapsed_ms,
            "Ingestion finished"
        );
        Ok(report)
    }

    async fn walk(&self, root: &Path) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        let mut visited = HashSet::new();
        let mut pending = vec![root.to_path_buf()];

        // Marking excluded folders as visited keeps the walk out of them.
        // A folder that does not exist yet cannot hold anything to skip.
        let canonical_root = tokio::fs::canonicalize(root).await.ok();
        for dir in &self.excluded_dirs {
            match tokio::fs::canonicalize(dir).await {
                Ok(canonical) if Some(&canonical) == canonical_root.as_ref() => {
                    warn!(path = %dir.display(), "Excluded directory is the ingestion root, not excluding");
                }
                Ok(canonical) => {
                    debug!(path = %dir.display(), "Excluding directory from ingestion");
                    visited.insert(canonical);
                }
                Err(_) => {}
            }
        }

        while let Some(dir) = pending.pop() {
            // Symlinked directories may point back up the tree.
            let canonical = tokio::fs::canonicalize(&dir).await.unwrap_or_else(|_| dir.clone());
            if !visited.insert(canonical) {
                debug!(path = %dir.display(), "Directory already visited");
                continue;
            }

            let entries = match read_dir_sorted(&dir).await {
                Ok(entries) => entries,
                Err(e) if dir == root => return Err(e),
                Err(e) => {
                    warn!(path = %dir.display(), error = %e, "Skipping unreadable directory");
                    report.skip(&dir, e);
                    continue;
                }
            };

            let mut subdirs = Vec::new();
            for path in entries {
                match tokio::fs::metadata(&path).await {
                    Ok(meta) if meta.is_dir() => subdirs.push(path),
                    Ok(meta) if meta.is_file() => self.ingest_file(&path, &mut report).await,
                    Ok(_) => debug!(path = %path.display(), "Skipping non-regular entry"),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Skipping entry");
                        report.skip(&path, VdbError::io(&path, e));
                    }
                }
            }

            // Reversed so subdirectories pop in name order.
            pending.extend(subdirs.into_iter().rev());
        }

        Ok(report)
    }

    async fn ingest_file(&self, path: &Path, report: &mut IngestReport) {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let err = VdbError::io(path, e);
                warn!(error = %err, "Skipping unreadable file");
                report.skip(path, err);
                return;
            }
        };
        let content = String::from_utf8_lossy(&bytes).into_owned();

        info!("Adding file: {}", path.display());
        match self.add_item(content).await {
            Ok(_) => report.files_added += 1,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to store file");
                report.skip(path, e);
            }
        }
    }

    /// Return the items nearest to `text`
    ///
    /// `k` falls back to the configured default.
    pub async fn query(&self, text: &str, k: Option<usize>) -> Result<QueryReport> {
        let k = k.unwrap_or(self.default_top_k);
        let vector = self.vectorizer.vectorize(text);

        let results = self.index.query_items(&vector, k).await?;
        debug!("Query returned {} results", results.len());

        Ok(QueryReport::from_results(results))
    }
}

/// Entries of a directory, sorted by path
async fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut read_dir = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| VdbError::io(dir, e))?;

    let mut entries = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(|e| VdbError::io(dir, e))?
    {
        entries.push(entry.path());
    }
    entries.sort();

    Ok(entries)
}

// ============================================================================
// Tests
// ============================================================================
