//! Local JSON-file implementation for vector storage
//!
//! Keeps every item in a single `index.json` inside the index folder and
//! answers queries with an exhaustive cosine-similarity scan.
//!
//! Author: hephaex@gmail.com

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;
use vdb_core::config::INDEX_FILE_NAME;
use vdb_core::{IndexedItem, Item, QueryResult, Result, VdbError};

/// Format version written to new index files
const INDEX_VERSION: u32 = 1;

/// On-disk layout of `index.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexFile {
    version: u32,
    created_at: DateTime<Utc>,
    items: Vec<IndexedItem>,
}

impl IndexFile {
    fn empty() -> Self {
        Self {
            version: INDEX_VERSION,
            created_at: Utc::now(),
            items: Vec::new(),
        }
    }
}

// ============================================================================
// Similarity
// ============================================================================

/// L2 norm of a vector
pub fn l2_norm(vector: &[f32]) -> f32 {
    vector.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity between two vectors of possibly different length
///
/// The dot product runs over the shared prefix, which is the same as
/// zero-padding the shorter vector. Zero vectors score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    cosine_with_norms(a, l2_norm(a), b, l2_norm(b))
}

fn cosine_with_norms(a: &[f32], a_norm: f32, b: &[f32], b_norm: f32) -> f32 {
    let denom = a_norm * b_norm;
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    dot / denom
}

// ============================================================================
// Local Index
// ============================================================================

/// Vector index persisted as JSON in a local folder
pub struct LocalIndex {
    folder: PathBuf,
    cache: Mutex<Option<IndexFile>>,
}

impl LocalIndex {
    /// Create a handle on the index stored in `folder`
    ///
    /// Nothing touches the disk until an operation runs.
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            cache: Mutex::new(None),
        }
    }

    /// Path of the index file
    pub fn index_path(&self) -> PathBuf {
        self.folder.join(INDEX_FILE_NAME)
    }

    async fn load(&self) -> Result<IndexFile> {
        let path = self.index_path();
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VdbError::IndexNotCreated(self.folder.clone()));
            }
            Err(e) => return Err(VdbError::io(path, e)),
        };

        let file: IndexFile = serde_json::from_slice(&bytes).map_err(|e| {
            VdbError::IndexError(format!("Failed to parse {}: {e}", path.display()))
        })?;

        if file.version != INDEX_VERSION {
            return Err(VdbError::IndexError(format!(
                "Unsupported index version {} in {}",
                file.version,
                path.display()
            )));
        }

        debug!(path = %path.display(), items = file.items.len(), "Loaded index");
        Ok(file)
    }

    async fn save(&self, file: &IndexFile) -> Result<()> {
        let path = self.index_path();
        let tmp = self.folder.join(format!("{INDEX_FILE_NAME}.tmp"));
        let json = serde_json::to_vec_pretty(file)?;

        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| VdbError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| VdbError::io(&path, e))?;

        Ok(())
    }

    /// Loaded index from the cache slot, reading it from disk on first use
    async fn cached<'g>(&self, slot: &'g mut Option<IndexFile>) -> Result<&'g mut IndexFile> {
        if slot.is_none() {
            *slot = Some(self.load().await?);
        }
        slot.as_mut()
            .ok_or_else(|| VdbError::IndexNotCreated(self.folder.clone()))
    }
}

#[async_trait]
impl super::VectorIndex for LocalIndex {
    async fn is_index_created(&self) -> Result<bool> {
        let path = self.index_path();
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| VdbError::io(path, e))
    }

    async fn create_index(&self) -> Result<()> {
        if self.is_index_created().await? {
            return Err(VdbError::IndexAlreadyExists(self.folder.clone()));
        }

        tokio::fs::create_dir_all(&self.folder)
            .await
            .map_err(|e| VdbError::io(&self.folder, e))?;

        let file = IndexFile::empty();
        self.save(&file).await?;
        *self.cache.lock().await = Some(file);

        debug!(folder = %self.folder.display(), "Created index");
        Ok(())
    }

    async fn delete_index(&self) -> Result<()> {
        let mut guard = self.cache.lock().await;
        let path = self.index_path();

        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!(path = %path.display(), "Deleted index"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(VdbError::io(path, e)),
        }

        *guard = None;
        Ok(())
    }

    async fn insert_item(&self, item: Item) -> Result<IndexedItem> {
        let mut guard = self.cache.lock().await;
        let index = self.cached(&mut *guard).await?;

        let indexed = IndexedItem {
            id: Uuid::new_v4(),
            norm: l2_norm(&item.vector),
            vector: item.vector,
            metadata: item.metadata,
        };
        index.items.push(indexed.clone());

        if let Err(e) = self.save(index).await {
            // Keep the cache in step with what is on disk.
            index.items.pop();
            return Err(e);
        }

        Ok(indexed)
    }

    async fn query_items(&self, vector: &[f32], k: usize) -> Result<Vec<QueryResult>> {
        let mut guard = self.cache.lock().await;
        let index = self.cached(&mut *guard).await?;

        if k == 0 || index.items.is_empty() {
            return Ok(Vec::new());
        }

        let query_norm = l2_norm(vector);
        let mut results: Vec<QueryResult> = index
            .items
            .iter()
            .map(|item| QueryResult {
                score: cosine_with_norms(vector, query_norm, &item.vector, item.norm),
                item: item.clone(),
            })
            .collect();

        // Stable sort: ties keep insertion order.
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(k);

        Ok(results)
    }

    async fn list_items(&self) -> Result<Vec<IndexedItem>> {
        let mut guard = self.cache.lock().await;
        let index = self.cached(&mut *guard).await?;
        Ok(index.items.clone())
    }

    async fn get_item(&self, id: Uuid) -> Result<Option<IndexedItem>> {
        let mut guard = self.cache.lock().await;
        let index = self.cached(&mut *guard).await?;
        Ok(index.items.iter().find(|item| item.id == id).cloned())
    }

    async fn delete_item(&self, id: Uuid) -> Result<bool> {
        let mut guard = self.cache.lock().await;
        let index = self.cached(&mut *guard).await?;

        let Some(pos) = index.items.iter().position(|item| item.id == id) else {
            return Ok(false);
        };
        let removed = index.items.remove(pos);

        if let Err(e) = self.save(index).await {
            index.items.insert(pos, removed);
            return Err(e);
        }

        Ok(true)
    }

    async fn item_count(&self) -> Result<usize> {
        let mut guard = self.cache.lock().await;
        let index = self.cached(&mut *guard).await?;
        Ok(index.items.len())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VectorIndex;

    async fn created_index() -> (tempfile::TempDir, LocalIndex) {
        let dir = tempfile::tempdir().unwrap();
        let index = LocalIndex::new(dir.path().join("vector_store"));
        index.create_index().await.unwrap();
        (dir, index)
    }

    #[test]
    fn test_cosine_identical() {
        let score = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_mismatched_lengths() {
        // [1, 0] against [1, 0, 0] after zero-padding
        let score = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]);
        assert!((score - 1.0).abs() < 1e-6);

        let score = cosine_similarity(&[1.0], &[0.0, 1.0]);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_cosine_zero_vector_is_not_nan() {
        assert_eq!(cosine_similarity(&[], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[tokio::test]
    async fn test_create_index() {
        let dir = tempfile::tempdir().unwrap();
        let index = LocalIndex::new(dir.path().join("nested/vector_store"));

        assert!(!index.is_index_created().await.unwrap());
        index.create_index().await.unwrap();
        assert!(index.is_index_created().await.unwrap());
        assert!(index.index_path().exists());
        assert_eq!(index.item_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_twice_fails() {
        let (_dir, index) = created_index().await;
        let err = index.create_index().await.unwrap_err();
        assert!(matches!(err, VdbError::IndexAlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_operations_require_created_index() {
        let dir = tempfile::tempdir().unwrap();
        let index = LocalIndex::new(dir.path());

        let err = index
            .insert_item(Item::new(vec![1.0], "a"))
            .await
            .unwrap_err();
        assert!(matches!(err, VdbError::IndexNotCreated(_)));

        let err = index.query_items(&[1.0], 3).await.unwrap_err();
        assert!(matches!(err, VdbError::IndexNotCreated(_)));
    }

    #[tokio::test]
    async fn test_query_empty_index() {
        let (_dir, index) = created_index().await;
        let results = index.query_items(&[1.0, 2.0], 3).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_query_count_bounded_by_k() {
        let (_dir, index) = created_index().await;
        for text in ["ab", "cd", "ef", "gh"] {
            let vector = text.chars().map(|c| c as u32 as f32).collect();
            index.insert_item(Item::new(vector, text)).await.unwrap();
        }

        assert_eq!(index.query_items(&[97.0, 98.0], 10).await.unwrap().len(), 4);
        assert_eq!(index.query_items(&[97.0, 98.0], 2).await.unwrap().len(), 2);
        assert!(index.query_items(&[97.0, 98.0], 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_best_first() {
        let (_dir, index) = created_index().await;
        index
            .insert_item(Item::new(vec![0.0, 1.0], "up"))
            .await
            .unwrap();
        index
            .insert_item(Item::new(vec![1.0, 0.0], "right"))
            .await
            .unwrap();
        index
            .insert_item(Item::new(vec![1.0, 1.0], "diagonal"))
            .await
            .unwrap();

        let results = index.query_items(&[1.0, 0.1], 3).await.unwrap();
        let texts: Vec<_> = results.iter().map(|r| r.item.text()).collect();
        assert_eq!(texts, vec!["right", "diagonal", "up"]);
        assert!(results[0].score >= results[1].score);
        assert!(results[1].score >= results[2].score);
    }

    #[tokio::test]
    async fn test_persists_across_handles() {
        let (dir, index) = created_index().await;
        let inserted = index
            .insert_item(Item::new(vec![104.0, 105.0], "hi"))
            .await
            .unwrap();
        drop(index);

        let reopened = LocalIndex::new(dir.path().join("vector_store"));
        assert!(reopened.is_index_created().await.unwrap());
        let item = reopened.get_item(inserted.id).await.unwrap().unwrap();
        assert_eq!(item.text(), "hi");
        assert_eq!(item.vector, vec![104.0, 105.0]);
        assert!((item.norm - l2_norm(&[104.0, 105.0])).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_delete_item() {
        let (_dir, index) = created_index().await;
        let a = index.insert_item(Item::new(vec![1.0], "a")).await.unwrap();
        index.insert_item(Item::new(vec![2.0], "b")).await.unwrap();

        assert!(index.delete_item(a.id).await.unwrap());
        assert!(!index.delete_item(a.id).await.unwrap());

        let items = index.list_items().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text(), "b");
    }

    #[tokio::test]
    async fn test_delete_index() {
        let (_dir, index) = created_index().await;
        index.insert_item(Item::new(vec![1.0], "a")).await.unwrap();

        index.delete_index().await.unwrap();
        assert!(!index.is_index_created().await.unwrap());
        // Deleting again is fine.
        index.delete_index().await.unwrap();

        index.create_index().await.unwrap();
        assert_eq!(index.item_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_index_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(INDEX_FILE_NAME), "{ not json").unwrap();

        let index = LocalIndex::new(dir.path());
        assert!(index.is_index_created().await.unwrap());
        let err = index.list_items().await.unwrap_err();
        assert!(matches!(err, VdbError::IndexError(_)));
    }

    #[tokio::test]
    async fn test_insert_rolls_back_on_failed_save() {
        let (dir, index) = created_index().await;
        index.insert_item(Item::new(vec![1.0], "kept")).await.unwrap();

        // A directory in the temp file's place makes the save fail.
        let tmp = dir.path().join("vector_store").join("index.json.tmp");
        std::fs::create_dir(&tmp).unwrap();

        let err = index
            .insert_item(Item::new(vec![2.0], "lost"))
            .await
            .unwrap_err();
        assert!(matches!(err, VdbError::Io { .. }));
        assert_eq!(index.item_count().await.unwrap(), 1);

        let reopened = LocalIndex::new(dir.path().join("vector_store"));
        assert_eq!(reopened.item_count().await.unwrap(), 1);

        std::fs::remove_dir(&tmp).unwrap();
        index.insert_item(Item::new(vec![3.0], "later")).await.unwrap();

        let texts: Vec<String> = index
            .list_items()
            .await
            .unwrap()
            .iter()
            .map(|item| item.text().to_string())
            .collect();
        assert_eq!(texts, vec!["kept", "later"]);
    }
}
