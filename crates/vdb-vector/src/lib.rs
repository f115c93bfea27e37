//! VDB Vector - Vector index abstraction
//!
//! Provides the capability interface over vector indexes and
//! the text vectorizers that feed them.

use async_trait::async_trait;
use uuid::Uuid;
use vdb_core::{IndexedItem, Item, QueryResult, Result};

pub mod embedding;
pub mod local_store;

pub use embedding::{CharCodeVectorizer, Vectorizer};
pub use local_store::LocalIndex;

/// Trait for vector index operations
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Whether persistent storage has been initialized
    async fn is_index_created(&self) -> Result<bool>;

    /// Initialize persistent storage (callers check `is_index_created` first)
    async fn create_index(&self) -> Result<()>;

    /// Remove persistent storage; a missing index is not an error
    async fn delete_index(&self) -> Result<()>;

    /// Store an item, returning it with its assigned identity
    async fn insert_item(&self, item: Item) -> Result<IndexedItem>;

    /// Return up to `k` items most similar to `vector`, best first
    async fn query_items(&self, vector: &[f32], k: usize) -> Result<Vec<QueryResult>>;

    /// All stored items in insertion order
    async fn list_items(&self) -> Result<Vec<IndexedItem>>;

    /// Look up a single item
    async fn get_item(&self, id: Uuid) -> Result<Option<IndexedItem>>;

    /// Remove a single item, returning whether it existed
    async fn delete_item(&self, id: Uuid) -> Result<bool>;

    /// Number of stored items
    async fn item_count(&self) -> Result<usize> {
        Ok(self.list_items().await?.len())
    }
}
