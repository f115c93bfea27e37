//! VDB Core - Domain models, errors and shared types
//!
//! This crate defines the core abstractions used throughout VDB:
//! - Item, metadata and query result models
//! - Common error types
//! - Configuration management

pub mod config;

pub use config::{AppConfig, ConfigError, LoggingConfig, ScaffoldConfig, StoreConfig};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for VDB operations
#[derive(Error, Debug)]
pub enum VdbError {
    #[error("Source path does not exist: {0}")]
    SourceNotFound(PathBuf),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Index has not been created at {0}")]
    IndexNotCreated(PathBuf),

    #[error("Index already exists at {0}")]
    IndexAlreadyExists(PathBuf),

    #[error("Index error: {0}")]
    IndexError(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VdbError {
    /// Wrap an I/O error together with the path that caused it
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for VdbError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VdbError>;

// ============================================================================
// Item Types
// ============================================================================

/// Metadata stored alongside a vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMetadata {
    /// Original source text
    pub text: String,
}

/// An item to be inserted into a vector index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Numeric vector
    pub vector: Vec<f32>,

    /// Associated metadata
    pub metadata: ItemMetadata,
}

impl Item {
    /// Create a new item from a vector and its source text
    pub fn new(vector: Vec<f32>, text: impl Into<String>) -> Self {
        Self {
            vector,
            metadata: ItemMetadata { text: text.into() },
        }
    }
}

/// An item as persisted by an index, with its assigned identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedItem {
    /// Identifier assigned by the index
    pub id: Uuid,

    /// Numeric vector
    pub vector: Vec<f32>,

    /// L2 norm of `vector`, computed at insertion
    pub norm: f32,

    /// Associated metadata
    pub metadata: ItemMetadata,
}

impl IndexedItem {
    /// Original source text
    pub fn text(&self) -> &str {
        &self.metadata.text
    }
}

// ============================================================================
// Query Types
// ============================================================================

/// A single match returned by a similarity query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Similarity score (higher is better)
    pub score: f32,

    /// The matched item
    pub item: IndexedItem,
}

// ============================================================================
// Tests
// ============================================================================
