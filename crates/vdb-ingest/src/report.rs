//! Outcomes of ingestion runs and queries

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use vdb_core::QueryResult;

/// A file or directory left out of an ingestion run
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Summary of an ingestion run
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    /// Files inserted into the index
    pub files_added: usize,

    /// Entries that could not be read or stored
    pub skipped: Vec<SkippedFile>,

    /// Wall-clock duration in milliseconds
    pub elapsed_ms: u64,
}

impl IngestReport {
    pub(crate) fn skip(&mut self, path: impl Into<PathBuf>, reason: impl ToString) {
        self.skipped.push(SkippedFile {
            path: path.into(),
            reason: reason.to_string(),
        });
    }

    /// Whether every visited file made it into the index
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Result of a similarity query
#[derive(Debug, Clone)]
pub enum QueryReport {
    /// Matches, best first
    Results(Vec<QueryResult>),
    /// The index returned nothing
    NoResults,
}

impl QueryReport {
    pub fn from_results(results: Vec<QueryResult>) -> Self {
        if results.is_empty() {
            Self::NoResults
        } else {
            Self::Results(results)
        }
    }

    pub fn results(&self) -> &[QueryResult] {
        match self {
            Self::Results(results) => results,
            Self::NoResults => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::NoResults)
    }
}

impl fmt::Display for QueryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Results(results) => {
                for (i, result) in results.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "[{}] {}", result.score, result.item.text())?;
                }
                Ok(())
            }
            Self::NoResults => write!(f, "No results found."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use vdb_core::{IndexedItem, ItemMetadata};

    fn result(score: f32, text: &str) -> QueryResult {
        QueryResult {
            score,
            item: IndexedItem {
                id: Uuid::new_v4(),
                vector: vec![],
                norm: 0.0,
                metadata: ItemMetadata {
                    text: text.to_string(),
                },
            },
        }
    }

    #[test]
    fn test_no_results_display() {
        let report = QueryReport::from_results(vec![]);
        assert!(report.is_empty());
        assert_eq!(report.to_string(), "No results found.");
    }

    #[test]
    fn test_results_display() {
        let report = QueryReport::from_results(vec![result(0.5, "first"), result(0.25, "second")]);
        assert_eq!(report.to_string(), "[0.5] first\n[0.25] second");
        assert_eq!(report.results().len(), 2);
    }

    #[test]
    fn test_ingest_report_skip() {
        let mut report = IngestReport::default();
        assert!(report.is_clean());
        report.skip("/a/b.txt", "permission denied");
        assert!(!report.is_clean());
        assert_eq!(report.skipped[0].reason, "permission denied");
    }
}
