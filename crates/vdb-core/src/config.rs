//! VDB Configuration Management
//!
//! Handles configuration from config files and environment variables
//! with defaults matching the conventional project layout.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name the local index persists its state under
pub const INDEX_FILE_NAME: &str = "index.json";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Vector store locations and query defaults
    pub store: StoreConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Project scaffolding helpers
    pub scaffold: ScaffoldConfig,
}

impl AppConfig {
    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Load from an optional file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_env_override()
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("VDB_SOURCE_DIR") {
            self.store.source_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("VDB_INDEX_DIR") {
            self.store.index_dir = PathBuf::from(dir);
        }
        if let Some(k) = lookup("VDB_TOP_K") {
            self.store.default_top_k = k.parse().map_err(|_| ConfigError::InvalidValue {
                key: "VDB_TOP_K".to_string(),
                value: k,
            })?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(self)
    }

    /// Path of the index file a fresh run deletes beforehand
    pub fn stale_index_file(&self) -> PathBuf {
        self.store.index_dir.join(INDEX_FILE_NAME)
    }
}

/// Vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory whose files are ingested
    pub source_dir: PathBuf,

    /// Directory the index persists into
    pub index_dir: PathBuf,

    /// Number of results returned by a query when none is given
    pub default_top_k: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("assets/read"),
            index_dir: PathBuf::from("assets/db/vector_store"),
            default_top_k: 3,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Scaffolding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaffoldConfig {
    /// Files copied by the essentials command, relative to the source root
    pub essential_files: Vec<String>,

    /// Directory names never copied recursively
    pub excluded_dirs: Vec<String>,

    /// File name suffixes never copied recursively
    pub excluded_extensions: Vec<String>,
}

impl Default for ScaffoldConfig {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();

        Self {
            essential_files: owned(&[
                ".eslintrc.js",
                ".gitignore",
                ".npmignore",
                ".nvmrc",
                ".prettierrc",
                ".yo-rc.json",
                "gulpfile.js",
                "package.json",
                "tsconfig.json",
                "config/config.json",
                "config/deploy-azure-storage.json",
                "config/package-solution.json",
                "config/sass.json",
                "config/serve.json",
                "config/write-manifests.json",
            ]),
            excluded_dirs: owned(&[
                ".git",
                ".vscode",
                "node_modules",
                "dist",
                "lib",
                "release",
                "sharepoint",
                "teams",
                "temp",
            ]),
            excluded_extensions: owned(&[".d.ts", ".map", ".scss", ".css", ".png", ".scss.ts"]),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.store.default_top_k, 3);
        assert_eq!(config.logging.level, "info");
        assert_eq!(
            config.stale_index_file(),
            PathBuf::from("assets/db/vector_store/index.json")
        );
        assert_eq!(config.scaffold.essential_files.len(), 15);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vdb.toml");
        std::fs::write(&path, "[store]\nindex_dir = \"/tmp/idx\"\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.store.index_dir, PathBuf::from("/tmp/idx"));
        assert_eq!(config.store.source_dir, PathBuf::from("assets/read"));
        assert_eq!(config.store.default_top_k, 3);
        assert!(config.scaffold.excluded_dirs.contains(&"node_modules".to_string()));
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileReadError { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("VDB_SOURCE_DIR", "/data/src"),
            ("VDB_TOP_K", "7"),
            ("LOG_LEVEL", "debug"),
        ]
        .into_iter()
        .collect();

        let config = AppConfig::default()
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.store.source_dir, PathBuf::from("/data/src"));
        assert_eq!(config.store.default_top_k, 7);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_invalid_top_k() {
        let err = AppConfig::default()
            .apply_overrides(|key| (key == "VDB_TOP_K").then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
