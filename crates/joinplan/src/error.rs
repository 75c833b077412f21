//! Error types for joinplan

use std::path::PathBuf;
use thiserror::Error;

/// Result type for joinplan operations.
pub type PlanResult<T> = Result<T, PlanError>;

/// Hard failures.
///
/// Schema shape problems never show up here: they are reported as [`crate::PlanIssue`]s and
/// resolution continues with whatever is available.
#[derive(Debug, Error)]
pub enum PlanError {
    /// A schema document could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A schema document is not valid YAML.
    #[error("failed to parse {origin}: {source}")]
    Yaml {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },
    /// Serialization of a plan failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// A table was requested by name but the catalog does not contain it.
    #[error("table not found: {0}")]
    TableNotFound(String),
}

impl PlanError {
    /// Create an IO error for a specific path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
