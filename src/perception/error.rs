use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or querying a dataset
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} has version {found}, expected {expected}")]
    Version {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("No {pattern} files found under {root}")]
    NotFound { root: PathBuf, pattern: String },

    #[error("Can't find records associated with definition id {0}")]
    DefinitionId(String),

    #[error("Malformed record: {0}")]
    Malformed(String),
}

impl DatasetError {
    /// True for the one recoverable condition: the requested definition does not exist.
    pub fn is_definition_missing(&self) -> bool {
        matches!(self, DatasetError::DefinitionId(_))
    }
}
