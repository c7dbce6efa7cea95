//! Error types for reading content sets.
//!
//! "Not found" is never an error here: missing files, ids, and slugs come
//! back as `None` or empty results. Only I/O failures and corrupted JSON
//! are surfaced as [`ContentError`].

use std::path::PathBuf;

use sites_query_core::models::ModelError;
use thiserror::Error;

/// Result type for content-set operations.
pub type ContentResult<T> = Result<T, ContentError>;

/// Errors that can occur while reading a content set.
#[derive(Error, Debug)]
pub enum ContentError {
    /// A file or directory could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file expected to hold JSON did not parse.
    #[error("malformed JSON in {}: {source}", .path.display())]
    MalformedJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A content item file parsed but is not an item.
    #[error("invalid content item in {}: {source}", .path.display())]
    InvalidItem {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    /// Directory walk failure.
    #[error("directory scan failed: {0}")]
    Scan(#[from] walkdir::Error),

    /// A blocking scan task panicked or was cancelled.
    #[error("scan task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ContentError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ContentError::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true when the stored content itself is corrupt.
    pub fn is_corrupt_content(&self) -> bool {
        matches!(
            self,
            ContentError::MalformedJson { .. } | ContentError::InvalidItem { .. }
        )
    }
}
