//! Errors from a view refresh (spec.md §4.3).

use std::path::PathBuf;

use thiserror::Error;

/// Errors a view refresh can encounter. Per spec.md §4.3's failure modes,
/// a single render-entry or file failure is recorded per-file and does not
/// abort the rest of the refresh; this type is for the cross-cutting
/// failures that do.
#[derive(Debug, Error)]
pub enum MaterializeError {
    /// The view's `query` clause failed to parse or evaluate.
    #[error("view query failed: {0}")]
    Query(#[from] crate::query::QueryError),
    /// A Store operation failed (watermark read/write, node lookup).
    #[error("store error during refresh: {0}")]
    Store(#[from] crate::store::StoreError),
    /// The view directory itself could not be walked.
    #[error("failed to read view directory '{path}': {source}")]
    WalkViewDir {
        /// The view's root directory.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The `.index` sidecar could not be written.
    #[error("failed to write '.index' sidecar at '{path}': {source}")]
    WriteIndex {
        /// Path to the sidecar file.
        path: PathBuf,
        /// Underlying I/O or YAML-encoding error.
        #[source]
        source: IndexWriteError,
    },
    /// The refresh's [`crate::concurrency::CancellationToken`] was tripped
    /// before the refresh could finish.
    #[error(transparent)]
    Cancelled(#[from] crate::concurrency::Cancelled),
}

impl From<crate::error::HardcopyError> for MaterializeError {
    fn from(err: crate::error::HardcopyError) -> Self {
        match err {
            crate::error::HardcopyError::Query(e) => Self::Query(e),
            crate::error::HardcopyError::Store(e) => Self::Store(e),
            crate::error::HardcopyError::Io(source) => {
                Self::WalkViewDir { path: PathBuf::new(), source }
            }
            other => Self::Store(crate::store::StoreError::Io(std::io::Error::other(other.to_string()))),
        }
    }
}

/// The two ways writing the `.index` sidecar can fail.
#[derive(Debug, Error)]
pub enum IndexWriteError {
    /// Serializing the sidecar to YAML failed.
    #[error("YAML encoding failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Writing the encoded sidecar to disk failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
