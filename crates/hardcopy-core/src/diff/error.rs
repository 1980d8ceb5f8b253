//! Errors from change detection and three-way classification (spec.md §4.4).

use thiserror::Error;

/// Errors the diff detector can fail with. Divergence itself is not an
/// error — it produces a [`crate::model::FieldConflict`] with `Diverged`
/// status, not a `Err`.
#[derive(Debug, Error)]
pub enum ConflictError {
    /// The on-disk file could not be parsed by its type's format handler.
    #[error("failed to parse '{path}': {source}")]
    Parse {
        /// Path to the unreadable file.
        path: String,
        /// The underlying parse failure.
        #[source]
        source: crate::format::FormatError,
    },
    /// Reading the on-disk file itself failed.
    #[error("failed to read '{path}': {source}")]
    Io {
        /// Path to the file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A Store lookup needed for change detection failed.
    #[error("store error during diff: {0}")]
    Store(#[from] crate::store::StoreError),
}
