//! Errors from the push pipeline (spec.md §4.5).

use thiserror::Error;

use crate::diff::ConflictError;
use crate::format::FormatError;
use crate::store::StoreError;

use super::markers::MarkersError;
use super::provider::ProviderError;

/// Errors `push_node`/`resolve_conflict` can fail with. A rejected push
/// reported by a `Provider` is not one of these — it's recorded in
/// [`super::PushStats::errors`] and the batch continues (spec.md §4.6:
/// "push errors are recorded per-node and do not halt the batch").
#[derive(Debug, Error)]
pub enum PushError {
    /// No `Provider` is registered for the node id's scheme.
    #[error("no provider registered for scheme '{scheme}' (node '{node_id}')")]
    NoProvider {
        /// The node id that needed a provider.
        node_id: String,
        /// The scheme extracted from the id.
        scheme: String,
    },
    /// The node does not exist in the Store.
    #[error("no such node '{node_id}'")]
    NodeNotFound {
        /// The node id that was looked up.
        node_id: String,
    },
    /// The node has no open conflict artifact to resolve.
    #[error("no conflict artifact is open for node '{node_id}'")]
    NoConflictArtifact {
        /// The node id passed to `resolve_conflict`.
        node_id: String,
    },
    /// A resolution named a field the artifact didn't record as diverged.
    #[error("'{field}' is not a diverged field on node '{node_id}'")]
    UnknownField {
        /// The node id passed to `resolve_conflict`.
        node_id: String,
        /// The field name from the caller's resolution map.
        field: String,
    },
    /// The local view file could not be read or parsed.
    #[error("{0}")]
    Format(#[from] FormatError),
    /// Change detection or classification failed.
    #[error("{0}")]
    Conflict(#[from] ConflictError),
    /// A Store operation failed.
    #[error("{0}")]
    Store(#[from] StoreError),
    /// An I/O error occurred reading or writing the view file.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// The conflict artifact's marker body could not be parsed.
    #[error("{0}")]
    Markers(#[from] MarkersError),
    /// The resolved push still failed at the Provider after a
    /// `resolve_conflict` call — per spec.md §4.5 step 4, this aborts
    /// without clearing the artifact.
    #[error("push failed for '{node_id}': {message}")]
    ProviderRejected {
        /// The node id being resolved.
        node_id: String,
        /// The Provider's error message.
        message: String,
    },
    /// The batch's [`crate::concurrency::CancellationToken`] was tripped
    /// before this node could be processed.
    #[error(transparent)]
    Cancelled(#[from] crate::concurrency::Cancelled),
}

impl From<ProviderError> for PushError {
    fn from(err: ProviderError) -> Self {
        Self::ProviderRejected { node_id: err.node_id, message: err.message }
    }
}
