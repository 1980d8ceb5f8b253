//! Unified error type for hardcopy-core operations.
//!
//! Each variant's `Display` impl states what went wrong and, where there's
//! an obvious next step, how to fix it. No provider- or CLI-specific
//! concepts leak in here — those stay in their own crates.

use std::fmt;

use crate::config::ConfigError;
use crate::diff::ConflictError;
use crate::query::QueryError;
use crate::store::StoreError;

/// Unified error type for hardcopy-core operations.
#[derive(Debug)]
pub enum HardcopyError {
    /// `hardcopy.yaml` could not be loaded or parsed.
    Config(ConfigError),
    /// A Store operation failed (I/O, corruption, or a malformed request).
    Store(StoreError),
    /// A graph query pattern failed to parse.
    Query(QueryError),
    /// Three-way conflict classification failed for reasons other than an
    /// ordinary divergence (divergence itself is not an error — it's
    /// recorded as a conflict artifact).
    Conflict(ConflictError),
    /// No `Provider` is registered for a node id's scheme.
    NoProvider {
        /// The node id that needed a provider.
        node_id: String,
        /// The scheme extracted from the id.
        scheme: String,
    },
    /// An I/O error occurred outside the Store (e.g. rendering a view file).
    Io(std::io::Error),
}

impl fmt::Display for HardcopyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}\n  To fix: edit hardcopy.yaml and correct the issue."),
            Self::Store(err) => write!(f, "store error: {err}"),
            Self::Query(err) => write!(f, "query error: {err}"),
            Self::Conflict(err) => write!(f, "conflict detection error: {err}"),
            Self::NoProvider { node_id, scheme } => write!(
                f,
                "no provider registered for scheme '{scheme}' (node '{node_id}').\n  To fix: register a Provider for this scheme before pushing."
            ),
            Self::Io(err) => write!(
                f,
                "I/O error: {err}\n  To fix: check file permissions and disk space."
            ),
        }
    }
}

impl std::error::Error for HardcopyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Query(err) => Some(err),
            Self::Conflict(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::NoProvider { .. } => None,
        }
    }
}

impl From<std::io::Error> for HardcopyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ConfigError> for HardcopyError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<StoreError> for HardcopyError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<QueryError> for HardcopyError {
    fn from(err: QueryError) -> Self {
        Self::Query(err)
    }
}

impl From<ConflictError> for HardcopyError {
    fn from(err: ConflictError) -> Self {
        Self::Conflict(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_provider_message_names_scheme_and_node() {
        let err = HardcopyError::NoProvider {
            node_id: "github:owner/repo#1".to_owned(),
            scheme: "github".to_owned(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("github"));
        assert!(msg.contains("owner/repo#1"));
    }

    #[test]
    fn config_message_includes_path_and_detail() {
        let err = HardcopyError::Config(ConfigError::Invalid {
            path: std::path::PathBuf::from("hardcopy.yaml"),
            detail: "missing 'views' key".to_owned(),
        });
        let msg = format!("{err}");
        assert!(msg.contains("hardcopy.yaml"));
        assert!(msg.contains("missing 'views' key"));
    }
}
