//! `.index` sidecar written next to each materialized view directory
//! (SPEC_FULL.md §6 expansion): `{loaded, page_size, last_fetch, ttl_secs}`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::IndexWriteError;

/// Advisory metadata about a view's most recent refresh.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexSidecar {
    /// Number of nodes selected by the view's query on this refresh.
    pub loaded: usize,
    /// Page size used for paginated Provider fetches feeding this view (a
    /// caller-supplied hint; the core does not paginate itself).
    pub page_size: usize,
    /// RFC3339 timestamp of this refresh.
    pub last_fetch: String,
    /// Advisory time-to-live before a refresh should be considered stale.
    pub ttl_secs: u64,
}

impl IndexSidecar {
    /// Write this sidecar as `<view_dir>/.index`.
    ///
    /// # Errors
    /// Returns [`IndexWriteError`] if YAML encoding or the write fails.
    pub fn write(&self, view_dir: &Path) -> Result<(), IndexWriteError> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(view_dir.join(".index"), yaml)?;
        Ok(())
    }

    /// Read a previously written sidecar, if present.
    ///
    /// # Errors
    /// Returns `Ok(None)` if no sidecar exists; propagates I/O or decode
    /// failures otherwise.
    pub fn read(view_dir: &Path) -> Result<Option<Self>, IndexWriteError> {
        let path = view_dir.join(".index");
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path)?;
        Ok(Some(serde_yaml::from_str(&text)?))
    }
}
