//! Workspace configuration: `<root>/hardcopy.yaml` (spec.md §6).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Map as JsonMap;
use thiserror::Error;

use crate::materialize::ViewDefinition;

/// Errors loading or parsing `hardcopy.yaml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("could not read '{path}': {source}")]
    Io {
        /// Path that was opened.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file's contents are not valid YAML, or don't match the expected
    /// shape.
    #[error("could not parse '{path}': {source}")]
    Parse {
        /// Path that was parsed.
        path: PathBuf,
        /// The underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },
    /// The file parsed but violates a semantic constraint (e.g. a
    /// duplicate source name or view path).
    #[error("invalid configuration in '{path}': {detail}")]
    Invalid {
        /// Path that was validated.
        path: PathBuf,
        /// What's wrong with it.
        detail: String,
    },
}

/// One configured remote source (spec.md §6: `sources: [{name, provider,
/// ...provider-specific}]`). Provider-specific keys are captured as opaque
/// JSON and handed to whatever constructs the `Provider` for `provider`;
/// the core never interprets them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// The scheme this source's node ids use (e.g. `"github"`).
    pub name: String,
    /// Which Provider implementation to construct.
    pub provider: String,
    /// Provider-specific settings (auth, base URL, repo slug, ...).
    #[serde(flatten)]
    pub settings: JsonMap<String, serde_json::Value>,
}

/// Parsed `hardcopy.yaml`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HardcopyConfig {
    /// Remote sources and the Provider each binds to.
    pub sources: Vec<SourceConfig>,
    /// Materialized views.
    pub views: Vec<ViewDefinition>,
    /// Opaque hook configuration — an external-collaborator concern the
    /// core carries but never executes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks: Option<serde_json::Value>,
    /// Opaque service configuration — same treatment as `hooks`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<serde_json::Value>,
}

impl HardcopyConfig {
    /// Load and validate `hardcopy.yaml` from `path`.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file can't be read, doesn't parse as
    /// YAML in the expected shape, or names a source/view more than once.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let config: Self =
            serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for source in &self.sources {
            if !names.insert(source.name.as_str()) {
                return Err(ConfigError::Invalid {
                    path: path.to_path_buf(),
                    detail: format!("duplicate source name '{}'", source.name),
                });
            }
        }
        let mut paths = HashSet::new();
        for view in &self.views {
            if !paths.insert(view.path.clone()) {
                return Err(ConfigError::Invalid {
                    path: path.to_path_buf(),
                    detail: format!("duplicate view path '{}'", view.path.display()),
                });
            }
        }
        Ok(())
    }
}

/// Read `$HARDCOPY_ME`, falling back to `$GITHUB_USER`, for binding as the
/// `$me` query parameter (spec.md §6).
#[must_use]
pub fn me_from_env() -> Option<String> {
    pick_me(std::env::var("HARDCOPY_ME").ok().as_deref(), std::env::var("GITHUB_USER").ok().as_deref())
}

fn pick_me(hardcopy_me: Option<&str>, github_user: Option<&str>) -> Option<String> {
    hardcopy_me.or(github_user).map(str::to_owned)
}
