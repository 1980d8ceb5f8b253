//! [`Edge`] — a directed, typed relation between two node ids (spec §3).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A directed edge. `(type, from_id, to_id)` is unique; referential
/// integrity with `nodes` is not enforced — dangling edges are allowed and
/// simply ignored during traversal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Namespaced relation label, e.g. `"github.blocks"`.
    pub edge_type: String,
    /// Source node id.
    pub from_id: String,
    /// Destination node id.
    pub to_id: String,
    /// Optional edge attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<serde_json::Map<String, Value>>,
}

impl Edge {
    /// Construct a new edge with no attributes.
    #[must_use]
    pub fn new(edge_type: impl Into<String>, from_id: impl Into<String>, to_id: impl Into<String>) -> Self {
        Self {
            edge_type: edge_type.into(),
            from_id: from_id.into(),
            to_id: to_id.into(),
            attrs: None,
        }
    }

    /// The `(type, from_id, to_id)` identity tuple used as the unique key.
    #[must_use]
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.edge_type, &self.from_id, &self.to_id)
    }
}
