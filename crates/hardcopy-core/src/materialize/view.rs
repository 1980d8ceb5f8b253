//! View definitions: `{path, query, render, partition?, events?}`
//! (spec.md §4.3).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A query + one or more render templates that materialize a bag of nodes
/// as a set of files under `path`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewDefinition {
    /// The view's directory, relative to the workspace root. Also its
    /// unique handle.
    pub path: PathBuf,
    /// The C2 query selecting the node set this view materializes.
    pub query: String,
    /// One or more render entries; each emits one file per selected node.
    pub render: Vec<RenderEntry>,
    /// Optional partitioning of rendered files into sub-directories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<Partition>,
    /// Opaque, core-ignored hook configuration (outside the core per
    /// spec.md §9's "external collaborators").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<serde_json::Value>,
}

/// One render entry: how to name and fill a file for each selected node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderEntry {
    /// `{{expr}}` path template relative to the view's directory, e.g.
    /// `"{{attrs.number}}.md"`.
    pub path_template: String,
    /// Restrict this entry to nodes of this type (any type if absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    /// A custom `{{expr}}` body template. If absent, the format handler
    /// registered for the node's type renders the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

/// Groups rendered files into sub-directories keyed by an attribute value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    /// The attribute (dotted path, e.g. `"attrs.status"`) to partition by.
    pub by: String,
    /// Sub-directory name used when `by` is absent on a node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_a_minimal_view() {
        let yaml = "path: issues\nquery: \"(x:github.Issue)\"\nrender:\n  - path_template: \"{{id}}.md\"\n";
        let view: ViewDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(view.path, PathBuf::from("issues"));
        assert_eq!(view.render.len(), 1);
        assert!(view.partition.is_none());
    }

    #[test]
    fn deserializes_partition_and_custom_template() {
        let yaml = "
path: issues
query: \"(x:github.Issue)\"
render:
  - path_template: \"{{attrs.number}}.md\"
    node_type: github.Issue
    template: \"# {{attrs.title}}\\n\\n{{attrs.body}}\"
partition:
  by: attrs.status
  fallback: unsorted
";
        let view: ViewDefinition = serde_yaml::from_str(yaml).unwrap();
        let entry = &view.render[0];
        assert_eq!(entry.node_type.as_deref(), Some("github.Issue"));
        assert!(entry.template.is_some());
        let partition = view.partition.unwrap();
        assert_eq!(partition.by, "attrs.status");
        assert_eq!(partition.fallback.as_deref(), Some("unsorted"));
    }
}
