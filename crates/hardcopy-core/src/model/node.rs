//! [`Node`] — the canonical server-side state of a synced entity (spec §3).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An ordered field-name → value mapping, preserving insertion order the
/// way front-matter and provider payloads present their fields.
pub type Attrs = IndexMap<String, Value>;

/// The canonical server-side state of an entity, as last refreshed from its
/// Provider.
///
/// `id` is conventionally `<scheme>:<path>#<fragment>` but is opaque to the
/// core — nothing here parses it except the push pipeline's scheme lookup
/// (see `push::provider::scheme_of`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Globally unique identifier. Primary key.
    pub id: String,
    /// Namespaced label, e.g. `"github.Issue"`. Never empty.
    pub node_type: String,
    /// Ordered field-name → value mapping.
    pub attrs: Attrs,
    /// Monotonic timestamp (Unix millis) of the last authoritative refresh.
    pub synced_at: i64,
    /// Opaque token from the provider, if it has one.
    pub version_token: Option<String>,
    /// Opaque resumption token for paginated fetches, if applicable.
    pub cursor: Option<String>,
}

impl Node {
    /// Construct a new node, enforcing the `type` non-empty invariant.
    ///
    /// # Errors
    /// Returns [`NodeError::EmptyType`] if `node_type` is empty.
    pub fn new(
        id: impl Into<String>,
        node_type: impl Into<String>,
        attrs: Attrs,
        synced_at: i64,
    ) -> Result<Self, NodeError> {
        let node_type = node_type.into();
        if node_type.is_empty() {
            return Err(NodeError::EmptyType);
        }
        Ok(Self {
            id: id.into(),
            node_type,
            attrs,
            synced_at,
            version_token: None,
            cursor: None,
        })
    }

    /// Look up an attribute by name, returning `None` for an absent field
    /// (the spec's "unknown attribute treated as absent" rule, shared by
    /// the query evaluator and the diff detector).
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    /// The `body` attribute, or empty string if absent.
    #[must_use]
    pub fn body(&self) -> &str {
        match self.attrs.get("body") {
            Some(Value::String(s)) => s.as_str(),
            _ => "",
        }
    }
}

/// Errors constructing or validating a [`Node`].
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// `type` must be non-empty (spec §3 invariant).
    #[error("node type must not be empty")]
    EmptyType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(pairs: &[(&str, Value)]) -> Attrs {
        pairs.iter().map(|(k, v)| ((*k).to_owned(), v.clone())).collect()
    }

    #[test]
    fn rejects_empty_type() {
        let err = Node::new("x:1", "", Attrs::new(), 0).unwrap_err();
        assert!(matches!(err, NodeError::EmptyType));
    }

    #[test]
    fn attr_lookup_present_and_absent() {
        let n = Node::new("x:1", "github.Issue", attrs(&[("title", json!("hi"))]), 0).unwrap();
        assert_eq!(n.attr("title"), Some(&json!("hi")));
        assert_eq!(n.attr("missing"), None);
    }

    #[test]
    fn body_defaults_to_empty_string() {
        let n = Node::new("x:1", "t", Attrs::new(), 0).unwrap();
        assert_eq!(n.body(), "");
        let n = Node::new("x:1", "t", attrs(&[("body", json!("hello"))]), 0).unwrap();
        assert_eq!(n.body(), "hello");
    }

    #[test]
    fn serde_roundtrip_preserves_attr_order() {
        let n = Node::new(
            "x:1",
            "t",
            attrs(&[("b", json!(1)), ("a", json!(2))]),
            5,
        )
        .unwrap();
        let json = serde_json::to_string(&n).unwrap();
        let decoded: Node = serde_json::from_str(&json).unwrap();
        let keys: Vec<&str> = decoded.attrs.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }
}
