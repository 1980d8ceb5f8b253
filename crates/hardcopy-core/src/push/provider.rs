//! The `Provider` contract (spec.md §4.6) and a registry that dispatches by
//! a node id's scheme (the `scheme:` prefix, e.g. `"github"` in
//! `"github:owner/repo#1"`).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::model::Node;

use super::pipeline::EffectiveChange;

/// An error a `Provider` reports back to the pipeline: recorded per-node,
/// never fatal to the batch (spec.md §4.6).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderError {
    /// The node id the operation was for.
    pub node_id: String,
    /// Human-readable description of the failure.
    pub message: String,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProviderError {}

/// The result of fetching a node's current remote state.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchResult {
    /// The current remote node, or `None` if it no longer exists upstream.
    pub node: Option<Node>,
    /// `true` if the Provider can assert nothing has changed since the last
    /// fetch, letting callers skip re-classification (spec.md §4.6).
    pub cached: bool,
}

/// The result of a successful push.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct PushSuccess {
    /// An updated opaque version token, if the Provider issues one.
    pub version_token: Option<String>,
}

/// An external entity source/sink: GitHub, Jira, a filesystem mirror of
/// another system, etc. The push pipeline consumes only this surface
/// (spec.md §4.6); auth, rate limiting, and transport are the
/// implementation's concern.
pub trait Provider: Send + Sync {
    /// A short, stable name for diagnostics (e.g. `"github"`).
    fn name(&self) -> &str;

    /// Fetch the current remote state of `id`.
    ///
    /// # Errors
    /// Returns [`ProviderError`] if the fetch itself fails (not found is
    /// represented by `FetchResult { node: None, .. }`, not an error).
    fn fetch_node(&self, id: &str) -> Result<FetchResult, ProviderError>;

    /// Push `changes` (the effective values computed by C4) against `base`,
    /// the node as last known to the Store.
    ///
    /// # Errors
    /// Returns [`ProviderError`] if the remote write is rejected.
    fn push(&self, base: &Node, changes: &[EffectiveChange]) -> Result<PushSuccess, ProviderError>;
}

/// The scheme prefix of a node id (`"github"` in `"github:owner/repo#1"`),
/// or the whole id if it carries no `:`.
#[must_use]
pub fn scheme_of(id: &str) -> &str {
    id.split_once(':').map_or(id, |(scheme, _)| scheme)
}

/// Maps a node id's scheme to the `Provider` registered for it.
#[derive(Default)]
pub struct ProviderRegistry {
    by_scheme: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` for `scheme`, replacing any prior registration.
    pub fn register(&mut self, scheme: impl Into<String>, provider: Arc<dyn Provider>) {
        self.by_scheme.insert(scheme.into(), provider);
    }

    /// The provider registered for `id`'s scheme, if any.
    #[must_use]
    pub fn provider_for(&self, id: &str) -> Option<Arc<dyn Provider>> {
        self.by_scheme.get(scheme_of(id)).cloned()
    }
}

/// An in-memory `Provider` test double: holds a fixed remote node table and
/// records every `push` call so tests can assert on what was sent.
pub struct MemoryProvider {
    name: String,
    remote: Mutex<HashMap<String, Node>>,
    /// Every accepted push, in call order: `(node_id, changes)`.
    pub pushes: Mutex<Vec<(String, Vec<EffectiveChange>)>>,
    /// Node ids whose next push should fail with this message.
    pub fail_next_push_for: Mutex<HashMap<String, String>>,
}

impl MemoryProvider {
    /// A provider named `name`, seeded with `remote`'s initial node states.
    #[must_use]
    pub fn new(name: impl Into<String>, remote: Vec<Node>) -> Self {
        Self {
            name: name.into(),
            remote: Mutex::new(remote.into_iter().map(|n| (n.id.clone(), n)).collect()),
            pushes: Mutex::new(Vec::new()),
            fail_next_push_for: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the remote state for `id` (simulates a concurrent upstream
    /// edit between fetch and push).
    pub fn set_remote(&self, node: Node) {
        self.remote.lock().unwrap().insert(node.id.clone(), node);
    }

    /// Make the next `push` for `id` fail with `message`.
    pub fn fail_next_push(&self, id: impl Into<String>, message: impl Into<String>) {
        self.fail_next_push_for.lock().unwrap().insert(id.into(), message.into());
    }
}

impl Provider for MemoryProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_node(&self, id: &str) -> Result<FetchResult, ProviderError> {
        Ok(FetchResult { node: self.remote.lock().unwrap().get(id).cloned(), cached: false })
    }

    fn push(&self, base: &Node, changes: &[EffectiveChange]) -> Result<PushSuccess, ProviderError> {
        if let Some(message) = self.fail_next_push_for.lock().unwrap().remove(&base.id) {
            return Err(ProviderError { node_id: base.id.clone(), message });
        }
        let mut remote = self.remote.lock().unwrap();
        let node = remote.entry(base.id.clone()).or_insert_with(|| base.clone());
        for change in changes {
            node.attrs.insert(change.field.clone(), change.value.clone());
        }
        drop(remote);
        self.pushes.lock().unwrap().push((base.id.clone(), changes.to_vec()));
        Ok(PushSuccess { version_token: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_of_splits_on_first_colon() {
        assert_eq!(scheme_of("github:owner/repo#1"), "github");
        assert_eq!(scheme_of("no-scheme-here"), "no-scheme-here");
    }

    #[test]
    fn registry_dispatches_by_scheme() {
        let mut registry = ProviderRegistry::new();
        registry.register("github", Arc::new(MemoryProvider::new("github", Vec::new())));
        assert!(registry.provider_for("github:owner/repo#1").is_some());
        assert!(registry.provider_for("jira:PROJ-1").is_none());
    }

    #[test]
    fn memory_provider_records_pushes_and_applies_changes() {
        let node = Node::new("github:a#1", "github.Issue", crate::model::Attrs::new(), 0).unwrap();
        let provider = MemoryProvider::new("github", vec![node.clone()]);
        let changes = vec![EffectiveChange { field: "state".to_owned(), value: serde_json::json!("closed") }];
        provider.push(&node, &changes).unwrap();

        assert_eq!(provider.pushes.lock().unwrap().len(), 1);
        let fetched = provider.fetch_node("github:a#1").unwrap().node.unwrap();
        assert_eq!(fetched.attr("state"), Some(&serde_json::json!("closed")));
    }

    #[test]
    fn memory_provider_can_be_made_to_fail_once() {
        let node = Node::new("github:a#1", "github.Issue", crate::model::Attrs::new(), 0).unwrap();
        let provider = MemoryProvider::new("github", vec![node.clone()]);
        provider.fail_next_push("github:a#1", "rate limited");

        let err = provider.push(&node, &[]).unwrap_err();
        assert_eq!(err.message, "rate limited");
        // Second attempt succeeds; the failure was one-shot.
        provider.push(&node, &[]).unwrap();
    }
}
