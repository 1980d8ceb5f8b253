//! The push pipeline proper (spec.md §4.5): pre-conditions, the
//! clean/auto-merge/conflict decision, and the interactive conflict
//! resolution API.

use std::path::Path;

use serde_json::Value;

use crate::concurrency::{CancellationToken, DEFAULT_PARALLELISM, run_bounded};
use crate::diff::{changed_fields, classify_node, diverged_fields, effective_value, is_unresolvable};
use crate::format::HandlerRegistry;
use crate::model::{Attrs, ConflictArtifact, FieldConflict, FieldStatus, Node};
use crate::store::Store;

use super::PushError;
use super::markers::{parse_conflict_markers, render_conflict_body};
use super::provider::ProviderRegistry;

/// One field's push payload: the value to send to the Provider.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectiveChange {
    /// The field name.
    pub field: String,
    /// The value to push.
    pub value: Value,
}

/// What happened to one node's push attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum PushOutcome {
    /// The Provider accepted the effective changes; local state is updated.
    Pushed,
    /// Classification found nothing to push (the file matched the base, or
    /// the remote node is gone).
    Skipped,
    /// At least one field is diverged and not auto-mergeable; a conflict
    /// artifact was persisted.
    Conflict,
}

/// Aggregate stats across a batch of pushes (spec.md §4.5).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PushStats {
    /// Nodes successfully pushed.
    pub pushed: usize,
    /// Nodes with nothing to push.
    pub skipped: usize,
    /// Nodes that produced a conflict artifact.
    pub conflicts: usize,
    /// One message per node-level failure; never halts the batch.
    pub errors: Vec<String>,
    /// True if the batch's [`CancellationToken`] was tripped before every
    /// candidate was processed; some candidates at the tail of id order may
    /// not have been attempted at all.
    pub cancelled: bool,
}

/// Which side a user picked for one field of an open conflict.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Keep the locally edited value.
    Local,
    /// Take the remote value.
    Remote,
}

/// Push every `(node_id, view_rel_path)` candidate, in id order (spec.md §5:
/// "nodes are processed in deterministic order (sorted by id)"), fanned out
/// across up to [`DEFAULT_PARALLELISM`] worker threads via [`run_bounded`].
/// Aggregate stats are still attributed deterministically since `PushStats`
/// only accumulates counts, not per-thread ordering.
///
/// `token` is polled once per candidate (a batch's suspension points, per
/// spec.md §5); once tripped, candidates not yet started are skipped and
/// [`PushStats::cancelled`] is set, but candidates already in flight on
/// other worker threads still run to completion.
///
/// `force` bypasses conflict detection entirely: every editable field that
/// differs from the stored base is pushed as-is (spec.md §6: "`--force`
/// skips conflict detection entirely and is equivalent to 'take local for
/// every editable field'").
pub fn push_all(
    store: &Store,
    providers: &ProviderRegistry,
    handlers: &HandlerRegistry,
    view_root: &Path,
    candidates: &[(String, String)],
    force: bool,
    token: &CancellationToken,
) -> PushStats {
    let mut sorted: Vec<(String, String)> = candidates.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let results = run_bounded(sorted, DEFAULT_PARALLELISM, |(node_id, view_rel_path)| {
        if token.is_cancelled() {
            return Err(PushError::Cancelled(crate::concurrency::Cancelled));
        }
        push_node(store, providers, handlers, view_root, &node_id, &view_rel_path, force)
    });

    let mut stats = PushStats::default();
    for result in results {
        match result {
            Ok(PushOutcome::Pushed) => stats.pushed += 1,
            Ok(PushOutcome::Skipped) => stats.skipped += 1,
            Ok(PushOutcome::Conflict) => stats.conflicts += 1,
            Err(PushError::Cancelled(_)) => stats.cancelled = true,
            Err(e) => stats.errors.push(e.to_string()),
        }
    }
    stats
}

/// Run the full pre-conditions/decision procedure for one node (spec.md
/// §4.5). Re-reads the file and re-fetches the remote node itself, so the
/// caller's change-detection result is only a candidate signal, never
/// trusted as current.
///
/// # Errors
/// Returns [`PushError`] if no Provider is registered, the file cannot be
/// read or parsed, the fetch/push fails, or the Store cannot be updated.
pub fn push_node(
    store: &Store,
    providers: &ProviderRegistry,
    handlers: &HandlerRegistry,
    view_root: &Path,
    node_id: &str,
    view_rel_path: &str,
    force: bool,
) -> Result<PushOutcome, PushError> {
    let provider = providers.provider_for(node_id).ok_or_else(|| PushError::NoProvider {
        node_id: node_id.to_owned(),
        scheme: super::provider::scheme_of(node_id).to_owned(),
    })?;

    let base = store
        .get_node(node_id)?
        .ok_or_else(|| PushError::NodeNotFound { node_id: node_id.to_owned() })?;
    let handler = handlers.handler_for(&base.node_type);

    let file_path = view_root.join(view_rel_path);
    let content = std::fs::read_to_string(&file_path)?;
    let local = handler.parse(&content)?;

    if force {
        let changes = changed_fields(handler.editable_fields(), &base, &local);
        if changes.is_empty() {
            store.remove_conflict_artifact(node_id)?;
            return Ok(PushOutcome::Skipped);
        }
        let effective_changes: Vec<EffectiveChange> =
            changes.iter().map(|c| EffectiveChange { field: c.field.clone(), value: c.new_value.clone() }).collect();
        provider.push(&base, &effective_changes)?;

        let mut new_attrs: Attrs = base.attrs.clone();
        for change in &changes {
            new_attrs.insert(change.field.clone(), change.new_value.clone());
        }
        commit_new_attrs(store, &handler, &file_path, view_rel_path, &base, new_attrs)?;
        store.remove_conflict_artifact(node_id)?;
        return Ok(PushOutcome::Pushed);
    }

    let fetch = provider.fetch_node(node_id)?;
    let Some(remote) = fetch.node else {
        store.remove_conflict_artifact(node_id)?;
        return Ok(PushOutcome::Skipped);
    };

    let conflicts = classify_node(handler.editable_fields(), &base, &local, &remote);

    if is_unresolvable(&conflicts) {
        let diverged = diverged_fields(&conflicts);
        let body = render_conflict_body(&diverged);
        let artifact = ConflictArtifact {
            node_id: node_id.to_owned(),
            node_type: base.node_type.clone(),
            file_path: file_path.display().to_string(),
            view_rel_path: view_rel_path.to_owned(),
            detected_at: now_millis(),
            fields: diverged,
        };
        store.save_conflict_artifact(&artifact, &body)?;
        return Ok(PushOutcome::Conflict);
    }

    let effective_changes: Vec<EffectiveChange> = conflicts
        .iter()
        .filter(|c| changed_from_base(c))
        .map(|c| EffectiveChange { field: c.field.clone(), value: effective_value(c) })
        .collect();

    if effective_changes.is_empty() {
        store.remove_conflict_artifact(node_id)?;
        return Ok(PushOutcome::Skipped);
    }

    provider.push(&base, &effective_changes)?;

    apply_successful_push(store, &handler, &file_path, view_rel_path, &base, &conflicts)?;
    store.remove_conflict_artifact(node_id)?;
    Ok(PushOutcome::Pushed)
}

/// Resolve an open conflict by picking a side for each named field, then
/// re-push (spec.md §4.5's conflict-resolution API).
///
/// # Errors
/// Returns [`PushError::NoConflictArtifact`] if no artifact is open,
/// [`PushError::UnknownField`] if `resolution` names a field the artifact
/// didn't record as diverged, or propagates a parse/push/Store failure —
/// on any of the latter the artifact is left in place (spec.md §4.5 step 4:
/// "On failure, abort; do not clear the artifact").
pub fn resolve_conflict(
    store: &Store,
    providers: &ProviderRegistry,
    handlers: &HandlerRegistry,
    node_id: &str,
    resolution: &std::collections::HashMap<String, Resolution>,
) -> Result<(), PushError> {
    let (artifact, stored_body) = store
        .get_conflict_artifact(node_id)?
        .ok_or_else(|| PushError::NoConflictArtifact { node_id: node_id.to_owned() })?;
    let body = store.read_conflict_artifact_file(node_id)?.unwrap_or(stored_body);

    let known_fields = artifact.field_names();
    for field in resolution.keys() {
        if !known_fields.contains(&field.as_str()) {
            return Err(PushError::UnknownField { node_id: node_id.to_owned(), field: field.clone() });
        }
    }

    let sides = parse_conflict_markers(&body)?;
    let base = store
        .get_node(node_id)?
        .ok_or_else(|| PushError::NodeNotFound { node_id: node_id.to_owned() })?;
    let handler = handlers.handler_for(&base.node_type);
    let provider = providers.provider_for(node_id).ok_or_else(|| PushError::NoProvider {
        node_id: node_id.to_owned(),
        scheme: super::provider::scheme_of(node_id).to_owned(),
    })?;

    let mut effective_changes = Vec::new();
    let mut resolved_values: Vec<(String, Value)> = Vec::new();
    for (field, local, field_base, remote) in &sides {
        let Some(side) = resolution.get(field) else { continue };
        let chosen = match side {
            Resolution::Local => local.clone(),
            Resolution::Remote => remote.clone(),
        };
        if !values_equal(field, &chosen, field_base) {
            effective_changes.push(EffectiveChange { field: field.clone(), value: chosen.clone() });
        }
        resolved_values.push((field.clone(), chosen));
    }

    provider.push(&base, &effective_changes)?;

    let mut new_attrs = base.attrs.clone();
    for (field, value) in &resolved_values {
        new_attrs.insert(field.clone(), value.clone());
    }

    let file_path = Path::new(&artifact.file_path).to_path_buf();
    commit_new_attrs(store, &handler, &file_path, &artifact.view_rel_path, &base, new_attrs)?;
    store.remove_conflict_artifact(node_id)?;
    Ok(())
}

fn changed_from_base(conflict: &FieldConflict) -> bool {
    match conflict.status {
        FieldStatus::RemoteOnly => false,
        _ => !values_equal(&conflict.field, &effective_value(conflict), &conflict.base),
    }
}

fn values_equal(field: &str, a: &Value, b: &Value) -> bool {
    if field == "body" {
        a.as_str().unwrap_or_default().trim() == b.as_str().unwrap_or_default().trim()
    } else {
        crate::model::structural_eq(a, b)
    }
}

fn apply_successful_push(
    store: &Store,
    handler: &std::sync::Arc<dyn crate::format::FormatHandler>,
    file_path: &Path,
    view_rel_path: &str,
    base: &Node,
    conflicts: &[FieldConflict],
) -> Result<(), PushError> {
    let mut new_attrs: Attrs = base.attrs.clone();
    for conflict in conflicts {
        new_attrs.insert(conflict.field.clone(), effective_value(conflict));
    }
    commit_new_attrs(store, handler, file_path, view_rel_path, base, new_attrs)?;
    Ok(())
}

/// Build a new [`Node`] from `base` with `new_attrs` overlaid, render it to
/// `file_path`, and persist it to the Store. The shared tail of a successful
/// push, whichever path produced the final field values.
fn commit_new_attrs(
    store: &Store,
    handler: &std::sync::Arc<dyn crate::format::FormatHandler>,
    file_path: &Path,
    view_rel_path: &str,
    base: &Node,
    new_attrs: Attrs,
) -> Result<Node, PushError> {
    let mut new_node = Node::new(base.id.clone(), base.node_type.clone(), new_attrs, now_millis())
        .map_err(|e| PushError::Store(crate::store::StoreError::InvalidNode(e)))?;
    new_node.version_token = base.version_token.clone();
    new_node.cursor = base.cursor.clone();

    write_rendered_node(store, handler, file_path, view_rel_path, &new_node, base)?;
    store.upsert_node(&new_node)?;
    Ok(new_node)
}

/// Render `new_node` to `file_path`, update its body CRDT if the body
/// changed, and bump the file watermark (spec.md §4.5's post-push steps,
/// shared by both [`push_node`] and [`resolve_conflict`]).
fn write_rendered_node(
    store: &Store,
    handler: &std::sync::Arc<dyn crate::format::FormatHandler>,
    file_path: &Path,
    view_rel_path: &str,
    new_node: &Node,
    base: &Node,
) -> Result<(), PushError> {
    if new_node.body() != base.body() {
        let doc = store.crdt.load_or_create(&new_node.id)?;
        doc.set_body(new_node.body());
        store.crdt.save(&new_node.id, &doc)?;
    }

    let rendered = handler.render(new_node);
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file_path, rendered)?;
    let mtime = file_mtime_millis(file_path)?;
    store.set_file_synced_at(&new_node.id, view_rel_path, mtime)?;
    Ok(())
}

fn file_mtime_millis(path: &Path) -> std::io::Result<i64> {
    let metadata = std::fs::metadata(path)?;
    let modified = metadata.modified()?;
    let millis = modified
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0);
    Ok(millis)
}

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{FieldSpec, MarkdownFrontMatterHandler};
    use serde_json::json;
    use std::sync::Arc;

    fn fixture() -> (tempfile::TempDir, Store, HandlerRegistry, ProviderRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_in_memory(&dir.path().join(".hardcopy")).unwrap();
        let mut handlers = HandlerRegistry::with_markdown_fallback();
        handlers.register(
            "github.Issue",
            Arc::new(MarkdownFrontMatterHandler::new(vec![FieldSpec::scalar("state")])),
        );
        (dir, store, handlers, ProviderRegistry::new())
    }

    fn write_view_file(dir: &tempfile::TempDir, rel: &str, content: &str) -> String {
        let path = dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path.display().to_string()
    }

    #[test]
    fn missing_provider_is_an_error() {
        let (dir, store, handlers, providers) = fixture();
        let node = Node::new("gh:a#1", "github.Issue", Attrs::new(), 0).unwrap();
        store.upsert_node(&node).unwrap();
        write_view_file(&dir, "issues/1.md", "---\n_id: gh:a#1\n_type: github.Issue\nstate: open\n---\nhi\n");

        let err = push_node(&store, &providers, &handlers, dir.path(), "gh:a#1", "issues/1.md", false).unwrap_err();
        assert!(matches!(err, PushError::NoProvider { .. }));
    }

    #[test]
    fn clean_local_only_change_pushes_and_updates_store() {
        let (dir, store, handlers, mut providers) = fixture();
        let base = Node::new(
            "gh:a#1",
            "github.Issue",
            Attrs::from([("state".to_owned(), json!("open")), ("body".to_owned(), json!("hi"))]),
            0,
        )
        .unwrap();
        store.upsert_node(&base).unwrap();
        providers.register("gh", Arc::new(super::super::provider::MemoryProvider::new("gh", vec![base.clone()])));

        write_view_file(
            &dir,
            "issues/1.md",
            "---\n_id: gh:a#1\n_type: github.Issue\nstate: closed\n---\nhi\n",
        );

        let outcome = push_node(&store, &providers, &handlers, dir.path(), "gh:a#1", "issues/1.md", false).unwrap();
        assert_eq!(outcome, PushOutcome::Pushed);
        let updated = store.get_node("gh:a#1").unwrap().unwrap();
        assert_eq!(updated.attr("state"), Some(&json!("closed")));
    }

    #[test]
    fn diverged_scalar_persists_conflict_artifact() {
        let (dir, store, handlers, mut providers) = fixture();
        let base = Node::new(
            "gh:a#1",
            "github.Issue",
            Attrs::from([("state".to_owned(), json!("open")), ("body".to_owned(), json!("hi"))]),
            0,
        )
        .unwrap();
        store.upsert_node(&base).unwrap();
        let mut remote = base.clone();
        remote.attrs.insert("state".to_owned(), json!("reopened"));
        providers.register("gh", Arc::new(super::super::provider::MemoryProvider::new("gh", vec![remote])));

        write_view_file(
            &dir,
            "issues/1.md",
            "---\n_id: gh:a#1\n_type: github.Issue\nstate: closed\n---\nhi\n",
        );

        let outcome = push_node(&store, &providers, &handlers, dir.path(), "gh:a#1", "issues/1.md", false).unwrap();
        assert_eq!(outcome, PushOutcome::Conflict);
        assert!(store.get_conflict_artifact("gh:a#1").unwrap().is_some());
    }

    #[test]
    fn nothing_changed_is_skipped() {
        let (dir, store, handlers, mut providers) = fixture();
        let base = Node::new(
            "gh:a#1",
            "github.Issue",
            Attrs::from([("state".to_owned(), json!("open")), ("body".to_owned(), json!("hi"))]),
            0,
        )
        .unwrap();
        store.upsert_node(&base).unwrap();
        providers.register("gh", Arc::new(super::super::provider::MemoryProvider::new("gh", vec![base.clone()])));

        write_view_file(&dir, "issues/1.md", "---\n_id: gh:a#1\n_type: github.Issue\nstate: open\n---\nhi\n");

        let outcome = push_node(&store, &providers, &handlers, dir.path(), "gh:a#1", "issues/1.md", false).unwrap();
        assert_eq!(outcome, PushOutcome::Skipped);
    }

    #[test]
    fn force_pushes_local_despite_remote_divergence() {
        let (dir, store, handlers, mut providers) = fixture();
        let base = Node::new(
            "gh:a#1",
            "github.Issue",
            Attrs::from([("state".to_owned(), json!("open")), ("body".to_owned(), json!("hi"))]),
            0,
        )
        .unwrap();
        store.upsert_node(&base).unwrap();
        let mut remote = base.clone();
        remote.attrs.insert("state".to_owned(), json!("reopened"));
        providers.register("gh", Arc::new(super::super::provider::MemoryProvider::new("gh", vec![remote])));

        write_view_file(
            &dir,
            "issues/1.md",
            "---\n_id: gh:a#1\n_type: github.Issue\nstate: closed\n---\nhi\n",
        );

        let outcome = push_node(&store, &providers, &handlers, dir.path(), "gh:a#1", "issues/1.md", true).unwrap();
        assert_eq!(outcome, PushOutcome::Pushed);
        assert!(store.get_conflict_artifact("gh:a#1").unwrap().is_none());
        let updated = store.get_node("gh:a#1").unwrap().unwrap();
        assert_eq!(updated.attr("state"), Some(&json!("closed")));
    }

    #[test]
    fn push_all_pushes_every_clean_candidate() {
        let (dir, store, handlers, mut providers) = fixture();
        let mut base_nodes = Vec::new();
        for n in 1..=3 {
            let base = Node::new(
                format!("gh:a#{n}"),
                "github.Issue",
                Attrs::from([("state".to_owned(), json!("open")), ("body".to_owned(), json!("hi"))]),
                0,
            )
            .unwrap();
            store.upsert_node(&base).unwrap();
            write_view_file(
                &dir,
                &format!("issues/{n}.md"),
                &format!("---\n_id: gh:a#{n}\n_type: github.Issue\nstate: closed\n---\nhi\n"),
            );
            base_nodes.push(base);
        }
        providers.register("gh", Arc::new(super::super::provider::MemoryProvider::new("gh", base_nodes)));

        let candidates: Vec<(String, String)> =
            (1..=3).map(|n| (format!("gh:a#{n}"), format!("issues/{n}.md"))).collect();
        let stats = push_all(&store, &providers, &handlers, dir.path(), &candidates, false, &CancellationToken::new());

        assert_eq!(stats.pushed, 3);
        assert_eq!(stats.errors.len(), 0);
        assert!(!stats.cancelled);
    }

    #[test]
    fn push_all_reports_cancellation_without_processing() {
        let (dir, store, handlers, mut providers) = fixture();
        let base = Node::new(
            "gh:a#1",
            "github.Issue",
            Attrs::from([("state".to_owned(), json!("open")), ("body".to_owned(), json!("hi"))]),
            0,
        )
        .unwrap();
        store.upsert_node(&base).unwrap();
        providers.register("gh", Arc::new(super::super::provider::MemoryProvider::new("gh", vec![base])));
        write_view_file(&dir, "issues/1.md", "---\n_id: gh:a#1\n_type: github.Issue\nstate: closed\n---\nhi\n");

        let token = CancellationToken::new();
        token.cancel();
        let candidates = vec![("gh:a#1".to_owned(), "issues/1.md".to_owned())];
        let stats = push_all(&store, &providers, &handlers, dir.path(), &candidates, false, &token);

        assert!(stats.cancelled);
        assert_eq!(stats.pushed, 0);
        // Cancellation is checked before the file is touched.
        let unchanged = store.get_node("gh:a#1").unwrap().unwrap();
        assert_eq!(unchanged.attr("state"), Some(&json!("open")));
    }
}
