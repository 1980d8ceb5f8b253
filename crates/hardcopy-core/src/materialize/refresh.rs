//! The view refresh algorithm (spec.md §4.3 "Refresh algorithm").
//!
//! Directory walk is hand-rolled recursion over `std::fs::read_dir` rather
//! than a `walkdir` dependency, for this exact shape of problem (collect
//! relative file paths under a root).

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::concurrency::{CancellationToken, DEFAULT_PARALLELISM, run_bounded};
use crate::format::{FormatError, HandlerRegistry, render_template};
use crate::model::Node;
use crate::store::{Store, StoreError};

use super::error::MaterializeError;
use super::index::IndexSidecar;
use super::view::{Partition, RenderEntry, ViewDefinition};

/// Options controlling a single refresh.
#[derive(Clone, Debug)]
pub struct RefreshOptions {
    /// Delete orphaned files (present on disk, absent from the query
    /// result) and their watermark/CRDT state.
    pub clean: bool,
    /// Advisory page size recorded in the `.index` sidecar.
    pub page_size: usize,
    /// Advisory TTL (seconds) recorded in the `.index` sidecar.
    pub ttl_secs: u64,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self { clean: false, page_size: 100, ttl_secs: 300 }
    }
}

/// The outcome of one refresh.
#[derive(Clone, Debug, Default)]
pub struct RefreshReport {
    /// Paths (relative to the view directory) written this refresh.
    pub written: Vec<PathBuf>,
    /// Paths present on disk but not produced by this refresh.
    pub orphaned: Vec<PathBuf>,
    /// Whether orphan reconciliation (deletion) ran.
    pub cleaned: bool,
    /// Non-fatal per-file failures (template errors, individual I/O
    /// failures); the refresh as a whole still completed.
    pub errors: Vec<String>,
}

#[derive(Debug, Error)]
enum RenderOneError {
    #[error("{0}")]
    Format(#[from] FormatError),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Cancelled(#[from] crate::concurrency::Cancelled),
}

/// Run one refresh of `view`, rooted at `root` (the workspace root; the
/// view's files live at `root.join(&view.path)`).
///
/// Renders are fanned out across up to [`DEFAULT_PARALLELISM`] worker
/// threads via [`run_bounded`], and `token` is polled at each suspension
/// point between node operations (before rendering, before evaluating the
/// query, and between orphan reconciliations) so a caller can abort a
/// long-running refresh between steps.
///
/// # Errors
/// Returns [`MaterializeError`] for cross-cutting failures: an unparseable
/// query, a Store error, an unreadable view directory, or `token` having
/// been cancelled. Per-node/per-file failures are recorded in the returned
/// report's `errors` instead.
pub fn refresh(
    store: &Store,
    registry: &HandlerRegistry,
    root: &Path,
    view: &ViewDefinition,
    params: &HashMap<String, serde_json::Value>,
    options: &RefreshOptions,
    token: &CancellationToken,
) -> Result<RefreshReport, MaterializeError> {
    token.check()?;

    let view_dir = root.join(&view.path);
    std::fs::create_dir_all(&view_dir)
        .map_err(|source| MaterializeError::WalkViewDir { path: view_dir.clone(), source })?;

    // 1. Evaluate query -> node set N.
    let nodes = crate::query::query_view_nodes(store, &view.query, params)?;
    token.check()?;

    // 2. Walk the view directory, collecting existing `.md` files.
    let existing = walk_markdown_files(&view_dir)?;

    // 3. Render each node x render entry, collecting the expected set.
    // The work list is flattened up front so the fan-out bounds total
    // concurrent renders/Provider-adjacent I/O, not concurrent nodes.
    let mut work: Vec<(String, Node, &RenderEntry)> = Vec::new();
    for node in &nodes {
        for entry in &view.render {
            if entry.node_type.as_deref().is_some_and(|t| t != node.node_type) {
                continue;
            }
            work.push((node.id.clone(), node.clone(), entry));
        }
    }

    let results = run_bounded(work, DEFAULT_PARALLELISM, |(id, node, entry)| {
        if token.is_cancelled() {
            return (id, Err(RenderOneError::Cancelled(crate::concurrency::Cancelled)));
        }
        (id, render_one(store, registry, &view_dir, entry, &node, view.partition.as_ref()))
    });

    let mut expected = BTreeSet::new();
    let mut errors = Vec::new();
    let mut cancelled = false;
    let now = now_millis();

    for (id, result) in results {
        match result {
            Ok(rel_path) => {
                expected.insert(rel_path);
            }
            Err(RenderOneError::Cancelled(_)) => cancelled = true,
            Err(e) => errors.push(format!("{id}: {e}")),
        }
    }
    if cancelled {
        return Err(MaterializeError::Cancelled(crate::concurrency::Cancelled));
    }

    // 4. orphans = E \ expected.
    let orphaned: Vec<PathBuf> = existing.into_iter().filter(|p| !expected.contains(p)).collect();

    // 5. Conditional orphan reconciliation.
    let mut cleaned = false;
    if options.clean {
        for orphan in &orphaned {
            token.check()?;
            reconcile_orphan(store, registry, &view_dir, orphan, &mut errors);
        }
        cleaned = true;
    }

    // 6. Write the `.index` sidecar.
    let sidecar = IndexSidecar {
        loaded: nodes.len(),
        page_size: options.page_size,
        last_fetch: chrono::Utc::now().to_rfc3339(),
        ttl_secs: options.ttl_secs,
    };
    sidecar
        .write(&view_dir)
        .map_err(|source| MaterializeError::WriteIndex { path: view_dir.join(".index"), source })?;

    Ok(RefreshReport { written: expected.into_iter().collect(), orphaned, cleaned, errors })
}

fn render_one(
    store: &Store,
    registry: &HandlerRegistry,
    view_dir: &Path,
    entry: &RenderEntry,
    node: &Node,
    partition: Option<&Partition>,
) -> Result<PathBuf, RenderOneError> {
    let mut rel_path = PathBuf::new();
    if let Some(p) = partition {
        rel_path.push(partition_segment(p, node));
    }
    rel_path.push(render_template(&entry.path_template, node)?);

    let content = match &entry.template {
        Some(template) => render_template(template, node)?,
        None => registry.handler_for(&node.node_type).render(node),
    };

    let abs_path = view_dir.join(&rel_path);
    let unchanged = std::fs::read(&abs_path).is_ok_and(|existing| existing == content.as_bytes());
    if unchanged {
        return Ok(rel_path);
    }

    if let Some(parent) = abs_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&abs_path, &content)?;
    let synced_at = file_mtime_millis(&abs_path)?;

    let rel_str = rel_path.to_string_lossy().into_owned();
    store.set_file_synced_at(&node.id, &rel_str, synced_at)?;

    let crdt_doc = store.crdt.load_or_create(&node.id)?;
    crdt_doc.set_body(node.body());
    store.crdt.save(&node.id, &crdt_doc)?;

    Ok(rel_path)
}

fn partition_segment(partition: &Partition, node: &Node) -> String {
    let path: Vec<&str> = partition.by.split('.').collect();
    let value = match path.as_slice() {
        ["attrs", rest @ ..] if !rest.is_empty() => {
            let mut current = node.attrs.get(rest[0]);
            for segment in &rest[1..] {
                current = current.and_then(|v| v.as_object()).and_then(|m| m.get(*segment));
            }
            current
        }
        _ => None,
    };
    match value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => partition.fallback.clone().unwrap_or_else(|| "_unsorted".to_owned()),
    }
}

/// Step 5: best-effort warn on a possible unsaved edit, then delete the
/// file only after its watermark/CRDT state has been cleaned up (spec.md
/// §4.3's "all-or-nothing per orphan" guarantee).
fn reconcile_orphan(store: &Store, registry: &HandlerRegistry, view_dir: &Path, rel_path: &Path, errors: &mut Vec<String>) {
    let abs_path = view_dir.join(rel_path);
    let rel_str = rel_path.to_string_lossy().into_owned();

    if let Ok(Some(node_id)) = store.find_node_id_by_synced_path(&rel_str) {
        warn_if_unsaved_change(store, registry, &node_id, &abs_path);

        if let Err(e) = store.crdt.delete(&node_id) {
            errors.push(format!("orphan cleanup for '{rel_str}': CRDT delete failed: {e}"));
            return;
        }
        if let Err(e) = store.delete_file_synced_at(&node_id, Some(&rel_str)) {
            errors.push(format!("orphan cleanup for '{rel_str}': watermark delete failed: {e}"));
            return;
        }
    }

    if let Err(e) = std::fs::remove_file(&abs_path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            errors.push(format!("orphan cleanup for '{rel_str}': file delete failed: {e}"));
        }
    }
}

fn warn_if_unsaved_change(store: &Store, registry: &HandlerRegistry, node_id: &str, abs_path: &Path) {
    let Ok(content) = std::fs::read_to_string(abs_path) else { return };
    let Ok(Some(crdt_doc)) = store.crdt.load(node_id) else { return };
    let Ok(Some(node)) = store.get_node(node_id) else { return };
    let Ok(parsed) = registry.handler_for(&node.node_type).parse(&content) else { return };
    if parsed.body.trim() != crdt_doc.get_body().trim() {
        tracing::warn!(node_id, "deleting orphaned file whose body differs from the last known CRDT body");
    }
}

/// Recursively collect every `.md` file under `dir` not beginning with `.`,
/// as paths relative to `dir`.
fn walk_markdown_files(dir: &Path) -> Result<Vec<PathBuf>, MaterializeError> {
    let mut files = Vec::new();
    walk_dir(dir, dir, &mut files)
        .map_err(|source| MaterializeError::WalkViewDir { path: dir.to_path_buf(), source })?;
    Ok(files)
}

fn walk_dir(base: &Path, current: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();
        let metadata = entry.metadata()?;
        if metadata.is_dir() {
            walk_dir(base, &path, files)?;
            continue;
        }
        let is_hidden = path.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.starts_with('.'));
        if is_hidden || path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        if let Ok(rel) = path.strip_prefix(base) {
            files.push(rel.to_path_buf());
        }
    }
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
