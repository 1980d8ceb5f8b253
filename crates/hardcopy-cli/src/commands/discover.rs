//! Walk a workspace's configured view directories and recover the
//! `(node_id, view_rel_path)` pairs that `push`/`diff`/`status` operate on.
//!
//! Uses the same hand-rolled `std::fs::read_dir` walk as
//! `materialize::refresh`, rather than a `walkdir` dependency.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use hardcopy_core::HandlerRegistry;

use super::context::Context;

/// A view file whose front matter identifies a node.
pub struct Candidate {
    /// The node id recovered from `_id`.
    pub node_id: String,
    /// Path to the file, relative to `root`.
    pub view_rel_path: String,
}

/// Collect every markdown view file under `ctx.root`'s configured views
/// that carries a recoverable `_id`, optionally restricted to paths
/// containing `pattern` as a substring.
pub fn discover_candidates(ctx: &Context, pattern: Option<&str>) -> Result<Vec<Candidate>> {
    let mut out = Vec::new();
    for view in &ctx.config.views {
        let view_dir = ctx.root.join(&view.path);
        if !view_dir.is_dir() {
            continue;
        }
        let mut files = Vec::new();
        walk(&view_dir, &mut files)?;
        for abs_path in files {
            let rel_path = abs_path
                .strip_prefix(&ctx.root)
                .unwrap_or(&abs_path)
                .to_string_lossy()
                .replace('\\', "/");
            if let Some(pattern) = pattern
                && !rel_path.contains(pattern)
            {
                continue;
            }
            if let Some(candidate) = read_candidate(&ctx.handlers, &abs_path, &rel_path)? {
                out.push(candidate);
            }
        }
    }
    out.sort_by(|a, b| a.view_rel_path.cmp(&b.view_rel_path));
    Ok(out)
}

fn read_candidate(handlers: &HandlerRegistry, abs_path: &Path, rel_path: &str) -> Result<Option<Candidate>> {
    let content = std::fs::read_to_string(abs_path)
        .with_context(|| format!("reading '{}'", abs_path.display()))?;
    let parsed = handlers.handler_for("").parse(&content)?;
    Ok(parsed.id.map(|node_id| Candidate { node_id, view_rel_path: rel_path.to_owned() }))
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading directory '{}'", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk(&path, out)?;
        } else if file_type.is_file() && path.extension().is_some_and(|ext| ext == "md") {
            out.push(path);
        }
    }
    Ok(())
}
