//! Change detection: file vs. base (spec.md §4.4 "Change detection").

use serde_json::Value;

use crate::format::{FieldSpec, FormatHandler, ParsedFile};
use crate::model::{Node, structural_eq};
use crate::store::Store;

use super::error::ConflictError;

/// One field that differs between an on-disk file and its stored base.
#[derive(Clone, Debug, PartialEq)]
pub struct Change {
    /// Field name (`"body"` or an `attrs` key).
    pub field: String,
    /// The Store's current value for this field.
    pub old_value: Value,
    /// The on-disk file's value for this field.
    pub new_value: Value,
}

/// Detect local edits to `path` relative to `node` (the stored base).
///
/// Returns an empty vec if the file's `id` doesn't resolve to `node.id` (an
/// unrelated file — spec.md §4.4 step 1), or if the file's mtime has not
/// advanced past the watermark (step 3), unless `force` bypasses that check
/// ("unsmart" mode).
///
/// # Errors
/// Returns [`ConflictError`] if the file cannot be read or parsed.
pub fn detect_changes(
    store: &Store,
    handler: &dyn FormatHandler,
    node: &Node,
    path: &std::path::Path,
    view_rel_path: &str,
    force: bool,
) -> Result<Vec<Change>, ConflictError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConflictError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let parsed = handler.parse(&content).map_err(|source| ConflictError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    if parsed.id.as_deref().is_some_and(|id| id != node.id) {
        return Ok(Vec::new());
    }

    if !force {
        let watermark = store.get_file_synced_at(&node.id, view_rel_path)?.unwrap_or(node.synced_at);
        let mtime = file_mtime_millis(path).map_err(|source| ConflictError::Io {
            path: path.display().to_string(),
            source,
        })?;
        if mtime <= watermark {
            return Ok(Vec::new());
        }
    }

    Ok(changed_fields(handler.editable_fields(), node, &parsed))
}

/// Compare `parsed` against `node` field by field, using trimmed-string
/// comparison for `body` and [`structural_eq`] for everything else.
#[must_use]
pub fn changed_fields(fields: &[FieldSpec], node: &Node, parsed: &ParsedFile) -> Vec<Change> {
    let mut changes = Vec::new();
    for field in fields {
        let old_value = field_value(node, &field.name);
        let new_value = parsed.field(&field.name).unwrap_or(Value::Null);
        let equal = if field.name == "body" {
            old_value.as_str().unwrap_or_default().trim() == new_value.as_str().unwrap_or_default().trim()
        } else {
            structural_eq(&old_value, &new_value)
        };
        if !equal {
            changes.push(Change { field: field.name.clone(), old_value, new_value });
        }
    }
    changes
}

fn field_value(node: &Node, name: &str) -> Value {
    if name == "body" {
        Value::String(node.body().to_owned())
    } else {
        node.attr(name).cloned().unwrap_or(Value::Null)
    }
}

fn file_mtime_millis(path: &std::path::Path) -> std::io::Result<i64> {
    let metadata = std::fs::metadata(path)?;
    let modified = metadata.modified()?;
    Ok(modified
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0))
}
