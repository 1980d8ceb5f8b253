//! C4: change detection against a stored base, three-way conflict
//! classification at push time, and the line-level merge fallback that can
//! resolve an apparently-diverged body back to clean (spec.md §4.4).

mod change;
mod classify;
mod error;
mod merge3;

pub use change::{Change, changed_fields, detect_changes};
pub use classify::{auto_merge, classify_fields, effective_value, is_unresolvable};
pub use error::ConflictError;
pub use merge3::{Merge3Result, SemanticMergeOracle, merge_lines};

use serde_json::Value;

use crate::format::{FieldSpec, ParsedFile};
use crate::model::{FieldConflict, FieldStatus, Node};

/// Three-way classify every declared field between the stored `base`, the
/// locally edited `local` file, and the freshly fetched `remote` node, then
/// apply the line-level merge fallback to an apparently-diverged `body`
/// (spec.md §4.4's last paragraph).
#[must_use]
pub fn classify_node(fields: &[FieldSpec], base: &Node, local: &ParsedFile, remote: &Node) -> Vec<FieldConflict> {
    let base_fn = |name: &str| node_value(base, name);
    let local_fn = |name: &str| local.field(name).unwrap_or(Value::Null);
    let remote_fn = |name: &str| node_value(remote, name);

    let mut conflicts = classify_fields(fields, &base_fn, &local_fn, &remote_fn);
    for conflict in &mut conflicts {
        if conflict.field == "body" && conflict.status == FieldStatus::Diverged {
            resolve_body_with_line_merge(conflict);
        }
    }
    conflicts
}

/// Attempt the diff3 line merge on a diverged `body` field, downgrading it
/// to `Clean` in place if the merge produced no conflict hunks.
fn resolve_body_with_line_merge(conflict: &mut FieldConflict) {
    let base_body = conflict.base.as_str().unwrap_or_default();
    let local_body = conflict.local.as_str().unwrap_or_default();
    let remote_body = conflict.remote.as_str().unwrap_or_default();
    let merged = merge_lines(base_body, local_body, remote_body);
    if !merged.conflicted {
        conflict.status = FieldStatus::Clean;
        conflict.local = Value::String(merged.text.trim_end().to_owned());
    }
}

fn node_value(node: &Node, name: &str) -> Value {
    if name == "body" { Value::String(node.body().to_owned()) } else { node.attr(name).cloned().unwrap_or(Value::Null) }
}

/// The fields a conflict artifact should record: every field that is still
/// `Diverged` after classification and line-merge (spec.md §4.5:
/// "persist a conflict artifact containing exactly the diverged fields").
#[must_use]
pub fn diverged_fields(conflicts: &[FieldConflict]) -> Vec<FieldConflict> {
    conflicts.iter().filter(|c| c.status == FieldStatus::Diverged).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attrs, ValueKind};
    use serde_json::json;

    fn fields() -> Vec<FieldSpec> {
        vec![FieldSpec::text("body"), FieldSpec::scalar("state")]
    }

    fn node(attrs: &[(&str, Value)]) -> Node {
        let attrs: Attrs = attrs.iter().map(|(k, v)| ((*k).to_owned(), v.clone())).collect();
        Node::new("gh:a#1", "github.Issue", attrs, 0).unwrap()
    }

    #[test]
    fn non_overlapping_body_edits_reclassify_as_clean() {
        let base = node(&[("state", json!("open")), ("body", json!("one\ntwo\nthree"))]);
        let remote = node(&[("state", json!("open")), ("body", json!("ONE\ntwo\nthree"))]);
        let local = ParsedFile {
            id: Some("gh:a#1".to_owned()),
            node_type: Some("github.Issue".to_owned()),
            attrs: Attrs::new(),
            body: "one\ntwo\nTHREE".to_owned(),
        };

        let conflicts = classify_node(&fields(), &base, &local, &remote);
        let body = conflicts.iter().find(|c| c.field == "body").unwrap();
        assert_eq!(body.status, FieldStatus::Clean);
        assert_eq!(body.local, json!("ONE\ntwo\nTHREE"));
        assert!(diverged_fields(&conflicts).is_empty());
    }

    #[test]
    fn overlapping_body_edits_remain_diverged() {
        let base = node(&[("state", json!("open")), ("body", json!("one\ntwo\nthree"))]);
        let remote = node(&[("state", json!("open")), ("body", json!("one\nREMOTE\nthree"))]);
        let local = ParsedFile {
            id: Some("gh:a#1".to_owned()),
            node_type: Some("github.Issue".to_owned()),
            attrs: Attrs::new(),
            body: "one\nLOCAL\nthree".to_owned(),
        };

        let conflicts = classify_node(&fields(), &base, &local, &remote);
        let body = conflicts.iter().find(|c| c.field == "body").unwrap();
        assert_eq!(body.status, FieldStatus::Diverged);
        assert_eq!(diverged_fields(&conflicts).len(), 1);
        assert!(!conflicts.iter().any(|c| c.can_auto_merge && c.field == "body"));
        let _ = ValueKind::Text;
    }

    #[test]
    fn scalar_fields_are_unaffected_by_merge_fallback() {
        let base = node(&[("state", json!("open")), ("body", json!("hi"))]);
        let remote = node(&[("state", json!("closed")), ("body", json!("hi"))]);
        let local = ParsedFile {
            id: Some("gh:a#1".to_owned()),
            node_type: Some("github.Issue".to_owned()),
            attrs: [("state".to_owned(), json!("reopened"))].into_iter().collect(),
            body: "hi".to_owned(),
        };

        let conflicts = classify_node(&fields(), &base, &local, &remote);
        let state = conflicts.iter().find(|c| c.field == "state").unwrap();
        assert_eq!(state.status, FieldStatus::Diverged);
        assert!(state.is_unresolvable());
    }
}
