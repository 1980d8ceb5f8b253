//! Conflict artifact model (spec §3 "Conflict artifact", §6 marker grammar).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status of a single field after three-way classification (spec §4.4).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    /// No effective change, or only one side changed, or both sides
    /// changed to the same value: safe to push.
    Clean,
    /// Remote changed, local did not: take remote, do not push.
    RemoteOnly,
    /// Both sides changed to different values and no merge resolved it.
    Diverged,
}

/// The per-field result of three-way classification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldConflict {
    /// Field name (`"body"` or an `attrs` key).
    pub field: String,
    /// Classification outcome.
    pub status: FieldStatus,
    /// Whether this field is list-valued and thus eligible for
    /// deterministic set-union auto-merge.
    pub can_auto_merge: bool,
    /// The Store's current (base) value.
    pub base: Value,
    /// The parsed on-disk (local) value.
    pub local: Value,
    /// The freshly fetched (remote) value.
    pub remote: Value,
}

impl FieldConflict {
    /// A field is unresolvable — blocks the push — iff it is diverged and
    /// not auto-mergeable.
    #[must_use]
    pub fn is_unresolvable(&self) -> bool {
        self.status == FieldStatus::Diverged && !self.can_auto_merge
    }
}

/// A persisted conflict artifact for one node (spec §3, §6).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConflictArtifact {
    /// The conflicted node's id.
    pub node_id: String,
    /// The conflicted node's type.
    pub node_type: String,
    /// Absolute path to the rendered view file on disk.
    pub file_path: String,
    /// Path relative to the view root (the watermark key).
    pub view_rel_path: String,
    /// When the conflict was detected (Unix millis).
    pub detected_at: i64,
    /// The unresolved diverged fields.
    pub fields: Vec<FieldConflict>,
}

impl ConflictArtifact {
    /// `true` once every listed field has a resolution decided — callers
    /// use this to decide whether `resolve_conflict` can proceed, not this
    /// type itself (which is immutable once saved).
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.field.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fc(status: FieldStatus, can_auto_merge: bool) -> FieldConflict {
        FieldConflict {
            field: "labels".to_owned(),
            status,
            can_auto_merge,
            base: json!(["a"]),
            local: json!(["a", "b"]),
            remote: json!(["a", "c"]),
        }
    }

    #[test]
    fn diverged_non_mergeable_is_unresolvable() {
        assert!(fc(FieldStatus::Diverged, false).is_unresolvable());
    }

    #[test]
    fn diverged_mergeable_is_resolvable() {
        assert!(!fc(FieldStatus::Diverged, true).is_unresolvable());
    }

    #[test]
    fn clean_is_never_unresolvable() {
        assert!(!fc(FieldStatus::Clean, false).is_unresolvable());
    }
}
