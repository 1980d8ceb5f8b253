//! Three-way classification (spec.md §4.4's classification table) and the
//! deterministic auto-merge it licenses for list-valued fields.

use serde_json::Value;

use crate::format::FieldSpec;
use crate::model::{FieldConflict, FieldStatus, ValueKind, auto_merge_union, structural_eq};

/// Classify every declared field across `(base, local, remote)` per
/// spec.md §4.4's table, and compute `can_auto_merge` for each.
#[must_use]
pub fn classify_fields(
    fields: &[FieldSpec],
    base: &dyn Fn(&str) -> Value,
    local: &dyn Fn(&str) -> Value,
    remote: &dyn Fn(&str) -> Value,
) -> Vec<FieldConflict> {
    fields
        .iter()
        .map(|field| classify_one(field, base(&field.name), local(&field.name), remote(&field.name)))
        .collect()
}

fn classify_one(field: &FieldSpec, base: Value, local: Value, remote: Value) -> FieldConflict {
    let local_changed = !field_eq(field, &base, &local);
    let remote_changed = !field_eq(field, &base, &remote);
    let local_remote_equal = field_eq(field, &local, &remote);

    let status = match (local_changed, remote_changed) {
        (false, false) => FieldStatus::Clean,
        (true, false) => FieldStatus::Clean,
        (false, true) => FieldStatus::RemoteOnly,
        (true, true) if local_remote_equal => FieldStatus::Clean,
        (true, true) => FieldStatus::Diverged,
    };

    let can_auto_merge = matches!(field.kind, ValueKind::List)
        || base.is_array()
        || local.is_array()
        || remote.is_array();

    FieldConflict { field: field.name.clone(), status, can_auto_merge, base, local, remote }
}

fn field_eq(field: &FieldSpec, a: &Value, b: &Value) -> bool {
    if field.kind == ValueKind::Text {
        a.as_str().unwrap_or_default().trim() == b.as_str().unwrap_or_default().trim()
    } else {
        structural_eq(a, b)
    }
}

/// The set-union auto-merge result for a `Diverged ∧ can_auto_merge` field
/// (spec.md §4.4: "auto-merge = set-union of all three").
#[must_use]
pub fn auto_merge(conflict: &FieldConflict) -> Value {
    let base = conflict.base.as_array().cloned().unwrap_or_default();
    let local = conflict.local.as_array().cloned().unwrap_or_default();
    let remote = conflict.remote.as_array().cloned().unwrap_or_default();
    Value::Array(auto_merge_union(&base, &local, &remote))
}

/// `true` iff any field is diverged and not auto-mergeable — the node
/// cannot be pushed as-is.
#[must_use]
pub fn is_unresolvable(conflicts: &[FieldConflict]) -> bool {
    conflicts.iter().any(FieldConflict::is_unresolvable)
}

/// The effective value to push for one classified field: the auto-merged
/// array for a mergeable-diverged field, base for remote-only (don't push
/// the local side), local otherwise.
#[must_use]
pub fn effective_value(conflict: &FieldConflict) -> Value {
    match conflict.status {
        FieldStatus::Diverged if conflict.can_auto_merge => auto_merge(conflict),
        FieldStatus::RemoteOnly => conflict.base.clone(),
        FieldStatus::Clean | FieldStatus::Diverged => conflict.local.clone(),
    }
}
