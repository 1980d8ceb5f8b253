//! Structural equality over JSON-compatible attribute values.
//!
//! `attrs` values travel through YAML front matter, the SQLite store, and
//! CRDT maps, so the canonical representation here is plain
//! [`serde_json::Value`]. [`structural_eq`] implements the comparison rule
//! from spec §4.4 / §9: scalar equality, array equality with element order
//! ignored (compared via each element's canonical JSON form), and
//! recursive object equality. No type coercion ever happens — a number and
//! the string of its digits are never equal.

use serde_json::Value;

/// Compare two attribute values the way the diff/conflict detector does:
/// order-insensitive for arrays, exact (no coercion) for scalars, recursive
/// for objects.
#[must_use]
pub fn structural_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(xs), Value::Array(ys)) => array_eq_unordered(xs, ys),
        (Value::Object(xs), Value::Object(ys)) => {
            if xs.len() != ys.len() {
                return false;
            }
            xs.iter().all(|(k, v)| match ys.get(k) {
                Some(other) => structural_eq(v, other),
                None => false,
            })
        }
        // Scalars (Null, Bool, Number, String) and cross-kind pairs: plain
        // equality. serde_json's `PartialEq` for Number does not coerce
        // between integer/float representations of the same value in a
        // surprising way, and never coerces String<->Number.
        _ => a == b,
    }
}

/// Order-ignoring array comparison: each element of `xs` must have a
/// matching, not-yet-consumed element in `ys` under [`structural_eq`].
fn array_eq_unordered(xs: &[Value], ys: &[Value]) -> bool {
    if xs.len() != ys.len() {
        return false;
    }
    let mut used = vec![false; ys.len()];
    for x in xs {
        let Some(slot) = ys
            .iter()
            .enumerate()
            .find(|(i, y)| !used[*i] && structural_eq(x, y))
        else {
            return false;
        };
        used[slot.0] = true;
    }
    true
}

/// Canonical JSON form used for set-union identity in auto-merge: object
/// keys sorted, so two objects that are structurally equal produce the
/// same string regardless of insertion order.
#[must_use]
pub fn canonical_string(v: &Value) -> String {
    canonicalize(v).to_string()
}

fn canonicalize(v: &Value) -> Value {
    match v {
        Value::Array(xs) => Value::Array(xs.iter().map(canonicalize).collect()),
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> =
                map.iter().map(|(k, v)| (k.clone(), canonicalize(v))).collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().collect())
        }
        other => other.clone(),
    }
}

/// The deterministic order-preserving union used by list-valued auto-merge
/// (spec §4.4): every element of `base`, then new elements first seen in
/// `local`, then new elements first seen in `remote`, de-duplicated by
/// canonical-JSON identity.
#[must_use]
pub fn auto_merge_union(base: &[Value], local: &[Value], remote: &[Value]) -> Vec<Value> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for v in base.iter().chain(local).chain(remote) {
        let key = canonical_string(v);
        if seen.insert(key) {
            out.push(v.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_no_coercion() {
        assert!(structural_eq(&json!(1), &json!(1)));
        assert!(!structural_eq(&json!(1), &json!("1")));
        assert!(!structural_eq(&json!(true), &json!("true")));
    }

    #[test]
    fn arrays_ignore_order() {
        assert!(structural_eq(&json!(["a", "b", "c"]), &json!(["c", "a", "b"])));
        assert!(!structural_eq(&json!(["a", "b"]), &json!(["a", "b", "b"])));
    }

    #[test]
    fn arrays_with_duplicates_require_matching_multiplicity() {
        assert!(structural_eq(&json!(["a", "a", "b"]), &json!(["a", "b", "a"])));
        assert!(!structural_eq(&json!(["a", "a"]), &json!(["a", "b"])));
    }

    #[test]
    fn objects_recurse_and_ignore_key_order() {
        let a = json!({"x": 1, "y": [1, 2]});
        let b = json!({"y": [2, 1], "x": 1});
        assert!(structural_eq(&a, &b));
    }

    #[test]
    fn objects_of_different_size_are_unequal() {
        assert!(!structural_eq(&json!({"x": 1}), &json!({"x": 1, "y": 2})));
    }

    #[test]
    fn canonical_string_is_stable_under_key_reordering() {
        let a = json!({"b": 1, "a": 2});
        let b = json!({"a": 2, "b": 1});
        assert_eq!(canonical_string(&a), canonical_string(&b));
    }

    #[test]
    fn auto_merge_union_preserves_first_seen_order() {
        let base = vec![json!("a"), json!("b")];
        let local = vec![json!("a"), json!("b"), json!("c")];
        let remote = vec![json!("a"), json!("b"), json!("d")];
        let merged = auto_merge_union(&base, &local, &remote);
        assert_eq!(merged, vec![json!("a"), json!("b"), json!("c"), json!("d")]);
    }

    #[test]
    fn auto_merge_union_is_idempotent() {
        let base = vec![json!("a")];
        let local = vec![json!("a"), json!("c")];
        let remote = vec![json!("a"), json!("d")];
        let once = auto_merge_union(&base, &local, &remote);
        let twice = auto_merge_union(&base, &once, &remote);
        assert_eq!(once, twice);
    }
}
