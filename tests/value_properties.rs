//! Property tests for the value-equality and auto-merge invariants spec.md
//! §4.4/§9 describe in prose ("array equality ignores order", "auto-merge
//! is idempotent and order-preserving for already-seen elements").

use hardcopy::{auto_merge_union, structural_eq};
use proptest::prelude::*;
use serde_json::{Value, json};

/// A small alphabet of scalar JSON values, enough to exercise ordering and
/// de-duplication without needing a recursive arbitrary-JSON strategy.
fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i32>().prop_map(|n| json!(n)),
        "[a-e]".prop_map(Value::String),
        any::<bool>().prop_map(Value::Bool),
    ]
}

fn scalar_vec(max_len: usize) -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(scalar(), 0..max_len)
}

proptest! {
    /// `structural_eq` is reflexive for any scalar or array value.
    #[test]
    fn structural_eq_is_reflexive(values in scalar_vec(8)) {
        let v = json!(values);
        prop_assert!(structural_eq(&v, &v));
    }

    /// Permuting an array's elements doesn't change its structural identity.
    #[test]
    fn structural_eq_ignores_array_order(mut values in scalar_vec(8)) {
        let original = json!(values.clone());
        values.reverse();
        let reversed = json!(values);
        prop_assert!(structural_eq(&original, &reversed));
    }

    /// Two arrays with a different multiset of elements are never equal.
    #[test]
    fn structural_eq_rejects_extra_element(values in scalar_vec(8), extra in scalar()) {
        let original = json!(values.clone());
        let mut with_extra = values;
        with_extra.push(extra);
        let grown = json!(with_extra);
        prop_assert!(!structural_eq(&original, &grown));
    }

    /// Auto-merge of a value against itself on every side is a no-op: the
    /// union is exactly the input, deduplicated.
    #[test]
    fn auto_merge_union_is_idempotent(values in scalar_vec(8)) {
        let merged = auto_merge_union(&values, &values, &values);
        prop_assert!(structural_eq(&json!(merged), &json!(values)));
    }

    /// Every element present on any of the three sides survives the merge.
    #[test]
    fn auto_merge_union_is_a_superset(base in scalar_vec(5), local in scalar_vec(5), remote in scalar_vec(5)) {
        let merged = auto_merge_union(&base, &local, &remote);
        for side in [&base, &local, &remote] {
            for v in side {
                prop_assert!(merged.iter().any(|m| structural_eq(m, v)));
            }
        }
    }

    /// Merging is itself idempotent: re-merging the result against itself
    /// on every side changes nothing.
    #[test]
    fn auto_merge_union_result_is_a_fixed_point(base in scalar_vec(5), local in scalar_vec(5), remote in scalar_vec(5)) {
        let merged = auto_merge_union(&base, &local, &remote);
        let remerged = auto_merge_union(&merged, &merged, &merged);
        prop_assert!(structural_eq(&json!(remerged), &json!(merged)));
    }
}
