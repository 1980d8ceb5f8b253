//! C2: Graph query — a restricted pattern-and-predicate query over the
//! Store's node table (spec.md §4.2).
//!
//! Grounded on the corpus's general preference for small hand-written
//! recursive-descent parsers over parser-combinator dependencies for
//! restricted grammars (no crate in any example's `Cargo.toml` pulls in
//! `nom`/`pest`/`chumsky` for a grammar this size).

pub mod ast;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;

use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::Value as Json;

use crate::error::HardcopyError;
use crate::model::Node;
use crate::store::Store;

pub use ast::{Expr, FieldRef, Op, OrderBy, ParsedQuery, Pattern, SortDirection, Value};
pub use error::QueryError;

/// Evaluate `pattern` against `store`'s nodes: parse, filter by label via
/// the type index, evaluate the predicate against each candidate's attrs,
/// then apply `ORDER BY` if present (spec.md §4.2 algorithm).
///
/// # Errors
/// Returns [`HardcopyError::Query`] if `pattern` fails to parse or
/// references an undeclared `$param`, or [`HardcopyError::Store`] if the
/// underlying scan fails.
pub fn query_view_nodes(
    store: &Store,
    pattern: &str,
    params: &HashMap<String, Json>,
) -> Result<Vec<Node>, HardcopyError> {
    let parsed = parser::parse_query(pattern)?;
    let candidates = store.query_nodes(parsed.pattern.label.as_deref())?;

    let mut matched = Vec::with_capacity(candidates.len());
    for node in candidates {
        let keep = match &parsed.predicate {
            Some(expr) => eval::eval(expr, &node, params)?,
            None => true,
        };
        if keep {
            matched.push(node);
        }
    }

    if let Some(order_by) = &parsed.order_by {
        matched.sort_by(|a, b| {
            let ord = compare_json(eval::lookup_field(a, &order_by.field), eval::lookup_field(b, &order_by.field));
            let ord = match order_by.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            ord.then_with(|| a.id.cmp(&b.id))
        });
    }
    // With no ORDER BY, `store.query_nodes` already returns nodes in
    // id-sorted order, which stands in for "insertion order" here — raw
    // insertion sequence isn't tracked separately, and id order is stable
    // and deterministic, satisfying the tie-break rule either way.

    Ok(matched)
}

fn compare_json(a: Option<&Json>, b: Option<&Json>) -> Ordering {
    fn rank(v: Option<&Json>) -> u8 {
        match v {
            None | Some(Json::Null) => 0,
            Some(Json::Bool(_)) => 1,
            Some(Json::Number(_)) => 2,
            Some(Json::String(_)) => 3,
            Some(Json::Array(_)) => 4,
            Some(Json::Object(_)) => 5,
        }
    }
    let (ra, rb) = (rank(a), rank(b));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match (a, b) {
        (Some(Json::Bool(x)), Some(Json::Bool(y))) => x.cmp(y),
        (Some(Json::Number(x)), Some(Json::Number(y))) => {
            x.as_f64().unwrap_or(0.0).partial_cmp(&y.as_f64().unwrap_or(0.0)).unwrap_or(Ordering::Equal)
        }
        (Some(Json::String(x)), Some(Json::String(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}
