//! Predicate evaluation against a [`Node`]'s `attrs` (spec.md §4.2
//! algorithm step 3: "evaluate the predicate against each node's attrs").

use std::collections::HashMap;

use serde_json::Value as Json;

use crate::model::Node;
use crate::model::value::structural_eq;

use super::ast::{Expr, FieldRef, Op, Value};
use super::error::QueryError;

/// `true` iff `node` satisfies `expr` under `params`.
///
/// Unknown attributes are treated as absent (`Json::Null`): comparisons
/// against an absent field yield `false`, except `!=`, which yields `true`
/// (spec.md §4.2 failure mode).
///
/// # Errors
/// Returns [`QueryError::MissingParam`] if `expr` references a `$name`
/// placeholder not present in `params`.
pub fn eval(expr: &Expr, node: &Node, params: &HashMap<String, Json>) -> Result<bool, QueryError> {
    match expr {
        Expr::And(lhs, rhs) => Ok(eval(lhs, node, params)? && eval(rhs, node, params)?),
        Expr::Or(lhs, rhs) => Ok(eval(lhs, node, params)? || eval(rhs, node, params)?),
        Expr::Compare { field, op, value } => eval_compare(field, *op, value, node, params),
    }
}

fn eval_compare(
    field: &FieldRef,
    op: Op,
    value: &Value,
    node: &Node,
    params: &HashMap<String, Json>,
) -> Result<bool, QueryError> {
    let attr = lookup_field(node, field);
    let rhs = resolve_value(value, params)?;

    Ok(match op {
        Op::Eq => attr.is_some_and(|a| structural_eq(a, &rhs)),
        Op::Neq => !attr.is_some_and(|a| structural_eq(a, &rhs)),
        Op::Contains => match attr {
            Some(Json::Array(items)) => items.iter().any(|item| structural_eq(item, &rhs)),
            _ => false,
        },
        Op::In => match &rhs {
            Json::Array(items) => attr.is_some_and(|a| items.iter().any(|item| structural_eq(a, item))),
            _ => false,
        },
    })
}

/// Navigate `field.path` into `node.attrs`, returning `None` for any
/// missing segment (unknown attribute is absent, never an error).
#[must_use]
pub fn lookup_field<'n>(node: &'n Node, field: &FieldRef) -> Option<&'n Json> {
    let mut current = node.attrs.get(field.path.first()?)?;
    for segment in &field.path[1..] {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn resolve_value(value: &Value, params: &HashMap<String, Json>) -> Result<Json, QueryError> {
    Ok(match value {
        Value::Str(s) => Json::String(s.clone()),
        Value::Num(n) => serde_json::Number::from_f64(*n).map_or(Json::Null, Json::Number),
        Value::Bool(b) => Json::Bool(*b),
        Value::Null => Json::Null,
        Value::Param(name) => params
            .get(name)
            .cloned()
            .ok_or_else(|| QueryError::MissingParam { name: name.clone() })?,
        Value::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(resolve_value(item, params)?);
            }
            Json::Array(out)
        }
    })
}
