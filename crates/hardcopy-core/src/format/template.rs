//! `{{expr}}` substitution for `path_template` and render `template` strings
//! (spec.md §4.3). The grammar is deliberately narrow: `id`, `type`, or a
//! dotted `attrs.<name>` path — not a general template engine, since that's
//! the entire substitution surface the spec defines.

use serde_json::Value;

use crate::model::Node;

use super::error::FormatError;

/// Substitute every `{{expr}}` in `template` with its value on `node`.
///
/// # Errors
/// Returns [`FormatError::UnterminatedTemplateExpr`] for an unclosed `{{`,
/// [`FormatError::UnknownTemplateExpr`] for a malformed expression, or
/// [`FormatError::UnknownTemplateField`] when an `attrs.*` path doesn't
/// resolve on `node`.
pub fn render_template(template: &str, node: &Node) -> Result<String, FormatError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            return Err(FormatError::UnterminatedTemplateExpr { template: template.to_owned() });
        };
        let expr = after_open[..close].trim();
        out.push_str(&eval_expr(expr, node)?);
        rest = &after_open[close + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

fn eval_expr(expr: &str, node: &Node) -> Result<String, FormatError> {
    let segments: Vec<&str> = expr.split('.').collect();
    match segments.as_slice() {
        ["id"] => Ok(node.id.clone()),
        ["type"] => Ok(node.node_type.clone()),
        ["attrs", path @ ..] if !path.is_empty() => {
            let mut current = node
                .attrs
                .get(path[0])
                .ok_or_else(|| FormatError::UnknownTemplateField { expr: expr.to_owned() })?;
            for segment in &path[1..] {
                current = current
                    .as_object()
                    .and_then(|map| map.get(*segment))
                    .ok_or_else(|| FormatError::UnknownTemplateField { expr: expr.to_owned() })?;
            }
            Ok(scalar_to_string(current))
        }
        _ => Err(FormatError::UnknownTemplateExpr { expr: expr.to_owned() }),
    }
}

/// Render a JSON value the way a path segment or body template wants it: no
/// quotes around strings, plain digits for numbers.
fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Attrs;
    use serde_json::json;

    fn node(pairs: &[(&str, Value)]) -> Node {
        let attrs: Attrs = pairs.iter().map(|(k, v)| ((*k).to_owned(), v.clone())).collect();
        Node::new("github:owner/repo#42", "github.Issue", attrs, 0).unwrap()
    }

    #[test]
    fn substitutes_id_and_literal_text() {
        let n = node(&[]);
        let out = render_template("issues/{{id}}.md", &n).unwrap();
        assert_eq!(out, "issues/github:owner/repo#42.md");
    }

    #[test]
    fn substitutes_a_scalar_attr_path() {
        let n = node(&[("number", json!(42))]);
        let out = render_template("{{attrs.number}}.md", &n).unwrap();
        assert_eq!(out, "42.md");
    }

    #[test]
    fn substitutes_a_nested_attr_path() {
        let n = node(&[("meta", json!({"priority": "p1"}))]);
        let out = render_template("{{attrs.meta.priority}}.md", &n).unwrap();
        assert_eq!(out, "p1.md");
    }

    #[test]
    fn unterminated_brace_is_an_error() {
        let n = node(&[]);
        assert!(matches!(
            render_template("{{id", &n),
            Err(FormatError::UnterminatedTemplateExpr { .. })
        ));
    }

    #[test]
    fn unknown_field_is_an_error() {
        let n = node(&[]);
        assert!(matches!(
            render_template("{{attrs.missing}}", &n),
            Err(FormatError::UnknownTemplateField { .. })
        ));
    }

    #[test]
    fn malformed_expression_is_an_error() {
        let n = node(&[]);
        assert!(matches!(render_template("{{bogus}}", &n), Err(FormatError::UnknownTemplateExpr { .. })));
    }
}
