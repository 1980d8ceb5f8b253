//! Default [`FormatHandler`]: YAML front matter delimited by `---` lines,
//! followed by a free-text Markdown body (spec.md §6 "View files").
//!
//! Grounded in the split-on-`---`-then-parse-YAML idiom used across the
//! corpus for front-matter documents.

use indexmap::IndexMap;
use serde_json::Value;

use crate::model::{Attrs, FieldSpec, Node};

use super::error::FormatError;
use super::{FormatHandler, ParsedFile};

/// Renders/parses a node as `---\n<yaml>\n---\n\n<body>`.
///
/// `fields` is the type's editable-field declaration; `body` is implicitly
/// included (it is always editable, compared as free text per spec.md §4.4)
/// and is never duplicated into the YAML block.
pub struct MarkdownFrontMatterHandler {
    fields: Vec<FieldSpec>,
}

impl MarkdownFrontMatterHandler {
    /// Declare a handler for the given non-body editable fields.
    #[must_use]
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        let mut all = Vec::with_capacity(fields.len() + 1);
        all.push(FieldSpec::text("body"));
        all.extend(fields.into_iter().filter(|f| f.name != "body"));
        Self { fields: all }
    }

    /// The fallback handler registered for any node type without a more
    /// specific one: only `body` is treated as editable, so front-matter
    /// fields beyond `_id`/`_type` round-trip verbatim but aren't diffed.
    #[must_use]
    pub fn fallback() -> Self {
        Self::new(Vec::new())
    }
}

impl FormatHandler for MarkdownFrontMatterHandler {
    fn render(&self, node: &Node) -> String {
        let mut front_matter: IndexMap<String, Value> = IndexMap::new();
        front_matter.insert("_id".to_owned(), Value::String(node.id.clone()));
        front_matter.insert("_type".to_owned(), Value::String(node.node_type.clone()));
        for field in &self.fields {
            if field.name == "body" {
                continue;
            }
            if let Some(value) = node.attrs.get(&field.name) {
                front_matter.insert(field.name.clone(), value.clone());
            }
        }
        let yaml = serde_yaml::to_string(&front_matter).unwrap_or_default();
        format!("---\n{yaml}---\n\n{}\n", node.body())
    }

    fn parse(&self, content: &str) -> Result<ParsedFile, FormatError> {
        let normalized = content.replace("\r\n", "\n");
        let trimmed = normalized.trim_start();
        if !trimmed.starts_with("---") {
            return Ok(ParsedFile {
                id: None,
                node_type: None,
                attrs: Attrs::new(),
                body: normalized.trim().to_owned(),
            });
        }

        let parts: Vec<&str> = trimmed.splitn(3, "---").collect();
        if parts.len() < 3 {
            return Err(FormatError::MissingFrontMatter);
        }
        let yaml_text = parts[1];
        let body = parts[2].trim_start_matches('\n').trim_end().to_owned();

        let mut front_matter: IndexMap<String, Value> =
            if yaml_text.trim().is_empty() { IndexMap::new() } else { serde_yaml::from_str(yaml_text)? };

        let id = match front_matter.shift_remove("_id") {
            Some(Value::String(s)) => Some(s),
            Some(_) => return Err(FormatError::InvalidId),
            None => None,
        };
        let node_type = match front_matter.shift_remove("_type") {
            Some(Value::String(s)) => Some(s),
            Some(_) => return Err(FormatError::InvalidType),
            None => None,
        };

        Ok(ParsedFile { id, node_type, attrs: front_matter, body })
    }

    fn editable_fields(&self) -> &[FieldSpec] {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ValueKind;
    use serde_json::json;

    fn node(attrs: &[(&str, Value)]) -> Node {
        let attrs: Attrs = attrs.iter().map(|(k, v)| ((*k).to_owned(), v.clone())).collect();
        Node::new("github:owner/repo#1", "github.Issue", attrs, 0).unwrap()
    }

    #[test]
    fn renders_id_type_and_declared_fields() {
        let handler = MarkdownFrontMatterHandler::new(vec![FieldSpec::scalar("state")]);
        let n = node(&[("state", json!("open")), ("body", json!("hello"))]);
        let rendered = handler.render(&n);
        assert!(rendered.starts_with("---\n"));
        assert!(rendered.contains("_id: 'github:owner/repo#1'") || rendered.contains("_id: github:owner/repo#1"));
        assert!(rendered.contains("state: open"));
        assert!(rendered.ends_with("hello\n"));
    }

    #[test]
    fn render_parse_round_trips_declared_fields_and_body() {
        let handler = MarkdownFrontMatterHandler::new(vec![FieldSpec::scalar("state")]);
        let n = node(&[("state", json!("open")), ("body", json!("hello world"))]);
        let rendered = handler.render(&n);
        let parsed = handler.parse(&rendered).unwrap();
        assert_eq!(parsed.id.as_deref(), Some("github:owner/repo#1"));
        assert_eq!(parsed.node_type.as_deref(), Some("github.Issue"));
        assert_eq!(parsed.attrs.get("state"), Some(&json!("open")));
        assert_eq!(parsed.body, "hello world");
    }

    #[test]
    fn parse_tolerates_crlf_line_endings() {
        let handler = MarkdownFrontMatterHandler::fallback();
        let content = "---\r\n_id: x:1\r\n_type: t\r\n---\r\n\r\nbody text\r\n";
        let parsed = handler.parse(content).unwrap();
        assert_eq!(parsed.id.as_deref(), Some("x:1"));
        assert_eq!(parsed.body, "body text");
    }

    #[test]
    fn missing_front_matter_is_treated_as_body_only() {
        let handler = MarkdownFrontMatterHandler::fallback();
        let parsed = handler.parse("just some text\nwith no front matter").unwrap();
        assert!(parsed.id.is_none());
        assert_eq!(parsed.body, "just some text\nwith no front matter");
    }

    #[test]
    fn unclosed_front_matter_is_an_error() {
        let handler = MarkdownFrontMatterHandler::fallback();
        let err = handler.parse("---\n_id: x:1\nno closing delimiter").unwrap_err();
        assert!(matches!(err, FormatError::MissingFrontMatter));
    }

    #[test]
    fn non_string_id_is_an_error() {
        let handler = MarkdownFrontMatterHandler::fallback();
        let err = handler.parse("---\n_id: 1\n---\n\nbody").unwrap_err();
        assert!(matches!(err, FormatError::InvalidId));
    }

    #[test]
    fn fallback_declares_only_body_as_editable() {
        let handler = MarkdownFrontMatterHandler::fallback();
        assert_eq!(handler.editable_fields().len(), 1);
        assert_eq!(handler.editable_fields()[0].kind, ValueKind::Text);
    }
}
