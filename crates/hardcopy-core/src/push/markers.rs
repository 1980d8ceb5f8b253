//! Render/parse a conflict artifact's human-editable body: one `## <field>`
//! block per diverged field, each carrying the LOCAL/BASE/REMOTE marker
//! grammar (spec.md §6).

use serde_json::Value;
use thiserror::Error;

use crate::model::FieldConflict;

const LOCAL_MARKER: &str = "<<<<<<< LOCAL";
const BASE_MARKER: &str = "||||||| BASE";
const SEP_MARKER: &str = "=======";
const REMOTE_MARKER: &str = ">>>>>>> REMOTE";

/// Errors parsing a conflict artifact body back into per-field values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarkersError {
    /// A `## <field>` block was missing one of the four markers, or they
    /// appeared out of order.
    #[error("malformed conflict markers in block for field '{field}'")]
    MalformedBlock {
        /// The field whose block failed to parse.
        field: String,
    },
    /// A non-`body` field's side did not parse as JSON.
    #[error("field '{field}' side is not valid JSON: {detail}")]
    InvalidJson {
        /// The field whose side failed to parse.
        field: String,
        /// The underlying JSON error's message.
        detail: String,
    },
}

/// Render every diverged field in `conflicts` as one `## <field>` marker
/// block each, in input order, with a blank line between blocks.
#[must_use]
pub fn render_conflict_body(conflicts: &[FieldConflict]) -> String {
    let mut out = String::new();
    for (i, conflict) in conflicts.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str("## ");
        out.push_str(&conflict.field);
        out.push('\n');
        out.push_str(LOCAL_MARKER);
        out.push('\n');
        out.push_str(&side_text(&conflict.field, &conflict.local));
        out.push('\n');
        out.push_str(BASE_MARKER);
        out.push('\n');
        out.push_str(&side_text(&conflict.field, &conflict.base));
        out.push('\n');
        out.push_str(SEP_MARKER);
        out.push('\n');
        out.push_str(&side_text(&conflict.field, &conflict.remote));
        out.push('\n');
        out.push_str(REMOTE_MARKER);
        out.push('\n');
    }
    out
}

fn side_text(field: &str, value: &Value) -> String {
    if field == "body" {
        value.as_str().unwrap_or_default().to_owned()
    } else {
        value.to_string()
    }
}

fn side_value(field: &str, text: &str) -> Result<Value, MarkersError> {
    if field == "body" {
        Ok(Value::String(text.to_owned()))
    } else {
        serde_json::from_str(text.trim()).map_err(|e| MarkersError::InvalidJson {
            field: field.to_owned(),
            detail: e.to_string(),
        })
    }
}

/// Parse a conflict artifact body back into `(field, local, base, remote)`
/// triples, tolerant of CRLF line endings.
///
/// # Errors
/// Returns [`MarkersError`] if a block is malformed or a non-`body` side
/// fails to parse as JSON.
pub fn parse_conflict_markers(body: &str) -> Result<Vec<(String, Value, Value, Value)>, MarkersError> {
    let normalized = body.replace("\r\n", "\n");
    let lines: Vec<&str> = normalized.lines().collect();

    let mut blocks: Vec<(String, Vec<&str>)> = Vec::new();
    for line in &lines {
        if let Some(field) = line.strip_prefix("## ") {
            blocks.push((field.trim().to_owned(), Vec::new()));
        } else if let Some((_, lines)) = blocks.last_mut() {
            lines.push(line);
        }
    }

    blocks.into_iter().map(|(field, block_lines)| parse_block(&field, &block_lines)).collect()
}

fn parse_block(field: &str, lines: &[&str]) -> Result<(String, Value, Value, Value), MarkersError> {
    let malformed = || MarkersError::MalformedBlock { field: field.to_owned() };

    let local_start = lines.iter().position(|l| *l == LOCAL_MARKER).ok_or_else(malformed)?;
    let base_start = lines.iter().position(|l| *l == BASE_MARKER).ok_or_else(malformed)?;
    let sep = lines.iter().position(|l| *l == SEP_MARKER).ok_or_else(malformed)?;
    let remote_end = lines.iter().position(|l| *l == REMOTE_MARKER).ok_or_else(malformed)?;
    if !(local_start < base_start && base_start < sep && sep < remote_end) {
        return Err(malformed());
    }

    let local_text = lines[local_start + 1..base_start].join("\n");
    let base_text = lines[base_start + 1..sep].join("\n");
    let remote_text = lines[sep + 1..remote_end].join("\n");

    Ok((
        field.to_owned(),
        side_value(field, &local_text)?,
        side_value(field, &base_text)?,
        side_value(field, &remote_text)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldStatus;
    use serde_json::json;

    fn fc(field: &str, base: Value, local: Value, remote: Value) -> FieldConflict {
        FieldConflict { field: field.to_owned(), status: FieldStatus::Diverged, can_auto_merge: false, base, local, remote }
    }

    #[test]
    fn body_field_round_trips_raw_text() {
        let conflicts = vec![fc("body", json!("base text"), json!("local text"), json!("remote text"))];
        let rendered = render_conflict_body(&conflicts);
        let parsed = parse_conflict_markers(&rendered).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0], ("body".to_owned(), json!("local text"), json!("base text"), json!("remote text")));
    }

    #[test]
    fn scalar_field_round_trips_as_json() {
        let conflicts = vec![fc("state", json!("open"), json!("closed"), json!("reopened"))];
        let rendered = render_conflict_body(&conflicts);
        let parsed = parse_conflict_markers(&rendered).unwrap();
        assert_eq!(parsed[0], ("state".to_owned(), json!("closed"), json!("open"), json!("reopened")));
    }

    #[test]
    fn multiple_fields_round_trip_in_order() {
        let conflicts = vec![
            fc("title", json!("a"), json!("b"), json!("c")),
            fc("body", json!("x"), json!("y"), json!("z")),
        ];
        let rendered = render_conflict_body(&conflicts);
        let parsed = parse_conflict_markers(&rendered).unwrap();
        assert_eq!(parsed.iter().map(|(f, ..)| f.clone()).collect::<Vec<_>>(), vec!["title", "body"]);
    }

    #[test]
    fn tolerates_crlf_line_endings() {
        let conflicts = vec![fc("body", json!("b"), json!("l"), json!("r"))];
        let rendered = render_conflict_body(&conflicts).replace('\n', "\r\n");
        let parsed = parse_conflict_markers(&rendered).unwrap();
        assert_eq!(parsed[0].1, json!("l"));
    }

    #[test]
    fn missing_marker_is_malformed() {
        let err = parse_conflict_markers("## body\n<<<<<<< LOCAL\nfoo\n").unwrap_err();
        assert_eq!(err, MarkersError::MalformedBlock { field: "body".to_owned() });
    }
}
