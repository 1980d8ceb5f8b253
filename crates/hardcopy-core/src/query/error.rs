//! Query parse errors with a byte offset and a one-line caret pointer, so a
//! bad pattern is easy to locate at a glance.

use std::fmt;

/// A graph query pattern failed to parse, or an evaluation-time reference
/// could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The pattern could not be tokenized or parsed.
    Parse {
        /// The original query text.
        source: String,
        /// Byte offset of the offending token.
        position: usize,
        /// Human-readable description of what was expected.
        message: String,
    },
    /// A `$name` placeholder in the query had no matching entry in `params`.
    MissingParam {
        /// The placeholder name, without the leading `$`.
        name: String,
    },
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { source, position, message } => {
                writeln!(f, "query parse error at byte {position}: {message}")?;
                writeln!(f, "  {source}")?;
                write!(f, "  {}^", " ".repeat(*position))
            }
            Self::MissingParam { name } => {
                write!(f, "query references undeclared parameter '${name}'")
            }
        }
    }
}

impl std::error::Error for QueryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_message_points_at_the_offending_byte() {
        let err = QueryError::Parse {
            source: "(x:Foo WHERE".to_owned(),
            position: 6,
            message: "expected ')'".to_owned(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("byte 6"));
        assert!(msg.contains("expected ')'"));
    }

    #[test]
    fn missing_param_message_names_it() {
        let err = QueryError::MissingParam { name: "me".to_owned() };
        assert!(format!("{err}").contains("$me"));
    }
}
