//! Errors from parsing or rendering a view file (spec.md §4.3, §6).

use thiserror::Error;

/// Errors surfaced by a [`super::FormatHandler`] or the path-template engine.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Content starts with `---` but the front-matter block is never closed.
    #[error("front matter is opened with '---' but never closed")]
    MissingFrontMatter,
    /// The front-matter YAML itself failed to parse.
    #[error("invalid front matter YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// `_id` was present but not a string.
    #[error("front matter '_id' must be a string")]
    InvalidId,
    /// `_type` was present but not a string.
    #[error("front matter '_type' must be a string")]
    InvalidType,
    /// A `{{` was opened in a template but never closed with `}}`.
    #[error("unterminated '{{{{' in template: {template}")]
    UnterminatedTemplateExpr {
        /// The full template string being rendered.
        template: String,
    },
    /// A `{{expr}}` referenced a field that doesn't exist on the node.
    #[error("template expression '{{{{{expr}}}}}' has no value on this node")]
    UnknownTemplateField {
        /// The raw expression text between the braces.
        expr: String,
    },
    /// A `{{expr}}` didn't match the restricted grammar (`id`, `type`,
    /// `attrs.<name>[.<name>...]`).
    #[error("unrecognized template expression '{{{{{expr}}}}}'")]
    UnknownTemplateExpr {
        /// The raw expression text between the braces.
        expr: String,
    },
}
