//! C3 format seam: per-type rendering of a [`Node`] to a file and parsing a
//! file back into its front-matter/body parts (spec.md §4.3, §9 "Format
//! handler" — "outside the core" as an interface, but the default Markdown
//! implementation and registry live here since the core must still invoke
//! them).

mod error;
mod front_matter;
mod template;

use std::collections::HashMap;
use std::sync::Arc;

pub use error::FormatError;
pub use front_matter::MarkdownFrontMatterHandler;
pub use template::render_template;

use crate::model::{Attrs, Node};
pub use crate::model::FieldSpec;

/// The parsed representation of an on-disk view file: front-matter
/// identity fields pulled out, remaining front-matter fields as `attrs`,
/// and the free-text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFile {
    /// The node id recovered from front matter (`_id`), if present and a
    /// string. `None` means "no recoverable id" (spec.md §4.4 step 1:
    /// classify such a file as unrelated).
    pub id: Option<String>,
    /// The node type recovered from front matter (`_type`), if present.
    pub node_type: Option<String>,
    /// Front-matter fields other than `_id`/`_type`, in document order.
    pub attrs: Attrs,
    /// The body text following the front-matter block, trimmed.
    pub body: String,
}

impl ParsedFile {
    /// Look up a field the way the diff detector wants it: `"body"` reads
    /// the body text, anything else reads `attrs`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<serde_json::Value> {
        if name == "body" {
            Some(serde_json::Value::String(self.body.clone()))
        } else {
            self.attrs.get(name).cloned()
        }
    }
}

/// A per-type descriptor: renders a [`Node`] to file content, parses file
/// content back, and declares which fields are editable (spec.md §4.3,
/// §4.4).
pub trait FormatHandler: Send + Sync {
    /// Render `node` to the content that should be written to disk.
    fn render(&self, node: &Node) -> String;

    /// Parse on-disk `content` back into a [`ParsedFile`].
    ///
    /// # Errors
    /// Returns [`FormatError`] if `content` opens a front-matter block that
    /// is never closed, or closes with malformed YAML.
    fn parse(&self, content: &str) -> Result<ParsedFile, FormatError>;

    /// The fields this handler treats as editable, and their expected
    /// value shape (drives structural-equality vs. auto-merge routing).
    fn editable_fields(&self) -> &[FieldSpec];
}

/// Maps a node's `type` to the [`FormatHandler`] that knows how to render
/// and parse it, falling back to a default Markdown handler for any type
/// without a specific registration (spec.md §4.3).
pub struct HandlerRegistry {
    by_type: HashMap<String, Arc<dyn FormatHandler>>,
    fallback: Arc<dyn FormatHandler>,
}

impl HandlerRegistry {
    /// Construct a registry backed by `fallback` for any unregistered type.
    #[must_use]
    pub fn new(fallback: Arc<dyn FormatHandler>) -> Self {
        Self { by_type: HashMap::new(), fallback }
    }

    /// A registry whose fallback is the default `MarkdownFrontMatterHandler`
    /// (body-only editable fields).
    #[must_use]
    pub fn with_markdown_fallback() -> Self {
        Self::new(Arc::new(MarkdownFrontMatterHandler::fallback()))
    }

    /// Register `handler` for `node_type`, replacing any prior registration.
    pub fn register(&mut self, node_type: impl Into<String>, handler: Arc<dyn FormatHandler>) {
        self.by_type.insert(node_type.into(), handler);
    }

    /// The handler for `node_type`: the specific registration if one
    /// exists, otherwise the fallback.
    #[must_use]
    pub fn handler_for(&self, node_type: &str) -> Arc<dyn FormatHandler> {
        self.by_type.get(node_type).cloned().unwrap_or_else(|| Arc::clone(&self.fallback))
    }
}
