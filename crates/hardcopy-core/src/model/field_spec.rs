//! Per-type format descriptors (spec §9 "Dynamic typing of attributes").
//!
//! A [`FieldSpec`] enumerates one editable field and its expected value
//! kind. The diff detector and push pipeline consult these to decide which
//! comparison/merge rule applies to a field; `ValueKind::List` is what
//! makes a field eligible for auto-merge (spec §4.4).

use serde::{Deserialize, Serialize};

/// The expected shape of an editable field's value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// A single scalar (string, number, bool, null).
    Scalar,
    /// A JSON array — eligible for set-union auto-merge.
    List,
    /// Free text compared after trimming (normally just `body`).
    Text,
}

/// One editable field declared by a [`crate::format::FormatHandler`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Front-matter / attrs key, or the literal `"body"`.
    pub name: String,
    /// Expected value shape.
    pub kind: ValueKind,
}

impl FieldSpec {
    /// Declare a scalar field.
    #[must_use]
    pub fn scalar(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: ValueKind::Scalar }
    }

    /// Declare a list field.
    #[must_use]
    pub fn list(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: ValueKind::List }
    }

    /// Declare the free-text body field.
    #[must_use]
    pub fn text(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: ValueKind::Text }
    }
}
