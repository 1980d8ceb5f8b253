//! Core data model: nodes, edges, attribute values, conflict artifacts,
//! and per-type field descriptors (spec §3, §9).

pub mod conflict;
pub mod edge;
pub mod field_spec;
pub mod node;
pub mod value;

pub use conflict::{ConflictArtifact, FieldConflict, FieldStatus};
pub use edge::Edge;
pub use field_spec::{FieldSpec, ValueKind};
pub use node::{Attrs, Node, NodeError};
pub use value::{auto_merge_union, canonical_string, structural_eq};
