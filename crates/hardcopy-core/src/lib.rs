//! `hardcopy-core` — the sync engine: a durable entity store (C1), a
//! restricted graph query language (C2), a view materializer (C3),
//! three-way conflict detection (C4), and the push/resolve pipeline (C5).
//!
//! Keeps local, human-editable file mirrors of entities from external
//! systems (issue trackers, code hosts, wikis) synchronized through a
//! last-known-good base and three-way merge, the way a distributed VCS
//! reconciles divergent history, but for individual structured records.

pub mod concurrency;
pub mod config;
pub mod diff;
pub mod error;
pub mod format;
pub mod materialize;
pub mod model;
pub mod push;
pub mod query;
pub mod store;

pub use concurrency::{CancellationToken, Cancelled, DEFAULT_PARALLELISM, run_bounded};
pub use config::{ConfigError, HardcopyConfig, SourceConfig, me_from_env};
pub use diff::{
    Change, ConflictError, Merge3Result, SemanticMergeOracle, changed_fields, classify_node, detect_changes,
    diverged_fields, effective_value, is_unresolvable, merge_lines,
};
pub use error::HardcopyError;
pub use format::{FieldSpec, FormatError, FormatHandler, HandlerRegistry, MarkdownFrontMatterHandler, ParsedFile};
pub use materialize::{
    IndexSidecar, IndexWriteError, MaterializeError, Partition, RefreshOptions, RefreshReport, RenderEntry,
    ViewDefinition, refresh,
};
pub use model::{
    Attrs, ConflictArtifact, Edge, FieldConflict, FieldStatus, Node, NodeError, ValueKind, auto_merge_union,
    canonical_string, structural_eq,
};
pub use push::{
    EffectiveChange, FetchResult, MarkersError, MemoryProvider, Provider, ProviderError, ProviderRegistry, PushError,
    PushOutcome, PushStats, PushSuccess, Resolution, parse_conflict_markers, push_all, push_node,
    render_conflict_body, resolve_conflict, scheme_of,
};
pub use query::{QueryError, query_view_nodes};
pub use store::{Store, StoreError};
