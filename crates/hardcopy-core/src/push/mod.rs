//! C5: the push pipeline. Drives a `Provider` for clean and auto-merged
//! changes, persists conflict artifacts for anything left diverged, and
//! exposes the interactive resolution API (spec.md §4.5, §4.6).

mod error;
mod markers;
mod pipeline;
mod provider;

pub use error::PushError;
pub use markers::{MarkersError, parse_conflict_markers, render_conflict_body};
pub use pipeline::{EffectiveChange, PushOutcome, PushStats, Resolution, push_all, push_node, resolve_conflict};
pub use provider::{FetchResult, MemoryProvider, Provider, ProviderError, ProviderRegistry, PushSuccess, scheme_of};
