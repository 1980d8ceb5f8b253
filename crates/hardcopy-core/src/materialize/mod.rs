//! C3: View materializer — renders query results to human-editable files
//! and keeps their on-disk state reconciled against the Store (spec.md §4.3).

mod error;
mod index;
mod refresh;
mod view;

pub use error::{IndexWriteError, MaterializeError};
pub use index::IndexSidecar;
pub use refresh::{RefreshOptions, RefreshReport, refresh};
pub use view::{Partition, RenderEntry, ViewDefinition};
