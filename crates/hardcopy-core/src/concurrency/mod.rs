//! Cooperative cancellation and bounded parallelism for batch operations
//! (spec.md §5: "long-running refresh/push batches must be cancellable
//! between node operations, and must bound how many file renders or
//! Provider calls run concurrently").

mod cancel;
mod pool;

pub use cancel::{CancellationToken, Cancelled};
pub use pool::{DEFAULT_PARALLELISM, run_bounded};
