//! `hardcopy` — re-exports the sync engine core for integration tests.
//!
//! The primary interface is the `hardcopy` CLI binary (in the
//! `hardcopy-cli` crate). This crate exists so that workspace-level
//! integration tests under `tests/` can exercise the core through a single
//! stable path.

pub use hardcopy_core::*;
