//! Bring the Store's known nodes up to date with their Providers.
//!
//! Not a C1–C5 operation in its own right — it's the CLI-level seam that
//! gives `sync`/`--sync-first` something to do against a demonstration
//! `Provider` registry (SPEC_FULL.md §10): refresh just replays whatever
//! the Store already holds, so something has to call `fetch_node` first.

use hardcopy_core::{ProviderRegistry, Store, scheme_of};

/// Refetch every node already known to the Store from its registered
/// Provider and upsert the result. Returns `(updated, errors)`.
pub fn pull_known_nodes(store: &Store, providers: &ProviderRegistry) -> anyhow::Result<(usize, Vec<String>)> {
    let mut updated = 0;
    let mut errors = Vec::new();
    for node in store.query_nodes(None)? {
        let Some(provider) = providers.provider_for(&node.id) else {
            errors.push(format!("{}: no provider registered for scheme '{}'", node.id, scheme_of(&node.id)));
            continue;
        };
        match provider.fetch_node(&node.id) {
            Ok(result) => {
                if let Some(fresh) = result.node {
                    store.upsert_node(&fresh)?;
                    updated += 1;
                }
            }
            Err(err) => errors.push(format!("{}: {err}", node.id)),
        }
    }
    Ok((updated, errors))
}
