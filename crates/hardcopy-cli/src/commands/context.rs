//! Shared state every subcommand loads: config, Store, format handlers, and
//! the demonstration Provider registry (SPEC_FULL.md §10).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use hardcopy_core::{HandlerRegistry, HardcopyConfig, MemoryProvider, Node, Provider, ProviderRegistry, Store};

/// Everything a subcommand needs, loaded once from the workspace root.
pub struct Context {
    /// The workspace root (holds `hardcopy.yaml` and `.hardcopy/`).
    pub root: PathBuf,
    /// Parsed `hardcopy.yaml`.
    pub config: HardcopyConfig,
    /// The durable Store.
    pub store: Store,
    /// Format handlers (Markdown front-matter fallback, plus any
    /// per-type handlers a real deployment would register).
    pub handlers: HandlerRegistry,
    /// Scheme-dispatched Providers, one `MemoryProvider` per configured
    /// source.
    pub providers: ProviderRegistry,
}

impl Context {
    /// Load config, open the Store, and build the Provider registry.
    pub fn load(root: &Path) -> Result<Self> {
        let config_path = root.join("hardcopy.yaml");
        let config = HardcopyConfig::load(&config_path)
            .with_context(|| format!("loading '{}'", config_path.display()))?;

        let hardcopy_dir = root.join(".hardcopy");
        let store = Store::open(&hardcopy_dir)
            .with_context(|| format!("opening store at '{}'", hardcopy_dir.display()))?;

        let handlers = HandlerRegistry::with_markdown_fallback();
        let providers = build_provider_registry(&config, root)?;

        Ok(Self { root: root.to_path_buf(), config, store, handlers, providers })
    }
}

fn build_provider_registry(config: &HardcopyConfig, root: &Path) -> Result<ProviderRegistry> {
    let mut registry = ProviderRegistry::new();
    for source in &config.sources {
        let seed = match source.settings.get("fixture").and_then(serde_json::Value::as_str) {
            Some(rel_path) => load_fixture_nodes(&root.join(rel_path))?,
            None => Vec::new(),
        };
        registry.register(source.name.clone(), Arc::new(MemoryProvider::new(source.name.clone(), seed)) as Arc<dyn Provider>);
    }
    Ok(registry)
}

fn load_fixture_nodes(path: &Path) -> Result<Vec<Node>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading fixture '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing fixture '{}'", path.display()))
}

/// The query parameter environment every view query is evaluated against:
/// just `$me`, bound from `$HARDCOPY_ME`/`$GITHUB_USER` (spec.md §6).
#[must_use]
pub fn query_params() -> std::collections::HashMap<String, serde_json::Value> {
    let mut params = std::collections::HashMap::new();
    if let Some(me) = hardcopy_core::me_from_env() {
        params.insert("me".to_owned(), serde_json::Value::String(me));
    }
    params
}
