//! `hardcopy init` — scaffold `hardcopy.yaml` and the `.hardcopy/` Store.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use hardcopy_core::Store;
use tracing::instrument;

const DEFAULT_CONFIG: &str = "\
sources: []
views: []
";

#[instrument(skip_all, fields(root = %root.display()))]
pub fn run(root: &Path) -> Result<ExitCode> {
    std::fs::create_dir_all(root).with_context(|| format!("creating '{}'", root.display()))?;

    let config_path = root.join("hardcopy.yaml");
    if config_path.exists() {
        println!("'{}' already exists, leaving it in place.", config_path.display());
    } else {
        std::fs::write(&config_path, DEFAULT_CONFIG)
            .with_context(|| format!("writing '{}'", config_path.display()))?;
        println!("Wrote '{}'.", config_path.display());
    }

    let hardcopy_dir = root.join(".hardcopy");
    Store::open(&hardcopy_dir).with_context(|| format!("initializing store at '{}'", hardcopy_dir.display()))?;
    println!("Initialized store at '{}'.", hardcopy_dir.display());

    Ok(ExitCode::SUCCESS)
}
