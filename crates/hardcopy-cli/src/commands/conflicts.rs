//! `hardcopy conflicts` — list nodes with an open conflict artifact.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use tracing::instrument;

use super::context::Context;

#[instrument(skip_all, fields(root = %root.display()))]
pub fn run(root: &Path) -> Result<ExitCode> {
    let ctx = Context::load(root)?;
    let artifacts = ctx.store.list_conflict_artifacts()?;

    if artifacts.is_empty() {
        println!("No open conflicts.");
        return Ok(ExitCode::SUCCESS);
    }

    for artifact in &artifacts {
        let fields: Vec<&str> = artifact.fields.iter().map(|f| f.field.as_str()).collect();
        println!(
            "{}  ({})  {}  [{}]",
            artifact.node_id,
            artifact.node_type,
            artifact.view_rel_path,
            fields.join(", ")
        );
    }
    Ok(ExitCode::SUCCESS)
}
