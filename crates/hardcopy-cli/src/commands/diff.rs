//! `hardcopy diff [pattern] [--all]` — local edits not yet pushed.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use hardcopy_core::detect_changes;
use tracing::instrument;

use super::context::Context;
use super::discover::discover_candidates;

#[derive(Args)]
pub struct DiffArgs {
    /// Substring matched against each candidate's view-relative path.
    pattern: Option<String>,

    /// Also print files with no local edits.
    #[arg(long)]
    all: bool,
}

#[instrument(skip_all, fields(root = %root.display()))]
pub fn run(root: &Path, args: &DiffArgs) -> Result<ExitCode> {
    let ctx = Context::load(root)?;
    let candidates = discover_candidates(&ctx, args.pattern.as_deref())?;

    let mut any = false;
    for candidate in &candidates {
        let Some(node) = ctx.store.get_node(&candidate.node_id)? else {
            println!("{}: new (no stored base)", candidate.view_rel_path);
            any = true;
            continue;
        };
        let handler = ctx.handlers.handler_for(&node.node_type);
        let path = ctx.root.join(&candidate.view_rel_path);
        let changes = detect_changes(&ctx.store, handler.as_ref(), &node, &path, &candidate.view_rel_path, true)?;

        if changes.is_empty() {
            if args.all {
                println!("{}: unchanged", candidate.view_rel_path);
                any = true;
            }
            continue;
        }

        any = true;
        println!("{}:", candidate.view_rel_path);
        for change in &changes {
            println!("  {}: {} -> {}", change.field, change.old_value, change.new_value);
        }
    }

    if !any {
        println!("No local edits.");
    }
    Ok(ExitCode::SUCCESS)
}
