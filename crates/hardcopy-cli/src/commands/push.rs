//! `hardcopy push [pattern] [--dry-run] [--force]` — drive the push
//! pipeline over every discovered candidate (spec.md §4.5/§6).
//!
//! Exit codes follow spec.md §6: 0 if everything pushed or had nothing to
//! push, 2 if any node produced a conflict artifact (no resolver is wired
//! up at this layer), 1 if a node-level error occurred and nothing else
//! succeeded.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use hardcopy_core::{CancellationToken, changed_fields, classify_node, diverged_fields, is_unresolvable, push_all};
use tracing::instrument;

use super::context::Context;
use super::discover::discover_candidates;

#[derive(Args)]
pub struct PushArgs {
    /// Substring matched against each candidate's view-relative path.
    pattern: Option<String>,

    /// Report what would happen without pushing or writing anything.
    #[arg(long)]
    dry_run: bool,

    /// Skip conflict detection: push every locally changed editable field
    /// as-is.
    #[arg(long)]
    force: bool,
}

#[instrument(skip_all, fields(root = %root.display(), dry_run = args.dry_run, force = args.force))]
pub fn run(root: &Path, args: &PushArgs) -> Result<ExitCode> {
    let ctx = Context::load(root)?;
    let candidates = discover_candidates(&ctx, args.pattern.as_deref())?;

    if args.dry_run {
        return dry_run(&ctx, &candidates, args.force);
    }

    let ids: Vec<(String, String)> =
        candidates.iter().map(|c| (c.node_id.clone(), c.view_rel_path.clone())).collect();
    let token = CancellationToken::new();
    let stats = push_all(&ctx.store, &ctx.providers, &ctx.handlers, &ctx.root, &ids, args.force, &token);

    println!(
        "{} pushed, {} skipped, {} conflict(s), {} error(s){}.",
        stats.pushed,
        stats.skipped,
        stats.conflicts,
        stats.errors.len(),
        if stats.cancelled { " (cancelled)" } else { "" }
    );
    for err in &stats.errors {
        eprintln!("  error: {err}");
    }

    if stats.pushed == 0 && stats.skipped == 0 && stats.conflicts == 0 && !stats.errors.is_empty() {
        return Ok(ExitCode::from(1));
    }
    if stats.conflicts > 0 {
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

/// Classify every candidate without touching the Store or the filesystem:
/// re-read and re-fetch, exactly like [`hardcopy_core::push_node`] would,
/// but stop short of calling `Provider::push`.
fn dry_run(ctx: &Context, candidates: &[super::discover::Candidate], force: bool) -> Result<ExitCode> {
    let mut would_conflict = 0;
    let mut would_push = 0;

    for candidate in candidates {
        let Some(base) = ctx.store.get_node(&candidate.node_id)? else {
            println!("{}: new (no stored base, skipped)", candidate.view_rel_path);
            continue;
        };
        let handler = ctx.handlers.handler_for(&base.node_type);
        let path = ctx.root.join(&candidate.view_rel_path);
        let content = std::fs::read_to_string(&path)?;
        let local = handler.parse(&content)?;

        if force {
            let changes = changed_fields(handler.editable_fields(), &base, &local);
            if changes.is_empty() {
                println!("{}: no local edits, would skip", candidate.view_rel_path);
            } else {
                let fields: Vec<&str> = changes.iter().map(|c| c.field.as_str()).collect();
                println!("{}: would force-push [{}]", candidate.view_rel_path, fields.join(", "));
                would_push += 1;
            }
            continue;
        }

        let Some(provider) = ctx.providers.provider_for(&candidate.node_id) else {
            println!("{}: no provider registered", candidate.view_rel_path);
            continue;
        };
        let fetch = provider.fetch_node(&candidate.node_id)?;
        let Some(remote) = fetch.node else {
            println!("{}: remote node gone, would skip", candidate.view_rel_path);
            continue;
        };

        let conflicts = classify_node(handler.editable_fields(), &base, &local, &remote);
        if is_unresolvable(&conflicts) {
            let diverged = diverged_fields(&conflicts);
            let fields: Vec<&str> = diverged.iter().map(|f| f.field.as_str()).collect();
            println!("{}: would conflict [{}]", candidate.view_rel_path, fields.join(", "));
            would_conflict += 1;
        } else {
            println!("{}: would push", candidate.view_rel_path);
            would_push += 1;
        }
    }

    println!("{would_push} would push, {would_conflict} would conflict.");
    Ok(ExitCode::SUCCESS)
}
