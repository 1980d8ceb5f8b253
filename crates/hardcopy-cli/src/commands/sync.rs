//! `hardcopy sync` — pull known nodes from their Providers, then refresh
//! every configured view.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use hardcopy_core::{CancellationToken, RefreshOptions, refresh};
use tracing::instrument;

use super::context::{Context, query_params};
use super::pull::pull_known_nodes;

#[instrument(skip_all, fields(root = %root.display()))]
pub fn run(root: &Path) -> Result<ExitCode> {
    let ctx = Context::load(root)?;

    let (updated, pull_errors) = pull_known_nodes(&ctx.store, &ctx.providers)?;
    println!("Pulled {updated} node(s) from providers.");
    for err in &pull_errors {
        eprintln!("  warning: {err}");
    }

    let params = query_params();
    let token = CancellationToken::new();
    let mut total_written = 0;
    let mut total_errors = pull_errors.len();
    for view in &ctx.config.views {
        let report =
            refresh(&ctx.store, &ctx.handlers, &ctx.root, view, &params, &RefreshOptions::default(), &token)?;
        total_written += report.written.len();
        total_errors += report.errors.len();
        for err in &report.errors {
            eprintln!("  warning: {}: {err}", view.path.display());
        }
        println!("Refreshed '{}': {} file(s) written.", view.path.display(), report.written.len());
    }

    println!("sync complete: {total_written} file(s) current, {total_errors} error(s).");
    Ok(ExitCode::SUCCESS)
}
