//! `hardcopy refresh <pattern> [--clean] [--sync-first]`.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use hardcopy_core::{CancellationToken, RefreshOptions};
use tracing::instrument;

use super::context::{Context, query_params};
use super::pull::pull_known_nodes;

#[derive(Args)]
pub struct RefreshArgs {
    /// Substring matched against each configured view's path; all views
    /// refresh if omitted.
    pattern: Option<String>,

    /// Delete files no longer produced by the view's query.
    #[arg(long)]
    clean: bool,

    /// Pull known nodes from their Providers before refreshing.
    #[arg(long)]
    sync_first: bool,
}

#[instrument(skip_all, fields(root = %root.display(), pattern = args.pattern.as_deref()))]
pub fn run(root: &Path, args: &RefreshArgs) -> Result<ExitCode> {
    let ctx = Context::load(root)?;

    if args.sync_first {
        let (updated, errors) = pull_known_nodes(&ctx.store, &ctx.providers)?;
        println!("Pulled {updated} node(s) from providers.");
        for err in &errors {
            eprintln!("  warning: {err}");
        }
    }

    let options = RefreshOptions { clean: args.clean, ..RefreshOptions::default() };
    let params = query_params();
    let token = CancellationToken::new();

    let mut matched = 0;
    for view in &ctx.config.views {
        let path_str = view.path.to_string_lossy();
        if let Some(pattern) = &args.pattern
            && !path_str.contains(pattern.as_str())
        {
            continue;
        }
        matched += 1;
        let report = hardcopy_core::refresh(&ctx.store, &ctx.handlers, &ctx.root, view, &params, &options, &token)?;
        println!(
            "'{}': {} written, {} orphaned{}, {} error(s).",
            view.path.display(),
            report.written.len(),
            report.orphaned.len(),
            if report.cleaned { " (cleaned)" } else { "" },
            report.errors.len()
        );
        for err in &report.errors {
            eprintln!("  warning: {err}");
        }
    }

    if matched == 0 {
        println!("No configured view matched.");
    }
    Ok(ExitCode::SUCCESS)
}
