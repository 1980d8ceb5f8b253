//! `hardcopy status [-s]` — per-file sync state, no network I/O.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use hardcopy_core::detect_changes;
use tracing::instrument;

use super::context::Context;
use super::discover::discover_candidates;

#[derive(Args)]
pub struct StatusArgs {
    /// Print one line per file (`<marker> <path>`) instead of a detailed
    /// report.
    #[arg(short = 's', long)]
    short: bool,
}

enum State {
    New,
    Conflict,
    Dirty(usize),
    Synced,
}

impl State {
    fn marker(&self) -> &'static str {
        match self {
            Self::New => "?",
            Self::Conflict => "U",
            Self::Dirty(_) => "M",
            Self::Synced => " ",
        }
    }

    fn label(&self) -> String {
        match self {
            Self::New => "new".to_owned(),
            Self::Conflict => "conflict".to_owned(),
            Self::Dirty(n) => format!("dirty ({n} field(s) changed)"),
            Self::Synced => "synced".to_owned(),
        }
    }
}

#[instrument(skip_all, fields(root = %root.display()))]
pub fn run(root: &Path, args: &StatusArgs) -> Result<ExitCode> {
    let ctx = Context::load(root)?;
    let candidates = discover_candidates(&ctx, None)?;

    for candidate in &candidates {
        let state = classify(&ctx, candidate)?;
        if args.short {
            println!("{} {}", state.marker(), candidate.view_rel_path);
        } else {
            println!("{}  {}  {}", state.marker(), candidate.view_rel_path, state.label());
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn classify(ctx: &Context, candidate: &super::discover::Candidate) -> Result<State> {
    let Some(node) = ctx.store.get_node(&candidate.node_id)? else {
        return Ok(State::New);
    };
    if ctx.store.get_conflict_artifact(&candidate.node_id)?.is_some() {
        return Ok(State::Conflict);
    }
    let handler = ctx.handlers.handler_for(&node.node_type);
    let path = ctx.root.join(&candidate.view_rel_path);
    let changes = detect_changes(&ctx.store, handler.as_ref(), &node, &path, &candidate.view_rel_path, true)?;
    if changes.is_empty() { Ok(State::Synced) } else { Ok(State::Dirty(changes.len())) }
}
