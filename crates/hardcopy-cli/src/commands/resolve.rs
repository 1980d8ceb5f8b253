//! `hardcopy resolve <node-id> [--local field]... [--remote field]...` —
//! settle an open conflict by choosing a side per diverged field (spec.md
//! §4.5/§4.6).

use std::collections::HashMap;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Result, bail};
use clap::Args;
use hardcopy_core::Resolution;
use tracing::instrument;

use super::context::Context;

#[derive(Args)]
pub struct ResolveArgs {
    /// The conflicted node's id.
    node_id: String,

    /// Field names to resolve by keeping the locally edited value.
    #[arg(long = "local", value_name = "FIELD")]
    local_fields: Vec<String>,

    /// Field names to resolve by taking the remote value.
    #[arg(long = "remote", value_name = "FIELD")]
    remote_fields: Vec<String>,
}

#[instrument(skip_all, fields(root = %root.display(), node_id = %args.node_id))]
pub fn run(root: &Path, args: &ResolveArgs) -> Result<ExitCode> {
    let ctx = Context::load(root)?;

    let mut resolution: HashMap<String, Resolution> = HashMap::new();
    for field in &args.local_fields {
        resolution.insert(field.clone(), Resolution::Local);
    }
    for field in &args.remote_fields {
        if resolution.insert(field.clone(), Resolution::Remote).is_some() {
            bail!("field '{field}' named on both --local and --remote");
        }
    }

    if resolution.is_empty() {
        bail!("pass at least one --local or --remote field");
    }

    hardcopy_core::resolve_conflict(&ctx.store, &ctx.providers, &ctx.handlers, &args.node_id, &resolution)?;
    println!("Resolved '{}'.", args.node_id);
    Ok(ExitCode::SUCCESS)
}
