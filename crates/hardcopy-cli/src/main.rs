//! `hardcopy` — thin CLI driving `hardcopy-core` through a demonstration
//! in-process `Provider` registry (SPEC_FULL.md §10).
//!
//! Subcommands mirror spec.md §6's command surface exactly. Real remote
//! adapters are out of scope; sources configured with a `fixture` key are
//! seeded from a JSON file of `Node`s, which is the seam a consumer would
//! replace with a real HTTP-backed `Provider`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// Keeps local, human-editable file mirrors of external entities in sync.
#[derive(Parser)]
#[command(name = "hardcopy")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Workspace root (holds `hardcopy.yaml` and `.hardcopy/`).
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create `hardcopy.yaml` and initialize the Store.
    Init,

    /// Pull known nodes from their Providers and refresh every view.
    Sync,

    /// Refresh views whose path matches `pattern`.
    Refresh(commands::refresh::RefreshArgs),

    /// Show per-node sync state (SYNCED / DIRTY / CONFLICT / new).
    Status(commands::status::StatusArgs),

    /// Push local edits to their Providers.
    Push(commands::push::PushArgs),

    /// Show local edits not yet pushed.
    Diff(commands::diff::DiffArgs),

    /// List nodes with an open conflict artifact.
    Conflicts,

    /// Resolve a node's open conflict by choosing a side per field.
    Resolve(commands::resolve::ResolveArgs),
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match dispatch(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn dispatch(cli: &Cli) -> anyhow::Result<ExitCode> {
    match &cli.command {
        Commands::Init => commands::init::run(&cli.root),
        Commands::Sync => commands::sync::run(&cli.root),
        Commands::Refresh(args) => commands::refresh::run(&cli.root, args),
        Commands::Status(args) => commands::status::run(&cli.root, args),
        Commands::Push(args) => commands::push::run(&cli.root, args),
        Commands::Diff(args) => commands::diff::run(&cli.root, args),
        Commands::Conflicts => commands::conflicts::run(&cli.root),
        Commands::Resolve(args) => commands::resolve::run(&cli.root, args),
    }
}
