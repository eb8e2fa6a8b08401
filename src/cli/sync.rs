//! Pull, clone and incoming subcommands for projrc
//!
//! All three fetch the overlay from another repository. Pull and clone run
//! the active synchronization; incoming follows `projrc.updateonincoming`.

use crate::config::{expand_path_alias, EffectiveConfig, VCS_DIR};
use crate::sync::{
    IncomingOutcome, LocalPeer, OverlayStore, SyncOutcome, Synchronizer, TerminalPrompt,
};
use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

/// Arguments for the pull and incoming subcommands
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Repository path or `[paths]` alias
    #[arg(value_name = "SOURCE", default_value = "default")]
    pub source: String,
}

/// Arguments for the clone subcommand
#[derive(Args, Debug)]
pub struct CloneArgs {
    /// Repository path or `[paths]` alias
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Directory of the new repository
    #[arg(value_name = "DEST")]
    pub dest: PathBuf,
}

/// Resolve a source argument to a peer.
fn peer(config: &EffectiveConfig, source: &str) -> LocalPeer {
    LocalPeer::new(expand_path_alias(&config.snapshot(), source))
}

fn synchronizer<'a>(
    config: &'a EffectiveConfig,
    repo_root: &Path,
    interactive: bool,
) -> Synchronizer<'a, TerminalPrompt> {
    Synchronizer::new(
        config,
        OverlayStore::for_repo(repo_root),
        TerminalPrompt::new(interactive),
    )
}

pub fn run_pull(
    config: &EffectiveConfig,
    repo_root: &Path,
    args: &SourceArgs,
    interactive: bool,
) -> Result<SyncOutcome> {
    let peer = peer(config, &args.source);
    let outcome = synchronizer(config, repo_root, interactive)
        .sync(&peer, None)
        .with_context(|| format!("Failed to pull projrc from {}", args.source))?;
    Ok(outcome)
}

/// Create the repository metadata directory of a clone destination.
pub fn prepare_clone(dest: &Path) -> Result<()> {
    let vcs_dir = dest.join(VCS_DIR);
    if vcs_dir.exists() {
        bail!("destination '{}' already exists", dest.display());
    }
    std::fs::create_dir_all(&vcs_dir)
        .with_context(|| format!("Failed to create {}", vcs_dir.display()))
}

/// Fetch the overlay into a destination prepared by [`prepare_clone`].
pub fn run_clone(config: &EffectiveConfig, args: &CloneArgs, interactive: bool) -> Result<SyncOutcome> {
    let peer = peer(config, &args.source);
    let outcome = synchronizer(config, &args.dest, interactive)
        .sync(&peer, None)
        .with_context(|| format!("Failed to clone projrc from {}", args.source))?;
    Ok(outcome)
}

pub fn run_incoming(
    config: &EffectiveConfig,
    repo_root: &Path,
    args: &SourceArgs,
    interactive: bool,
) -> Result<IncomingOutcome> {
    let peer = peer(config, &args.source);
    let outcome = synchronizer(config, repo_root, interactive)
        .incoming(&peer)
        .with_context(|| format!("Failed to check {} for projrc changes", args.source))?;
    Ok(outcome)
}
