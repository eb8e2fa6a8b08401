//! projrc command line.

use anyhow::{Context, Result};
use clap::Parser;
use projrc::cli::{publish, show, sync, Cli, Command};
use projrc::config::ConfigLoader;
use projrc::logging;
use std::path::Path;
use tracing::debug;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log, cli.verbose)?;

    // The clone destination must exist before its configuration is loaded.
    let repository = match &cli.command {
        Command::Clone(args) => {
            sync::prepare_clone(&args.dest)?;
            Some(args.dest.clone())
        }
        _ => cli.repository.clone(),
    };

    let loader = ConfigLoader::load(repository)?;
    debug!(files = ?loader.loaded_files(), "Configuration loaded");
    let interactive = !cli.noninteractive;
    let config = loader.effective();

    match &cli.command {
        Command::Show(args) => {
            show::run_show(config, args, &mut std::io::stdout().lock())?;
        }
        Command::Pull(args) => {
            let outcome = sync::run_pull(config, repo_root(&loader)?, args, interactive)?;
            debug!(?outcome, "Pull finished");
        }
        Command::Clone(args) => {
            let outcome = sync::run_clone(config, args, interactive)?;
            debug!(?outcome, "Clone finished");
        }
        Command::Incoming(args) => {
            let outcome = sync::run_incoming(config, repo_root(&loader)?, args, interactive)?;
            debug!(?outcome, "Incoming finished");
        }
        Command::Publish => {
            publish::run_publish(repo_root(&loader)?, &mut std::io::stdout().lock())?;
        }
    }

    Ok(())
}

fn repo_root(loader: &ConfigLoader) -> Result<&Path> {
    loader
        .repo_root()
        .context("no repository found (.hg not found in the working directory or its parents)")
}
