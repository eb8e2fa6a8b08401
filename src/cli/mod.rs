//! CLI command definitions for projrc
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod publish;
pub mod show;
pub mod sync;

use clap::{Parser, Subcommand};
use show::ShowArgs;
use std::path::PathBuf;
use sync::{CloneArgs, SourceArgs};

/// Distribute and merge project configuration overlays
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Repository root (default: found from the working directory)
    #[arg(short = 'R', long, global = true, value_name = "REPO")]
    pub repository: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    /// Never prompt; take the default answer
    #[arg(short = 'y', long, global = true)]
    pub noninteractive: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the effective configuration
    Show(ShowArgs),

    /// Fetch the overlay from a repository and apply it
    Pull(SourceArgs),

    /// Create a new repository and fetch the overlay into it
    Clone(CloneArgs),

    /// Check a repository for overlay changes (see projrc.updateonincoming)
    Incoming(SourceArgs),

    /// Print the overlay this repository publishes, as JSON
    Publish,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["projrc", "pull", "central", "-R", "/work/repo", "-y"]).unwrap();
        assert_eq!(cli.repository, Some(PathBuf::from("/work/repo")));
        assert!(cli.noninteractive);
        assert_eq!(cli.log, "2");
        match cli.command {
            Command::Pull(args) => assert_eq!(args.source, "central"),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_pull_defaults_to_default_path() {
        let cli = Cli::try_parse_from(["projrc", "incoming"]).unwrap();
        match cli.command {
            Command::Incoming(args) => assert_eq!(args.source, "default"),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_clone_needs_destination() {
        assert!(Cli::try_parse_from(["projrc", "clone", "/srv/central"]).is_err());
        let cli = Cli::try_parse_from(["projrc", "clone", "/srv/central", "work"]).unwrap();
        assert!(matches!(cli.command, Command::Clone(_)));
    }

    #[test]
    fn test_show_debug_flag() {
        let cli = Cli::try_parse_from(["projrc", "show", "--debug", "ui"]).unwrap();
        match cli.command {
            Command::Show(args) => {
                assert!(args.debug);
                assert_eq!(args.names, vec!["ui"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
