//! Logging setup for the command line.
//!
//! Status lines (`info!`), rejected payloads (`warn!`) and sync state
//! transitions (`debug!`) all go through `tracing`. The `--log` option picks
//! where they end up; `RUST_LOG` overrides the level.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    Off,
    Stdout,
    Stderr,
    /// Appended to, without ANSI colors.
    File(PathBuf),
}

impl LogDestination {
    /// Parse a `--log` value: `0/off`, `1/stdout`, `2/stderr` or a file name.
    pub fn parse(value: &str) -> Self {
        match value {
            "0" | "off" => Self::Off,
            "1" | "stdout" => Self::Stdout,
            "2" | "stderr" => Self::Stderr,
            filename => Self::File(PathBuf::from(filename)),
        }
    }
}

/// Install the global subscriber.
pub fn init(dest: &str, verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    match LogDestination::parse(dest) {
        LogDestination::Off => {}
        LogDestination::Stdout => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogDestination::Stderr => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogDestination::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_destination() {
        assert_eq!(LogDestination::parse("0"), LogDestination::Off);
        assert_eq!(LogDestination::parse("off"), LogDestination::Off);
        assert_eq!(LogDestination::parse("1"), LogDestination::Stdout);
        assert_eq!(LogDestination::parse("stderr"), LogDestination::Stderr);
        assert_eq!(
            LogDestination::parse("sync.log"),
            LogDestination::File(PathBuf::from("sync.log"))
        );
    }
}
