//! Publish subcommand for projrc
//!
//! Prints the key mapping this repository serves to peers that ask for its
//! overlay.

use crate::sync::Publisher;
use anyhow::Result;
use std::io::Write;
use std::path::Path;

pub fn run_publish(repo_root: &Path, out: &mut impl Write) -> Result<()> {
    let keys = Publisher::for_repo(repo_root).list_keys();
    serde_json::to_writer_pretty(&mut *out, &keys)?;
    writeln!(out)?;
    Ok(())
}
