//! Show subcommand for projrc
//!
//! Prints the effective configuration, one `section.key=value` per line.

use crate::config::{ConfigEntry, EffectiveConfig};
use anyhow::Result;
use clap::Args;
use std::io::Write;

/// Arguments for the show subcommand
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Prefix every line with its source and tier
    #[arg(long)]
    pub debug: bool,

    /// Only show these sections or `section.key` names
    #[arg(value_name = "NAME")]
    pub names: Vec<String>,
}

pub fn run_show(config: &EffectiveConfig, args: &ShowArgs, out: &mut impl Write) -> Result<()> {
    let model = config.snapshot();

    for (section, entry) in model.iter() {
        if !selected(&args.names, section, entry) {
            continue;
        }
        let value = entry.value.replace('\n', "\\n");
        if args.debug {
            let tier = config.classifier().classify(entry.source.as_str());
            writeln!(out, "{} ({}): {}.{}={}", entry.source, tier, section, entry.key, value)?;
        } else {
            writeln!(out, "{}.{}={}", section, entry.key, value)?;
        }
    }
    Ok(())
}

fn selected(names: &[String], section: &str, entry: &ConfigEntry) -> bool {
    names.is_empty()
        || names.iter().any(|name| match name.split_once('.') {
            Some((s, k)) => s == section && k.eq_ignore_ascii_case(&entry.key),
            None => name == section,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Classifier, ConfigModel, RcPaths, SourceTag};

    fn config() -> EffectiveConfig {
        let mut model = ConfigModel::new();
        model.set("ui", "merge", "internal:merge", SourceTag::new("/r/.hg/projrc:2"));
        model.set("ui", "username", "alice", SourceTag::new("/r/.hg/hgrc:1"));
        model.set("hooks", "precommit", "check\n--strict", SourceTag::new("/r/.hg/hgrc:3"));
        EffectiveConfig::new(model, Classifier::new(&RcPaths::default()))
    }

    fn show(debug: bool, names: &[&str]) -> String {
        let args = ShowArgs {
            debug,
            names: names.iter().map(|s| s.to_string()).collect(),
        };
        let mut out = Vec::new();
        run_show(&config(), &args, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_show_all() {
        assert_eq!(
            show(false, &[]),
            "ui.merge=internal:merge\nui.username=alice\nhooks.precommit=check\\n--strict\n"
        );
    }

    #[test]
    fn test_show_selected_names() {
        assert_eq!(show(false, &["hooks"]), "hooks.precommit=check\\n--strict\n");
        assert_eq!(show(false, &["ui.USERNAME"]), "ui.username=alice\n");
    }

    #[test]
    fn test_show_debug() {
        assert_eq!(
            show(true, &["ui.merge"]),
            "/r/.hg/projrc:2 (project-overlay): ui.merge=internal:merge\n"
        );
    }
}
