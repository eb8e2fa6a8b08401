//! Tier-aware merging of an overlay into the local configuration.
//!
//! An overlay value only lands where nothing is set yet, or where the
//! existing value came from the same tier (an earlier pass of the same
//! overlay). Values from any other tier are left alone. Afterwards every
//! section is reordered by tier so the effective view reads in load order:
//! system, overlay, user, local repository.

use super::model::ConfigModel;
use super::tier::Classifier;
use tracing::{debug, trace};

/// Merge `overlay` into `local`, returning the combined model.
pub fn merge(mut local: ConfigModel, overlay: ConfigModel, classifier: &Classifier) -> ConfigModel {
    let mut applied = 0usize;

    for (section, entry) in overlay.into_entries() {
        let tier = classifier.classify(entry.source.as_str());
        let replace = match local.get(&section, &entry.key) {
            None => true,
            Some(existing) => classifier.classify(existing.source.as_str()) == tier,
        };

        if replace {
            trace!(section = %section, key = %entry.key, %tier, "Applying overlay value");
            local.set(&section, entry.key, entry.value, entry.source);
            applied += 1;
        } else {
            trace!(section = %section, key = %entry.key, "Keeping value from another tier");
        }
    }

    sort_by_tier(&mut local, classifier);
    debug!(applied, "Merged overlay into configuration");
    local
}

/// Stable-sort every section's entries by the tier of their source.
pub fn sort_by_tier(model: &mut ConfigModel, classifier: &Classifier) {
    for section in model.sections_mut() {
        section
            .entries_mut()
            .sort_by_key(|e| classifier.classify(e.source.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::SourceTag;
    use crate::config::tier::{RcPaths, Tier};
    use std::path::PathBuf;

    const SYSTEM: &str = "/etc/mercurial/hgrc";
    const USER: &str = "/home/alice/.hgrc";
    const REPO: &str = "/work/repo/.hg/hgrc";
    const OVERLAY: &str = "/work/repo/.hg/projrc";

    fn classifier() -> Classifier {
        Classifier::new(&RcPaths::with_files(
            vec![PathBuf::from(SYSTEM)],
            vec![PathBuf::from(USER)],
        ))
    }

    fn at(path: &str, line: usize) -> SourceTag {
        SourceTag::at_line(path, line)
    }

    fn overlay(entries: &[(&str, &str, &str)]) -> ConfigModel {
        let mut model = ConfigModel::new();
        for (i, (section, key, value)) in entries.iter().enumerate() {
            model.set(section, *key, *value, at(OVERLAY, i + 1));
        }
        model
    }

    #[test]
    fn test_fills_missing_keys() {
        let mut local = ConfigModel::new();
        local.set("ui", "username", "alice", at(USER, 1));

        let merged = merge(local, overlay(&[("ui", "merge", "internal:merge")]), &classifier());
        assert_eq!(merged.get_value("ui", "merge"), Some("internal:merge"));
        assert_eq!(merged.get_value("ui", "username"), Some("alice"));
    }

    #[test]
    fn test_never_overrides_other_tiers() {
        let mut local = ConfigModel::new();
        local.set("ui", "a", "system", at(SYSTEM, 1));
        local.set("ui", "b", "user", at(USER, 1));
        local.set("ui", "c", "repo", at(REPO, 1));

        let merged = merge(
            local,
            overlay(&[("ui", "a", "o"), ("ui", "b", "o"), ("ui", "c", "o")]),
            &classifier(),
        );
        assert_eq!(merged.get_value("ui", "a"), Some("system"));
        assert_eq!(merged.get_value("ui", "b"), Some("user"));
        assert_eq!(merged.get_value("ui", "c"), Some("repo"));
    }

    #[test]
    fn test_refreshes_earlier_overlay_pass() {
        let c = classifier();
        let first = merge(ConfigModel::new(), overlay(&[("ui", "merge", "old")]), &c);
        let second = merge(first, overlay(&[("ui", "merge", "new")]), &c);
        assert_eq!(second.get_value("ui", "merge"), Some("new"));
    }

    #[test]
    fn test_sections_resorted_by_tier() {
        let c = classifier();
        let mut local = ConfigModel::new();
        local.set("ui", "repo_key", "1", at(REPO, 1));
        local.set("ui", "user_key", "2", at(USER, 1));
        local.set("ui", "system_key", "3", at(SYSTEM, 1));
        local.set("ui", "repo_key2", "4", at(REPO, 2));

        let merged = merge(local, overlay(&[("ui", "overlay_key", "5")]), &c);

        let keys: Vec<_> = merged.section("ui").unwrap().entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["system_key", "overlay_key", "user_key", "repo_key", "repo_key2"]);

        let tiers: Vec<Tier> = merged.section("ui").unwrap().entries().iter()
            .map(|e| c.classify(e.source.as_str()))
            .collect();
        let mut sorted = tiers.clone();
        sorted.sort();
        assert_eq!(tiers, sorted);
    }

    #[test]
    fn test_new_sections_are_appended() {
        let mut local = ConfigModel::new();
        local.set("ui", "username", "alice", at(USER, 1));

        let merged = merge(local, overlay(&[("hooks", "commit", "echo hi")]), &classifier());
        let names: Vec<_> = merged.sections().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["ui", "hooks"]);
    }
}
