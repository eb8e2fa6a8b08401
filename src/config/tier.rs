//! Precedence tiers for configuration sources.
//!
//! Every config value carries a source tag. The tier of that source decides
//! which value survives when the overlay is merged into the local view, and in
//! which order entries appear in the effective configuration.

use super::model::strip_line_suffix;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Directory holding repository metadata.
pub const VCS_DIR: &str = ".hg";

/// File name of the overlay store inside [`VCS_DIR`].
pub const OVERLAY_FILE: &str = "projrc";

/// Configuration tier, in load order.
///
/// Later tiers win in the effective view: a repository's own `hgrc` beats
/// everything that was fetched or inherited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    /// System-wide files such as `/etc/mercurial/hgrc`
    System = 1,
    /// The distributed overlay (`.hg/projrc`)
    ProjectOverlay = 2,
    /// Per-user files such as `~/.hgrc`
    User = 3,
    /// The repository's own `hgrc`, `HGRCPATH` files and included files
    LocalRepo = 4,
}

impl Tier {
    pub fn rank(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::System => write!(f, "system"),
            Tier::ProjectOverlay => write!(f, "project-overlay"),
            Tier::User => write!(f, "user"),
            Tier::LocalRepo => write!(f, "local-repo"),
        }
    }
}

/// Well-known system and user config files.
#[derive(Debug, Clone, Default)]
pub struct RcPaths {
    pub system: Vec<PathBuf>,
    pub user: Vec<PathBuf>,
}

impl RcPaths {
    /// Discover the platform's system and user config files.
    pub fn discover() -> Self {
        let mut system = Vec::new();
        if cfg!(unix) {
            let etc = Path::new("/etc/mercurial");
            system.push(etc.join("hgrc"));
            system.extend(rc_files_in(&etc.join("hgrc.d")));
        }

        let mut user = Vec::new();
        if let Some(home) = dirs::home_dir() {
            user.push(home.join(".hgrc"));
            if cfg!(windows) {
                user.push(home.join("mercurial.ini"));
            }
        }
        if let Some(config) = dirs::config_dir() {
            user.push(config.join("hg").join("hgrc"));
        }

        Self { system, user }
    }

    /// Discovered once and cached for the rest of the process.
    pub fn global() -> &'static RcPaths {
        static GLOBAL: OnceLock<RcPaths> = OnceLock::new();
        GLOBAL.get_or_init(RcPaths::discover)
    }

    /// Explicit lists, mainly for tests.
    pub fn with_files(system: Vec<PathBuf>, user: Vec<PathBuf>) -> Self {
        Self { system, user }
    }
}

/// `*.rc` files of a directory, sorted by name. Missing directories yield nothing.
pub fn rc_files_in(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "rc") && p.is_file())
        .collect();
    files.sort();
    files
}

/// Assigns a [`Tier`] to a source tag.
#[derive(Debug, Clone)]
pub struct Classifier {
    system: Vec<String>,
    user: Vec<String>,
}

impl Classifier {
    pub fn new(paths: &RcPaths) -> Self {
        let as_strings = |list: &[PathBuf]| {
            list.iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect::<Vec<_>>()
        };
        Self {
            system: as_strings(&paths.system),
            user: as_strings(&paths.user),
        }
    }

    /// Process-wide classifier over [`RcPaths::global`].
    pub fn global() -> &'static Classifier {
        static GLOBAL: OnceLock<Classifier> = OnceLock::new();
        GLOBAL.get_or_init(|| Classifier::new(RcPaths::global()))
    }

    /// Classify a source path, with or without a `:<line>` suffix.
    pub fn classify(&self, source: &str) -> Tier {
        let path = strip_line_suffix(source);

        if self.system.iter().any(|p| p == path) {
            return Tier::System;
        }
        if path.replace('\\', "/").ends_with(&overlay_suffix()) {
            return Tier::ProjectOverlay;
        }
        if self.user.iter().any(|p| p == path) {
            return Tier::User;
        }
        Tier::LocalRepo
    }
}

fn overlay_suffix() -> String {
    format!("{}/{}", VCS_DIR, OVERLAY_FILE)
}

/// Classify with the process-wide classifier.
pub fn classify(source: &str) -> Tier {
    Classifier::global().classify(source)
}
