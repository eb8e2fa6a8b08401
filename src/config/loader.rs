//! Configuration loader.
//!
//! Reads the local config files in load order, then merges the stored
//! overlay of the active repository on top according to tier precedence.

use super::effective::EffectiveConfig;
use super::model::ConfigModel;
use super::parser::Parser;
use super::tier::{rc_files_in, Classifier, RcPaths, OVERLAY_FILE, VCS_DIR};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Repository-local config file inside [`VCS_DIR`].
pub const REPO_CONFIG_FILE: &str = "hgrc";

/// Environment variable replacing the system and user config files.
pub const SEARCH_PATH_ENV: &str = "HGRCPATH";

/// Where the loader looks for configuration.
#[derive(Debug, Clone, Default)]
pub struct LoadPaths {
    /// System and user files; also what the classifier knows about.
    pub rc: RcPaths,
    /// Files from [`SEARCH_PATH_ENV`], loaded instead of `rc` when set.
    pub search_path: Option<Vec<PathBuf>>,
    /// Repository found from the working directory.
    pub repo_root: Option<PathBuf>,
    /// Repository named on the command line.
    pub explicit_repo: Option<PathBuf>,
}

impl LoadPaths {
    /// Discover paths from the platform, the environment and the working directory.
    pub fn discover(explicit_repo: Option<PathBuf>) -> Self {
        let search_path = std::env::var_os(SEARCH_PATH_ENV).map(|value| {
            std::env::split_paths(&value)
                .filter(|p| !p.as_os_str().is_empty())
                .flat_map(|p| {
                    if p.is_dir() {
                        rc_files_in(&p)
                    } else {
                        vec![p]
                    }
                })
                .collect()
        });

        let repo_root = std::env::current_dir()
            .ok()
            .and_then(|cwd| find_repo(&cwd));

        Self {
            rc: RcPaths::global().clone(),
            search_path,
            repo_root,
            explicit_repo,
        }
    }

    /// Explicit system/user files and repository, ignoring the environment.
    pub fn with_repo(rc: RcPaths, repo_root: Option<PathBuf>) -> Self {
        Self {
            rc,
            search_path: None,
            repo_root,
            explicit_repo: None,
        }
    }

    /// The repository commands operate on.
    pub fn active_repo(&self) -> Option<&Path> {
        self.explicit_repo.as_deref().or(self.repo_root.as_deref())
    }

    /// Local config files in load order. Later files win.
    pub fn config_files(&self) -> Vec<PathBuf> {
        let mut files = match &self.search_path {
            Some(list) => list.clone(),
            None => self.rc.system.iter().chain(&self.rc.user).cloned().collect(),
        };
        if let Some(repo) = self.active_repo() {
            files.push(repo_config_path(repo));
        }
        files
    }

    /// Overlay stores to merge: the active repository's, plus the discovered
    /// one when a different repository was named explicitly.
    pub fn overlay_files(&self) -> Vec<PathBuf> {
        let mut roots: Vec<&Path> = Vec::new();
        if let Some(root) = self.repo_root.as_deref() {
            roots.push(root);
        }
        if let Some(explicit) = self.explicit_repo.as_deref() {
            if !roots.contains(&explicit) {
                roots.push(explicit);
            }
        }
        roots.into_iter().map(overlay_path).collect()
    }
}

/// Loads and holds the effective configuration.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: LoadPaths,
    effective: EffectiveConfig,
    /// Local files that existed and were read.
    loaded: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Load configuration from discovered paths.
    pub fn load(explicit_repo: Option<PathBuf>) -> Result<Self> {
        Self::load_with_paths(LoadPaths::discover(explicit_repo))
    }

    /// Load configuration with explicit paths.
    pub fn load_with_paths(paths: LoadPaths) -> Result<Self> {
        let mut model = ConfigModel::new();
        let mut loaded = Vec::new();

        for file in paths.config_files() {
            if !file.is_file() {
                continue;
            }
            Parser::local()
                .read_file(&mut model, &file)
                .with_context(|| format!("Failed to load config file {}", file.display()))?;
            debug!(path = %file.display(), "Loaded config file");
            loaded.push(file);
        }

        let effective = EffectiveConfig::new(model, Classifier::new(&paths.rc));

        for overlay in paths.overlay_files() {
            if let Err(e) = effective.apply_overlay_file(&overlay) {
                warn!(path = %overlay.display(), error = %e, "Ignoring unreadable projrc file");
            }
        }

        Ok(Self {
            paths,
            effective,
            loaded,
        })
    }

    pub fn effective(&self) -> &EffectiveConfig {
        &self.effective
    }

    pub fn into_effective(self) -> EffectiveConfig {
        self.effective
    }

    pub fn loaded_files(&self) -> &[PathBuf] {
        &self.loaded
    }

    pub fn repo_root(&self) -> Option<&Path> {
        self.paths.active_repo()
    }
}

/// Walk up from `start` to the first directory containing [`VCS_DIR`].
pub fn find_repo(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(VCS_DIR).is_dir())
        .map(Path::to_path_buf)
}

/// The overlay store of the repository at `root`.
pub fn overlay_path(root: &Path) -> PathBuf {
    root.join(VCS_DIR).join(OVERLAY_FILE)
}

pub fn repo_config_path(root: &Path) -> PathBuf {
    root.join(VCS_DIR).join(REPO_CONFIG_FILE)
}
