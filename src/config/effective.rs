//! The process-wide effective configuration.
//!
//! Readers take cheap snapshots; a merge builds a new model from the current
//! one and swaps it in. Values are only ever added or overwritten, never
//! cleared, for the lifetime of the process.

use super::merge::merge;
use super::model::ConfigModel;
use super::parser::Parser;
use super::settings::SyncSettings;
use super::tier::Classifier;
use crate::error::LoadError;
use arc_swap::ArcSwap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Shared handle to the merged configuration.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    model: Arc<ArcSwap<ConfigModel>>,
    classifier: Classifier,
}

impl EffectiveConfig {
    pub fn new(model: ConfigModel, classifier: Classifier) -> Self {
        Self {
            model: Arc::new(ArcSwap::from_pointee(model)),
            classifier,
        }
    }

    /// The current model. Later merges do not affect a snapshot already taken.
    pub fn snapshot(&self) -> Arc<ConfigModel> {
        self.model.load_full()
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        self.model.load().get_value(section, key).map(str::to_string)
    }

    pub fn settings(&self) -> SyncSettings {
        SyncSettings::from_model(&self.model.load())
    }

    /// Fold an overlay into the effective view.
    pub fn merge_overlay(&self, overlay: ConfigModel) {
        let current = ConfigModel::clone(&self.model.load());
        let merged = merge(current, overlay, &self.classifier);
        self.model.store(Arc::new(merged));
    }

    /// Parse the overlay file at `path` and merge it. A missing file is not an error.
    pub fn apply_overlay_file(&self, path: &Path) -> Result<(), LoadError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No overlay file to apply");
                return Ok(());
            }
            Err(source) => {
                return Err(LoadError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let mut overlay = ConfigModel::new();
        Parser::overlay().parse_str(&mut overlay, &path.to_string_lossy(), &text)?;
        debug!(path = %path.display(), entries = overlay.len(), "Applying overlay file");
        self.merge_overlay(overlay);
        Ok(())
    }
}
