//! Client-side synchronization settings, read from the `[projrc]` section.
//!
//! ```text
//! [projrc]
//! servers = default, //central/repo
//! include = ui, extensions.rebase
//! exclude = ui.username
//! confirm = first
//! updateonincoming = auto
//! ```

use super::model::ConfigModel;
use crate::filter::{KeyFilter, SELF_SECTION};
use tracing::warn;

/// Whether accepting a changed overlay needs the user's confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmPolicy {
    #[default]
    Always,
    /// Only ask when no overlay has been stored before.
    FirstTimeOnly,
    Never,
}

impl ConfirmPolicy {
    /// Parse a `confirm` value; missing or unrecognised values mean [`Always`](Self::Always).
    pub fn parse(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return Self::Always;
        };
        match parse_bool(value) {
            Some(true) => Self::Always,
            Some(false) => Self::Never,
            None if value.trim().eq_ignore_ascii_case("first") => Self::FirstTimeOnly,
            None => Self::Always,
        }
    }

    pub fn requires_prompt(self, store_exists: bool) -> bool {
        match self {
            Self::Always => true,
            Self::FirstTimeOnly => !store_exists,
            Self::Never => false,
        }
    }
}

/// What the incoming/preview operation does with a remote overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IncomingMode {
    /// Only report whether the remote overlay differs.
    #[default]
    Report,
    /// Update, always asking first.
    Prompt,
    /// Update, asking according to [`ConfirmPolicy`].
    Auto,
}

impl IncomingMode {
    pub fn parse(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return Self::Report;
        };
        let value = value.trim();
        // Setting the key at all signals that the user wants updates.
        if value.is_empty() {
            return Self::Prompt;
        }
        if parse_bool(value) == Some(false) {
            return Self::Report;
        }
        match value.to_lowercase().as_str() {
            "prompt" => Self::Prompt,
            "auto" => Self::Auto,
            other => {
                warn!(
                    value = other,
                    "Invalid projrc.updateonincoming value, using default (false)"
                );
                Self::Report
            }
        }
    }
}

/// Everything the synchronization flow reads from the client configuration.
#[derive(Debug, Clone, Default)]
pub struct SyncSettings {
    /// Allow-listed peers, with `[paths]` aliases and `~` already expanded.
    pub servers: Vec<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub confirm: ConfirmPolicy,
    pub update_on_incoming: IncomingMode,
}

impl SyncSettings {
    pub fn from_model(model: &ConfigModel) -> Self {
        let list = |key: &str| {
            model
                .get_value(SELF_SECTION, key)
                .map(parse_list)
                .unwrap_or_default()
        };

        let servers = list("servers")
            .into_iter()
            .map(|s| expand_path_alias(model, &s))
            .collect();

        Self {
            servers,
            include: list("include"),
            exclude: list("exclude"),
            confirm: ConfirmPolicy::parse(model.get_value(SELF_SECTION, "confirm")),
            update_on_incoming: IncomingMode::parse(
                model.get_value(SELF_SECTION, "updateonincoming"),
            ),
        }
    }

    pub fn key_filter(&self) -> KeyFilter {
        KeyFilter::from_lists(&self.include, &self.exclude)
    }
}

/// Resolve a `[paths]` alias, then expand a leading `~`.
pub fn expand_path_alias(model: &ConfigModel, location: &str) -> String {
    let resolved = model.get_value("paths", location).unwrap_or(location);
    match resolved.strip_prefix("~/") {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest).to_string_lossy().into_owned(),
            None => resolved.to_string(),
        },
        None => resolved.to_string(),
    }
}

/// Interpret a boolean-like config value.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "yes" | "true" | "on" | "always" => Some(true),
        "0" | "no" | "false" | "off" | "never" => Some(false),
        _ => None,
    }
}

/// Split a list value on commas and whitespace.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
