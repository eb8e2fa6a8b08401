//! Ordered, provenance-tracking configuration model.
//!
//! A [`ConfigModel`] is an ordered list of sections, each an ordered list of
//! entries. Keys are case-preserving but looked up case-insensitively. Setting
//! an existing key moves it to the end of its section, so the order of a
//! section always reflects the order in which values were last written.
//!
//! Values are stored in the form the parser produces: every line trimmed and
//! no blank line after the first. Serializing and parsing a model back
//! therefore yields the same values.

use std::fmt;

/// Where a config value came from, usually `path:line`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceTag(String);

impl SourceTag {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    /// Tag for line `line` of the file or blob named `origin`.
    pub fn at_line(origin: &str, line: usize) -> Self {
        Self(format!("{}:{}", origin, line))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The origin with any trailing `:<line>` suffix removed.
    pub fn origin(&self) -> &str {
        strip_line_suffix(&self.0)
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip a trailing `:<digits>` suffix.
///
/// Only an all-digit suffix is removed so that `C:\hgrc` keeps its drive.
pub fn strip_line_suffix(source: &str) -> &str {
    match source.rsplit_once(':') {
        Some((origin, line)) if !line.is_empty() && line.bytes().all(|b| b.is_ascii_digit()) => {
            origin
        }
        _ => source,
    }
}

/// A single `key = value` setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub key: String,
    /// May contain embedded newlines.
    pub value: String,
    pub source: SourceTag,
}

/// An ordered mapping of keys to entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    entries: Vec<ConfigEntry>,
}

impl Section {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[ConfigEntry] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut Vec<ConfigEntry> {
        &mut self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.key.eq_ignore_ascii_case(key))
    }

    pub fn get(&self, key: &str) -> Option<&ConfigEntry> {
        self.position(key).map(|i| &self.entries[i])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Insert or replace `key`, moving it to the end of the section.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>, source: SourceTag) {
        let key = key.into();
        if let Some(i) = self.position(&key) {
            self.entries.remove(i);
        }
        self.entries.push(ConfigEntry {
            key,
            value: canonical_value(&value.into()),
            source,
        });
    }

    pub fn remove(&mut self, key: &str) -> Option<ConfigEntry> {
        self.position(key).map(|i| self.entries.remove(i))
    }
}

/// Ordered collection of sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigModel {
    sections: Vec<Section>,
}

impl ConfigModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub(crate) fn sections_mut(&mut self) -> &mut [Section] {
        &mut self.sections
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Get a section, appending an empty one if it does not exist yet.
    pub fn ensure_section(&mut self, name: &str) -> &mut Section {
        let index = match self.sections.iter().position(|s| s.name == name) {
            Some(i) => i,
            None => {
                self.sections.push(Section::new(name));
                self.sections.len() - 1
            }
        };
        &mut self.sections[index]
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&ConfigEntry> {
        self.section(section).and_then(|s| s.get(key))
    }

    pub fn get_value(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key).map(|e| e.value.as_str())
    }

    pub fn set(
        &mut self,
        section: &str,
        key: impl Into<String>,
        value: impl Into<String>,
        source: SourceTag,
    ) {
        self.ensure_section(section).set(key, value, source);
    }

    /// Remove `key` from `section`; the section itself is kept.
    pub fn unset(&mut self, section: &str, key: &str) -> Option<ConfigEntry> {
        self.sections
            .iter_mut()
            .find(|s| s.name == section)
            .and_then(|s| s.remove(key))
    }

    /// Number of entries across all sections.
    pub fn len(&self) -> usize {
        self.sections.iter().map(Section::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate `(section, entry)` pairs in model order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigEntry)> {
        self.sections
            .iter()
            .flat_map(|s| s.entries.iter().map(move |e| (s.name.as_str(), e)))
    }

    /// Consume the model, yielding `(section, entry)` pairs in model order.
    pub fn into_entries(self) -> impl Iterator<Item = (String, ConfigEntry)> {
        self.sections.into_iter().flat_map(|s| {
            let name = s.name;
            s.entries.into_iter().map(move |e| (name.clone(), e))
        })
    }

    /// The flat `(section, key) -> value` view, ignoring sources and order.
    pub fn flat_values(&self) -> std::collections::BTreeMap<(String, String), String> {
        self.iter()
            .map(|(section, e)| {
                (
                    (section.to_string(), e.key.to_lowercase()),
                    e.value.clone(),
                )
            })
            .collect()
    }
}

/// Trim every line of `value` and drop blank lines after the first.
pub fn canonical_value(value: &str) -> String {
    let mut lines = value.lines().map(str::trim);
    let mut out = lines.next().unwrap_or_default().to_string();
    for line in lines.filter(|l| !l.is_empty()) {
        out.push('\n');
        out.push_str(line);
    }
    out
}
