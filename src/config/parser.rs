//! Parser for the `[section]` / `key = value` config format.
//!
//! Grammar, line by line:
//! - `[name]` opens (or reopens) a section
//! - `key = value` sets a key in the current section
//! - lines starting with whitespace continue the previous value, joined by `\n`
//! - lines starting with `#` or `;`, and blank lines, are ignored
//! - `%unset key` removes `key` from the current section
//! - `%include path` reads another file (local files only)

use super::model::{ConfigModel, SourceTag};
use crate::error::{LoadError, ParseError};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Parser state shared across `%include` boundaries.
#[derive(Debug, Default)]
pub struct Parser {
    allow_include: bool,
    /// Files currently being read, used to break include cycles.
    reading: Vec<PathBuf>,
}

impl Parser {
    /// Parser for text that came from somewhere else; `%include` is an error.
    pub fn overlay() -> Self {
        Self {
            allow_include: false,
            reading: Vec::new(),
        }
    }

    /// Parser for files on the local disk; `%include` is followed.
    pub fn local() -> Self {
        Self {
            allow_include: true,
            reading: Vec::new(),
        }
    }

    /// Parse `text` into `model`. `origin` names the text in source tags.
    pub fn parse_str(
        &mut self,
        model: &mut ConfigModel,
        origin: &str,
        text: &str,
    ) -> Result<(), LoadError> {
        let mut section: Option<String> = None;
        // Key whose value continuation lines extend.
        let mut cont: Option<String> = None;

        for (index, raw) in text.lines().enumerate() {
            let lineno = index + 1;
            let line = if lineno == 1 {
                raw.strip_prefix('\u{feff}').unwrap_or(raw)
            } else {
                raw
            };
            let location = || format!("{}:{}", origin, lineno);

            if let (Some(key), Some(name)) = (&cont, &section) {
                if is_comment(line) {
                    continue;
                }
                if line.starts_with(char::is_whitespace) && !line.trim().is_empty() {
                    let previous = model.get_value(name, key).unwrap_or_default();
                    let value = format!("{}\n{}", previous, line.trim());
                    model.set(name, key.clone(), value, SourceTag::at_line(origin, lineno));
                    continue;
                }
            }
            cont = None;

            if let Some(target) = directive(line, "%include") {
                if !self.allow_include {
                    return Err(ParseError::new(line.trim_end(), location()).into());
                }
                self.include(model, origin, target)?;
                continue;
            }

            if line.trim().is_empty() || is_comment(line) {
                continue;
            }

            if let Some(name) = section_header(line) {
                model.ensure_section(name);
                section = Some(name.to_string());
                continue;
            }

            if let Some((key, value)) = item(line) {
                let Some(name) = &section else {
                    return Err(ParseError::new(line.trim_end(), location()).into());
                };
                model.set(name, key, value, SourceTag::at_line(origin, lineno));
                cont = Some(key.to_string());
                continue;
            }

            if let Some(key) = directive(line, "%unset") {
                if key.split_whitespace().count() == 1 {
                    if let Some(name) = &section {
                        model.unset(name, key);
                    }
                    continue;
                }
            }

            return Err(ParseError::new(line.trim_end(), location()).into());
        }

        Ok(())
    }

    /// Read and parse a file into `model`.
    pub fn read_file(&mut self, model: &mut ConfigModel, path: &Path) -> Result<(), LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        self.reading.push(path.to_path_buf());
        let result = self.parse_str(model, &path.to_string_lossy(), &text);
        self.reading.pop();
        result
    }

    fn include(&mut self, model: &mut ConfigModel, origin: &str, target: &str) -> Result<(), LoadError> {
        let target = expand_home(target);
        let base = Path::new(origin).parent().unwrap_or_else(|| Path::new(""));
        let path = base.join(target);

        if self.reading.iter().any(|p| p == &path) {
            warn!(path = %path.display(), "Ignoring recursive %include");
            return Ok(());
        }

        match self.read_file(model, &path) {
            Err(LoadError::Read { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Skipping missing %include");
                Ok(())
            }
            other => other,
        }
    }
}

/// Parse overlay text that did not come from the local disk.
pub fn parse_overlay(origin: &str, text: &str) -> Result<ConfigModel, ParseError> {
    let mut model = ConfigModel::new();
    match Parser::overlay().parse_str(&mut model, origin, text) {
        Ok(()) => Ok(model),
        Err(LoadError::Parse(e)) => Err(e),
        // Reading is impossible without includes.
        Err(LoadError::Read { path, source }) => Err(ParseError::new(
            source.to_string(),
            path.to_string_lossy().into_owned(),
        )),
    }
}

fn is_comment(line: &str) -> bool {
    line.starts_with('#') || line.starts_with(';')
}

/// `[name]`, where `name` is non-empty and contains no `[`.
fn section_header(line: &str) -> Option<&str> {
    let rest = line.strip_prefix('[')?;
    let end = rest.find(']')?;
    let name = &rest[..end];
    (!name.is_empty() && !name.contains('[')).then_some(name)
}

/// `key = value`; the key may not start with `=` or whitespace.
fn item(line: &str) -> Option<(&str, &str)> {
    let first = line.chars().next()?;
    if first == '=' || first.is_whitespace() || first == '%' {
        return None;
    }
    let (key, value) = line.split_once('=')?;
    Some((key.trim_end(), value.trim()))
}

/// Argument of `%name arg`, trimmed.
fn directive<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(name)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let arg = rest.trim();
    (!arg.is_empty()).then_some(arg)
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
