//! Include/exclude filtering of overlay keys.
//!
//! When a key matches both lists, the more explicit match wins:
//! 1. an exact `section.key` pattern beats any glob
//! 2. between two exact or two glob matches, the longer pattern wins,
//!    ties going to inclusion
//! 3. a `section.*` entry beats the global `*` / `*.*`
//! 4. `*` alone allows everything that is not excluded; an empty include
//!    list counts as `*`
//!
//! The filter never lets through keys of this crate's own `[projrc]`
//! section: an overlay must not be able to reconfigure which overlays are
//! accepted.

pub mod pattern;

pub use pattern::{MatchResult, PatternSet};

/// Section holding this crate's own settings.
pub const SELF_SECTION: &str = "projrc";

/// Decide whether `section.key` is included by `include` / `exclude`.
///
/// This is the bare resolution rule; [`KeyFilter`] adds the defaults and the
/// self-section guard on top of it.
pub fn resolve(section: &str, key: &str, include: &PatternSet, exclude: &PatternSet) -> bool {
    let section = section.to_lowercase();
    let full_key = format!("{}.{}", section, key.to_lowercase());
    let section_wildcard = format!("{}.*", section);

    let include_all = include.contains("*") || include.contains("*.*");
    let include_section = include.contains(&section_wildcard);
    let exclude_section = exclude.contains(&section_wildcard);

    let inc = include.find_match(&full_key);
    let exc = exclude.find_match(&full_key);
    let (mut included, mut excluded) = (inc.matched, exc.matched);

    if included && excluded {
        included = if inc.exact == exc.exact {
            let inc_len = inc.pattern.map_or(0, str::len);
            let exc_len = exc.pattern.map_or(0, str::len);
            inc_len >= exc_len
        } else {
            inc.exact
        };
        excluded = !included;
    }

    included || (!excluded && (include_section || (!exclude_section && include_all)))
}

/// The client's key filter, built from its own `include` / `exclude` lists.
#[derive(Debug, Clone)]
pub struct KeyFilter {
    include: PatternSet,
    exclude: PatternSet,
}

impl KeyFilter {
    pub fn new(include: PatternSet, mut exclude: PatternSet) -> Self {
        exclude.push(&format!("{}.*", SELF_SECTION));

        // The exclude list is never empty, so a missing include list means
        // "everything not excluded".
        let include = if include.is_empty() {
            PatternSet::new(["*"])
        } else {
            include
        };

        Self { include, exclude }
    }

    /// Build from configured key lists, see [`PatternSet::from_config_list`].
    pub fn from_lists<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Self {
        Self::new(
            PatternSet::from_config_list(include),
            PatternSet::from_config_list(exclude),
        )
    }

    pub fn include(&self) -> &PatternSet {
        &self.include
    }

    pub fn exclude(&self) -> &PatternSet {
        &self.exclude
    }

    pub fn should_include(&self, section: &str, key: &str) -> bool {
        if section.eq_ignore_ascii_case(SELF_SECTION) {
            return false;
        }
        resolve(section, key, &self.include, &self.exclude)
    }
}
