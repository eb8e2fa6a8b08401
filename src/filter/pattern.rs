//! Case-insensitive glob matching over `section.key` strings.
//!
//! Globs follow shell conventions: `*` matches any run of characters, `?` a
//! single character, `[seq]` / `[!seq]` a character class. They are compiled
//! to anchored `regex-lite` expressions.

use regex_lite::Regex;
use tracing::warn;

/// Outcome of matching one string against a [`PatternSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult<'a> {
    pub matched: bool,
    /// The pattern equals the searched text.
    pub exact: bool,
    /// The first pattern that matched.
    pub pattern: Option<&'a str>,
}

impl MatchResult<'_> {
    const NONE: MatchResult<'static> = MatchResult {
        matched: false,
        exact: false,
        pattern: None,
    };
}

#[derive(Debug, Clone)]
struct Pattern {
    text: String,
    regex: Option<Regex>,
}

impl Pattern {
    fn new(text: String) -> Self {
        let regex = match Regex::new(&translate(&text)) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(pattern = %text, error = %e, "Pattern can only match exactly");
                None
            }
        };
        Self { text, regex }
    }

    fn is_glob_match(&self, text: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(text))
    }
}

/// Lower-cased patterns in insertion order, without duplicates.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for pattern in patterns {
            set.push(pattern.as_ref());
        }
        set
    }

    /// Build from a configured key list.
    ///
    /// Entries are trimmed and lower-cased; a bare section name `ui` stands
    /// for the whole section, `ui.*`.
    pub fn from_config_list<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for entry in entries {
            let entry = entry.as_ref().trim();
            if entry.is_empty() {
                continue;
            }
            if entry.contains('.') || entry == "*" {
                set.push(entry);
            } else {
                set.push(&format!("{}.*", entry));
            }
        }
        set
    }

    /// Append a pattern unless an equal one is already present.
    pub fn push(&mut self, pattern: &str) {
        let text = pattern.to_lowercase();
        if !self.patterns.iter().any(|p| p.text == text) {
            self.patterns.push(Pattern::new(text));
        }
    }

    pub fn contains(&self, pattern: &str) -> bool {
        let pattern = pattern.to_lowercase();
        self.patterns.iter().any(|p| p.text == pattern)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.text.as_str())
    }

    /// Match `text`, preferring exact matches over globs.
    ///
    /// All patterns are checked for an exact match before any glob is tried,
    /// so an exact pattern wins wherever it sits in the list.
    pub fn find_match(&self, text: &str) -> MatchResult<'_> {
        let text = text.to_lowercase();

        if let Some(p) = self.patterns.iter().find(|p| p.text == text) {
            return MatchResult {
                matched: true,
                exact: true,
                pattern: Some(&p.text),
            };
        }

        match self.patterns.iter().find(|p| p.is_glob_match(&text)) {
            Some(p) => MatchResult {
                matched: true,
                exact: false,
                pattern: Some(&p.text),
            },
            None => MatchResult::NONE,
        }
    }
}

/// Translate a shell glob into an anchored regular expression.
pub fn translate(glob: &str) -> String {
    let chars: Vec<char> = glob.chars().collect();
    let mut out = String::from("(?s)^");
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        i += 1;
        match c {
            '*' => {
                while i < chars.len() && chars[i] == '*' {
                    i += 1;
                }
                out.push_str(".*");
            }
            '?' => out.push('.'),
            '[' => {
                let mut j = i;
                if j < chars.len() && chars[j] == '!' {
                    j += 1;
                }
                if j < chars.len() && chars[j] == ']' {
                    j += 1;
                }
                while j < chars.len() && chars[j] != ']' {
                    j += 1;
                }
                if j >= chars.len() {
                    out.push_str("\\[");
                    continue;
                }
                out.push('[');
                let mut class = &chars[i..j];
                if class.first() == Some(&'!') {
                    out.push('^');
                    class = &class[1..];
                }
                for (k, &ch) in class.iter().enumerate() {
                    let needs_escape = matches!(ch, '\\' | '[' | ']' | '&' | '~' | '|')
                        || (ch == '^' && k == 0);
                    if needs_escape {
                        out.push('\\');
                    }
                    out.push(ch);
                }
                out.push(']');
                i = j + 1;
            }
            _ => out.push_str(&regex_lite::escape(&c.to_string())),
        }
    }

    out.push('$');
    out
}
