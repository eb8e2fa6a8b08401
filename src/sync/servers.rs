//! Allow-list of peers an overlay may be fetched from (`projrc.servers`).
//!
//! Entries are compared after normalization: file paths have `.` and `..`
//! collapsed and use forward slashes, URLs are lower-cased. Two entries are
//! special:
//! - `*` allows every peer
//! - `localhost` allows local file paths and URLs served from the loopback host

use crate::filter::PatternSet;
use std::path::{Component, Path, PathBuf};

pub const ALLOW_ALL: &str = "*";
pub const LOCALHOST: &str = "localhost";

const LOOPBACK_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

#[derive(Debug, Clone, Default)]
pub struct AllowList {
    allow_all: bool,
    allow_local: bool,
    patterns: PatternSet,
}

impl AllowList {
    /// Build from server entries whose `[paths]` aliases are already expanded.
    pub fn new<I, S>(servers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::default();
        for server in servers {
            let server = normalize_location(server.as_ref().trim());
            match server.as_str() {
                "" => continue,
                ALLOW_ALL => list.allow_all = true,
                LOCALHOST => list.allow_local = true,
                _ => {}
            }
            list.patterns.push(&server);
        }
        list
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn is_allowed(&self, location: &str) -> bool {
        if self.allow_all {
            return true;
        }
        let raw = location.strip_prefix("file:").unwrap_or(location);
        self.patterns.find_match(&normalize_location(raw)).matched
            || (self.allow_local && is_local_path(raw))
    }
}

/// Whether `location` is a file path rather than a URL.
pub fn is_file_path(location: &str) -> bool {
    let bytes = location.as_bytes();
    bytes.get(1) == Some(&b':') || matches!(bytes.first(), Some(b'/' | b'\\'))
}

/// Whether `location` is on this machine: a non-UNC file path, or a URL
/// whose host is the loopback host.
pub fn is_local_path(location: &str) -> bool {
    if is_file_path(location) {
        return !matches!(location.as_bytes().get(1), Some(b'/' | b'\\'));
    }
    match location.split_once("//") {
        Some((_, rest)) => {
            let host = rest.split('/').next().unwrap_or_default();
            LOOPBACK_HOSTS.contains(&host)
        }
        None => false,
    }
}

/// Canonical form of a peer location for comparisons.
pub fn normalize_location(location: &str) -> String {
    let location = location.strip_prefix("file:").unwrap_or(location);
    if !is_file_path(location) {
        return location.to_lowercase();
    }
    let normalized = path_to_forward_slashes(&normalize_path_components(Path::new(location)));
    if cfg!(windows) {
        normalized.to_lowercase()
    } else {
        normalized
    }
}

/// Collapse `.` and `..` components without touching the filesystem.
fn normalize_path_components(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                } else {
                    components.push(Component::ParentDir);
                }
            }
            other => components.push(other),
        }
    }

    components.iter().collect()
}

fn path_to_forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all() {
        let list = AllowList::new(["*"]);
        assert!(list.is_allowed("ssh://anywhere/repo"));
        assert!(list.is_allowed("/srv/repo"));
    }

    #[test]
    fn test_empty_list_allows_nothing() {
        let list = AllowList::new(Vec::<String>::new());
        assert!(list.is_empty());
        assert!(!list.is_allowed("/srv/repo"));
    }

    #[test]
    fn test_exact_and_glob_entries() {
        let list = AllowList::new(["/srv/central", "http://HG.example.com/*"]);
        assert!(list.is_allowed("/srv/central"));
        assert!(list.is_allowed("/srv/./other/../central"));
        assert!(!list.is_allowed("/srv/elsewhere"));
        assert!(list.is_allowed("http://hg.example.com/project"));
        assert!(!list.is_allowed("http://hg.example.org/project"));
    }

    #[test]
    fn test_file_prefix_is_ignored() {
        let list = AllowList::new(["/srv/central"]);
        assert!(list.is_allowed("file:/srv/central"));
    }

    #[test]
    fn test_localhost_entry() {
        let list = AllowList::new(["localhost"]);
        assert!(list.is_allowed("/home/alice/repo"));
        assert!(list.is_allowed("http://localhost/repo"));
        assert!(list.is_allowed("https://127.0.0.1/repo"));
        assert!(!list.is_allowed("http://example.com/repo"));
        assert!(!list.is_allowed("//fileserver/share/repo"));
    }

    #[test]
    fn test_is_file_path() {
        assert!(is_file_path("/srv/repo"));
        assert!(is_file_path("C:\\work\\repo"));
        assert!(is_file_path("\\\\server\\share"));
        assert!(!is_file_path("ssh://host/repo"));
        assert!(!is_file_path(""));
    }

    #[test]
    fn test_normalize_location() {
        assert_eq!(normalize_location("HTTP://Example.COM/Repo"), "http://example.com/repo");
        assert_eq!(normalize_location("/srv/a/./b/../c"), "/srv/a/c");
    }
}
