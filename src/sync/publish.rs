//! Server side: publishing the local overlay to peers that ask for it.

use super::codec::{escape, ENCODING_CHECK};
use super::store::OverlayStore;
use super::{DATA_KEY, ERROR_KEY};
use crate::config::{parse_overlay, serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Answers key listing requests for the overlay namespace.
#[derive(Debug, Clone)]
pub struct Publisher {
    store: OverlayStore,
}

impl Publisher {
    pub fn new(store: OverlayStore) -> Self {
        Self { store }
    }

    pub fn for_repo(repo_root: &Path) -> Self {
        Self::new(OverlayStore::for_repo(repo_root))
    }

    /// The published mapping.
    ///
    /// Empty when no overlay is stored. A stored overlay that does not parse
    /// is published verbatim, together with the parse diagnostic under
    /// [`ERROR_KEY`], so the client rejects it with the same message.
    pub fn list_keys(&self) -> BTreeMap<String, String> {
        let mut keys = BTreeMap::new();
        if !self.store.exists() {
            return keys;
        }

        let text = match self.store.read() {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %self.store.path().display(), error = %e, "Cannot read projrc file");
                return keys;
            }
        };

        let origin = self.store.path().to_string_lossy();
        let data = match parse_overlay(&origin, &text) {
            Ok(model) => format!("{}{}", ENCODING_CHECK, serialize(&model)),
            Err(e) => {
                warn!(error = %e, "Publishing unparsable projrc file as is");
                keys.insert(ERROR_KEY.to_string(), e.to_string());
                text
            }
        };

        keys.insert(DATA_KEY.to_string(), escape(&data));
        keys
    }

    /// Peers cannot push an overlay; the request is always refused.
    pub fn push(&self, key: &str, _old: &str, _new: &str) -> bool {
        debug!(key, "Refusing projrc push");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::codec::decode_payload;
    use tempfile::TempDir;

    fn publisher(temp: &TempDir) -> Publisher {
        std::fs::create_dir_all(temp.path().join(".hg")).unwrap();
        Publisher::for_repo(temp.path())
    }

    #[test]
    fn test_nothing_stored_publishes_nothing() {
        let temp = TempDir::new().unwrap();
        assert!(publisher(&temp).list_keys().is_empty());
    }

    #[test]
    fn test_publishes_canonical_text() {
        let temp = TempDir::new().unwrap();
        let publisher = publisher(&temp);
        std::fs::write(
            temp.path().join(".hg").join("projrc"),
            "# shared settings\n[ui]\nmerge=internal:merge\n[hooks]\nprecommit = check\n  --strict\n",
        )
        .unwrap();

        let keys = publisher.list_keys();
        assert!(!keys.contains_key(ERROR_KEY));
        let data = decode_payload(&keys[DATA_KEY]).unwrap();
        assert_eq!(
            data,
            format!(
                "{}[ui]\nmerge = internal:merge\n\n[hooks]\nprecommit = check\n  --strict\n\n",
                ENCODING_CHECK
            )
        );
    }

    #[test]
    fn test_broken_file_published_verbatim_with_error() {
        let temp = TempDir::new().unwrap();
        let publisher = publisher(&temp);
        std::fs::write(temp.path().join(".hg").join("projrc"), "[ui]\nnot a setting\n").unwrap();

        let keys = publisher.list_keys();
        assert_eq!(decode_payload(&keys[DATA_KEY]).unwrap(), "[ui]\nnot a setting\n");
        assert!(keys[ERROR_KEY].contains("not a setting"));
    }

    #[test]
    fn test_push_is_refused() {
        let temp = TempDir::new().unwrap();
        assert!(!publisher(&temp).push("data", "", "[ui]\n"));
    }
}
