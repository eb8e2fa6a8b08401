//! Peers the overlay is fetched from.

use super::publish::Publisher;
use super::NAMESPACE;
use crate::config::VCS_DIR;
use crate::error::TransportError;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// A repository that can list the keys of a namespace.
pub trait OverlayPeer {
    /// Location as configured or typed by the user, used for allow-listing.
    fn location(&self) -> String;

    fn list_keys(&self, namespace: &str) -> Result<BTreeMap<String, String>, TransportError>;
}

/// Another repository on the local disk.
#[derive(Debug, Clone)]
pub struct LocalPeer {
    root: PathBuf,
}

impl LocalPeer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root: PathBuf = root.into();
        // `file:` URLs name plain paths.
        let root = match root.to_str().and_then(|s| s.strip_prefix("file:")) {
            Some(stripped) => PathBuf::from(stripped),
            None => root,
        };
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl OverlayPeer for LocalPeer {
    fn location(&self) -> String {
        std::path::absolute(&self.root)
            .unwrap_or_else(|_| self.root.clone())
            .to_string_lossy()
            .into_owned()
    }

    fn list_keys(&self, namespace: &str) -> Result<BTreeMap<String, String>, TransportError> {
        match std::fs::metadata(self.root.join(VCS_DIR)) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(TransportError::NotFound {
                    location: self.location(),
                });
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(TransportError::NotFound {
                    location: self.location(),
                });
            }
            Err(source) => {
                return Err(TransportError::Unreachable {
                    location: self.location(),
                    source,
                });
            }
        }

        if namespace != NAMESPACE {
            return Ok(BTreeMap::new());
        }
        Ok(Publisher::for_repo(&self.root).list_keys())
    }
}
