//! The client's stored copy of the overlay, `<repo>/.hg/projrc`.

use crate::config::overlay_path;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct OverlayStore {
    path: PathBuf,
}

impl OverlayStore {
    /// The store of the repository rooted at `repo_root`.
    pub fn for_repo(repo_root: &Path) -> Self {
        Self::at(overlay_path(repo_root))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Stored text, or an empty string when nothing is stored.
    pub fn read(&self) -> io::Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e),
        }
    }

    /// Write atomically (write-then-rename).
    pub fn write(&self, text: &str) -> io::Result<()> {
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, text)?;
        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
        Ok(())
    }

    /// Delete the stored overlay. Returns whether there was one.
    pub fn remove(&self) -> io::Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}
