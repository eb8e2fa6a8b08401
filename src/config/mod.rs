//! Layered configuration.
//!
//! Sources are loaded in tier order:
//! 1. **System** - `/etc/mercurial/hgrc` and `/etc/mercurial/hgrc.d/*.rc`
//! 2. **Project overlay** - `<repo>/.hg/projrc`, fetched from a central repository
//! 3. **User** - `~/.hgrc`
//! 4. **Local repository** - `<repo>/.hg/hgrc`
//!
//! ## Merge Strategy
//! - Local files: later files overwrite earlier keys
//! - Overlay: only fills keys no other tier has set
//!
//! ## Environment Variables
//! - `HGRCPATH` - Config files or directories loaded instead of the system and user files

mod effective;
mod loader;
mod merge;
pub mod model;
pub mod parser;
mod serialize;
mod settings;
pub mod tier;

pub use effective::EffectiveConfig;
pub use loader::{
    find_repo, overlay_path, repo_config_path, ConfigLoader, LoadPaths, REPO_CONFIG_FILE,
    SEARCH_PATH_ENV,
};
pub use merge::{merge, sort_by_tier};
pub use model::{ConfigEntry, ConfigModel, Section, SourceTag};
pub use parser::{parse_overlay, Parser};
pub use serialize::{serialize, serialize_filtered};
pub use settings::{
    expand_path_alias, parse_bool, parse_list, ConfirmPolicy, IncomingMode, SyncSettings,
};
pub use tier::{classify, Classifier, RcPaths, Tier, OVERLAY_FILE, VCS_DIR};
