//! Deciding whether a fetched overlay replaces the stored one.
//!
//! ```text
//! IDLE -> FETCHING -> DECODING -> VALIDATING -> FILTERING -> DIFFING
//!      -> CONFIRMING | AUTO_ACCEPT -> PERSISTING -> APPLIED
//! ```
//!
//! When the filter leaves no key, the store is deleted instead of written.
//! Any failure after fetching leads to REJECTED and leaves the store as it
//! was. Runs that end without touching the store (not allow-listed, nothing
//! published, unchanged, declined) return to IDLE.

use super::codec::{decode_payload, ENCODING_CHECK};
use super::peer::OverlayPeer;
use super::prompt::Prompt;
use super::servers::AllowList;
use super::store::OverlayStore;
use super::{DATA_KEY, NAMESPACE};
use crate::config::{
    parse_overlay, serialize_filtered, ConfigModel, EffectiveConfig, IncomingMode, SyncSettings,
};
use crate::error::{ErrorCode, SyncError, SyncResult};
use crate::filter::KeyFilter;
use serde::Serialize;
use tracing::{debug, info, warn};

pub const CONFIRM_MESSAGE: &str =
    "The project settings file (projrc) has changed.\nDo you want to update it? (y/n)";

/// Origin used in diagnostics about fetched text.
const REMOTE_ORIGIN: &str = "projrc";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncState {
    Idle,
    Fetching,
    Decoding,
    Validating,
    Filtering,
    Diffing,
    Confirming,
    AutoAccept,
    Persisting,
    Applied,
    Rejected,
}

impl SyncState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncState::Applied | SyncState::Rejected)
    }

    pub fn can_transition_to(&self, target: SyncState) -> bool {
        use SyncState::*;
        match (self, target) {
            (Idle, Fetching) => true,
            (Fetching, Decoding) => true,
            (Decoding, Validating) => true,
            (Validating, Filtering) => true,
            (Filtering, Diffing) => true,
            (Diffing, Confirming | AutoAccept) => true,
            (Confirming | AutoAccept, Persisting) => true,
            (Persisting, Applied) => true,

            (Idle, Rejected) => false,
            (from, Rejected) => !from.is_terminal(),
            (Idle, Idle) => false,
            (from, Idle) => !from.is_terminal(),

            _ => false,
        }
    }
}

/// How an active synchronization ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The peer is not in `projrc.servers`; the store was not touched.
    NotAllowListed,
    /// The peer publishes no overlay.
    NoRemoteData,
    /// The payload could not be decoded or parsed, or the store could not be read.
    Rejected { code: ErrorCode, message: String },
    Unchanged,
    Declined,
    /// A new overlay was stored and merged into the effective configuration.
    Applied,
    /// The stored overlay was deleted because the filter accepted no key.
    Removed,
}

/// Result of the passive, report-only flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IncomingReport {
    NewRemoteFile,
    Differs,
    NoChanges,
    /// Nothing usable was fetched: not allow-listed, absent or rejected.
    Unavailable,
}

/// What `incoming` did, depending on `projrc.updateonincoming`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingOutcome {
    Reported(IncomingReport),
    Synced(SyncOutcome),
}

/// Fetched overlay, filtered and ready to compare.
enum Fetched {
    NotAllowListed,
    Absent,
    Rejected { code: ErrorCode, message: String },
    /// Text to store; empty means the store should not exist.
    Text(String),
}

/// Runs the synchronization flow for one repository.
pub struct Synchronizer<'a, P: Prompt> {
    config: &'a EffectiveConfig,
    store: OverlayStore,
    prompt: P,
    state: SyncState,
}

impl<'a, P: Prompt> Synchronizer<'a, P> {
    pub fn new(config: &'a EffectiveConfig, store: OverlayStore, prompt: P) -> Self {
        Self {
            config,
            store,
            prompt,
            state: SyncState::Idle,
        }
    }

    /// State the last run ended in.
    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    pub fn store(&self) -> &OverlayStore {
        &self.store
    }

    /// Fetch the peer's overlay and store it if it changed and is accepted.
    ///
    /// `confirm` forces (`Some(true)`) or skips (`Some(false)`) the prompt;
    /// `None` follows `projrc.confirm`. Only transport and store write
    /// failures are returned as errors.
    pub fn sync(&mut self, peer: &dyn OverlayPeer, confirm: Option<bool>) -> SyncResult<SyncOutcome> {
        let settings = self.config.settings();

        let text = match self.fetch(peer, &settings)? {
            Fetched::NotAllowListed => return Ok(self.finish(SyncOutcome::NotAllowListed)),
            Fetched::Absent => return Ok(self.finish(SyncOutcome::NoRemoteData)),
            Fetched::Rejected { code, message } => return Ok(SyncOutcome::Rejected { code, message }),
            Fetched::Text(text) => text,
        };

        self.enter(SyncState::Diffing);
        let old = match self.store.read() {
            Ok(old) => old,
            Err(e) => {
                let message = e.to_string();
                self.reject(ErrorCode::IoFailure, &message);
                return Ok(SyncOutcome::Rejected {
                    code: ErrorCode::IoFailure,
                    message,
                });
            }
        };
        if old == text {
            debug!("no changes found to projrc file");
            return Ok(self.finish(SyncOutcome::Unchanged));
        }

        let must_confirm = confirm.unwrap_or_else(|| settings.confirm.requires_prompt(!old.is_empty()));
        if must_confirm {
            self.enter(SyncState::Confirming);
            if !self.prompt.confirm(CONFIRM_MESSAGE) {
                info!("projrc update declined");
                return Ok(self.finish(SyncOutcome::Declined));
            }
        } else {
            self.enter(SyncState::AutoAccept);
        }

        self.enter(SyncState::Persisting);
        if text.is_empty() {
            return self.remove();
        }
        if let Err(source) = self.store.write(&text) {
            self.enter(SyncState::Rejected);
            return Err(SyncError::Store {
                path: self.store.path().to_path_buf(),
                source,
            });
        }

        match self.config.apply_overlay_file(self.store.path()) {
            Ok(()) => info!("projrc settings file updated and applied"),
            Err(e) => warn!(error = %e, "projrc settings file updated but could not be applied"),
        }
        self.enter(SyncState::Applied);
        Ok(SyncOutcome::Applied)
    }

    /// Compare the peer's overlay with the stored one without writing anything.
    pub fn report(&mut self, peer: &dyn OverlayPeer) -> SyncResult<IncomingReport> {
        let old = self.store.read().unwrap_or_else(|e| {
            warn!(path = %self.store.path().display(), error = %e, "Cannot read projrc file");
            String::new()
        });
        if old.is_empty() {
            debug!("looking for remote projrc file");
        } else {
            debug!("searching for changes to the projrc file");
        }

        let settings = self.config.settings();
        let text = match self.fetch(peer, &settings)? {
            Fetched::Text(text) => text,
            Fetched::Rejected { .. } => return Ok(IncomingReport::Unavailable),
            Fetched::NotAllowListed | Fetched::Absent => {
                self.enter(SyncState::Idle);
                return Ok(IncomingReport::Unavailable);
            }
        };

        self.enter(SyncState::Diffing);
        let report = if !old.is_empty() {
            if old != text {
                info!("remote and local projrc files are different");
                IncomingReport::Differs
            } else {
                debug!("no changes found to projrc file");
                IncomingReport::NoChanges
            }
        } else if !text.is_empty() {
            info!("new remote projrc file found");
            IncomingReport::NewRemoteFile
        } else {
            IncomingReport::NoChanges
        };
        self.enter(SyncState::Idle);
        Ok(report)
    }

    /// The incoming/preview operation, dispatched on `projrc.updateonincoming`.
    pub fn incoming(&mut self, peer: &dyn OverlayPeer) -> SyncResult<IncomingOutcome> {
        match self.config.settings().update_on_incoming {
            IncomingMode::Report => self.report(peer).map(IncomingOutcome::Reported),
            IncomingMode::Prompt => self.sync(peer, Some(true)).map(IncomingOutcome::Synced),
            IncomingMode::Auto => self.sync(peer, None).map(IncomingOutcome::Synced),
        }
    }

    /// FETCHING through FILTERING.
    fn fetch(&mut self, peer: &dyn OverlayPeer, settings: &SyncSettings) -> SyncResult<Fetched> {
        self.state = SyncState::Idle;
        self.enter(SyncState::Fetching);

        let location = peer.location();
        if !AllowList::new(&settings.servers).is_allowed(&location) {
            debug!(peer = %location, "Peer is not a projrc server");
            return Ok(Fetched::NotAllowListed);
        }

        let mut keys = match peer.list_keys(NAMESPACE) {
            Ok(keys) => keys,
            Err(e) => {
                warn!(peer = %location, error = %e, "Cannot fetch projrc file");
                self.enter(SyncState::Rejected);
                return Err(e.into());
            }
        };
        let Some(payload) = keys.remove(DATA_KEY) else {
            debug!(peer = %location, "Peer publishes no projrc file");
            return Ok(Fetched::Absent);
        };

        self.enter(SyncState::Decoding);
        let text = match decode_payload(&payload) {
            Ok(text) => text,
            Err(e) => return Ok(self.rejected(ErrorCode::DecodeFailure, e.to_string())),
        };

        self.enter(SyncState::Validating);
        let model = match parse_overlay(REMOTE_ORIGIN, &text) {
            Ok(model) => model,
            Err(e) => return Ok(self.rejected(ErrorCode::ParseFailure, e.to_string())),
        };

        self.enter(SyncState::Filtering);
        let filter = settings.key_filter();
        if !model.iter().any(|(section, entry)| filter.should_include(section, &entry.key)) {
            debug!("No key of the projrc file is accepted");
            return Ok(Fetched::Text(String::new()));
        }
        Ok(Fetched::Text(filtered_text(&model, &filter)))
    }

    /// Delete the store when the filter accepted no key.
    fn remove(&mut self) -> SyncResult<SyncOutcome> {
        match self.store.remove() {
            Ok(_) => {
                info!("projrc settings file removed");
                self.enter(SyncState::Applied);
                Ok(SyncOutcome::Removed)
            }
            Err(source) => {
                self.enter(SyncState::Rejected);
                Err(SyncError::Store {
                    path: self.store.path().to_path_buf(),
                    source,
                })
            }
        }
    }

    fn rejected(&mut self, code: ErrorCode, message: String) -> Fetched {
        self.reject(code, &message);
        Fetched::Rejected { code, message }
    }

    fn reject(&mut self, code: ErrorCode, message: &str) {
        warn!(%code, "not saving retrieved projrc file: {}", message);
        self.enter(SyncState::Rejected);
    }

    fn finish(&mut self, outcome: SyncOutcome) -> SyncOutcome {
        self.enter(SyncState::Idle);
        outcome
    }

    fn enter(&mut self, next: SyncState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid projrc sync transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(from = ?self.state, to = ?next, "projrc sync state");
        self.state = next;
    }
}

/// Canonical stored form of `model` under the client's filter.
fn filtered_text(model: &ConfigModel, filter: &KeyFilter) -> String {
    format!("{}{}", ENCODING_CHECK, serialize_filtered(model, filter))
}
