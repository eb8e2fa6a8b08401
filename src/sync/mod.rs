//! Overlay synchronization between repositories.
//!
//! A central repository publishes its overlay under the [`NAMESPACE`] key
//! namespace. Clients fetch it on clone, pull and (optionally) incoming,
//! filter it through their own include/exclude lists and store the result
//! in `.hg/projrc`.

pub mod codec;
mod orchestrator;
mod peer;
mod prompt;
mod publish;
pub mod servers;
mod store;

pub use codec::{decode_payload, escape, unescape, ENCODING_CHECK};
pub use orchestrator::{
    IncomingOutcome, IncomingReport, SyncOutcome, SyncState, Synchronizer, CONFIRM_MESSAGE,
};
pub use peer::{LocalPeer, OverlayPeer};
pub use prompt::{FixedAnswer, Prompt, TerminalPrompt};
pub use publish::Publisher;
pub use servers::AllowList;
pub use store::OverlayStore;

/// Key namespace the overlay is published under.
pub const NAMESPACE: &str = "projrc";

/// Key holding the escaped overlay text.
pub const DATA_KEY: &str = "data";

/// Key holding the publisher's parse diagnostic for a malformed overlay.
pub const ERROR_KEY: &str = "error";
