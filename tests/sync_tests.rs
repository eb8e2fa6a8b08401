//! End-to-end tests of the overlay synchronization flow.
//!
//! A "central" and a "client" repository live in a temp dir. The client's
//! `[projrc]` settings come from its `.hg/hgrc`; the central repository
//! publishes whatever is in its `.hg/projrc`.

use projrc::config::{Classifier, ConfigModel, EffectiveConfig, Parser, RcPaths};
use projrc::error::{ErrorCode, SyncError, TransportError};
use projrc::sync::{
    escape, FixedAnswer, IncomingOutcome, IncomingReport, LocalPeer, OverlayPeer, OverlayStore,
    SyncOutcome, SyncState, Synchronizer, DATA_KEY, ENCODING_CHECK,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tempfile::TempDir;

struct Repos {
    _temp: TempDir,
    central: PathBuf,
    client: PathBuf,
}

impl Repos {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let central = temp.path().join("central");
        let client = temp.path().join("client");
        std::fs::create_dir_all(central.join(".hg")).unwrap();
        std::fs::create_dir_all(client.join(".hg")).unwrap();
        Self {
            _temp: temp,
            central,
            client,
        }
    }

    fn publish(&self, text: &str) {
        std::fs::write(self.central.join(".hg").join("projrc"), text).unwrap();
    }

    /// Client configuration with the given `[projrc]` settings and extra text.
    fn client_config(&self, settings: &str, extra: &str) -> EffectiveConfig {
        let hgrc = self.client.join(".hg").join("hgrc");
        let text = format!("[projrc]\n{}\n{}", settings, extra);
        std::fs::write(&hgrc, &text).unwrap();

        let mut model = ConfigModel::new();
        Parser::local().read_file(&mut model, &hgrc).unwrap();
        EffectiveConfig::new(model, Classifier::new(&RcPaths::default()))
    }

    fn store(&self) -> OverlayStore {
        OverlayStore::for_repo(&self.client)
    }

    fn stored(&self) -> Option<String> {
        std::fs::read_to_string(self.client.join(".hg").join("projrc")).ok()
    }

    fn peer(&self) -> LocalPeer {
        LocalPeer::new(&self.central)
    }
}

/// Serves a fixed key mapping.
struct StaticPeer {
    keys: BTreeMap<String, String>,
}

impl StaticPeer {
    fn with_data(payload: &str) -> Self {
        let mut keys = BTreeMap::new();
        keys.insert(DATA_KEY.to_string(), payload.to_string());
        Self { keys }
    }
}

impl OverlayPeer for StaticPeer {
    fn location(&self) -> String {
        "http://central.example.com/repo".to_string()
    }

    fn list_keys(&self, _namespace: &str) -> Result<BTreeMap<String, String>, TransportError> {
        Ok(self.keys.clone())
    }
}

/// A peer that cannot be reached.
struct DownPeer;

impl OverlayPeer for DownPeer {
    fn location(&self) -> String {
        "ssh://down.example.com/repo".to_string()
    }

    fn list_keys(&self, _namespace: &str) -> Result<BTreeMap<String, String>, TransportError> {
        Err(TransportError::NotFound {
            location: self.location(),
        })
    }
}

fn expected(body: &str) -> String {
    format!("{}{}", ENCODING_CHECK, body)
}

#[test]
fn test_new_overlay_is_stored_and_applied() {
    let repos = Repos::new();
    let config = repos.client_config("servers = *\ninclude = *\nconfirm = false", "");
    let peer = StaticPeer::with_data(&escape("[ui]\nmerge=internal:merge\n"));

    let mut sync = Synchronizer::new(&config, repos.store(), FixedAnswer::new(true));
    let outcome = sync.sync(&peer, None).unwrap();

    assert_eq!(outcome, SyncOutcome::Applied);
    assert_eq!(sync.state(), SyncState::Applied);
    assert_eq!(sync.prompt().asked, 0);
    assert_eq!(repos.stored().unwrap(), expected("[ui]\nmerge = internal:merge\n\n"));
    assert_eq!(config.get("ui", "merge").as_deref(), Some("internal:merge"));
}

#[test]
fn test_client_filter_is_applied() {
    let repos = Repos::new();
    let config = repos.client_config(
        "servers = *\ninclude = ui.merge\nexclude = ui.*\nconfirm = false",
        "",
    );
    repos.publish("[ui]\nmerge = internal:merge\ntool = meld\n");

    let mut sync = Synchronizer::new(&config, repos.store(), FixedAnswer::new(true));
    assert_eq!(sync.sync(&repos.peer(), None).unwrap(), SyncOutcome::Applied);

    assert_eq!(repos.stored().unwrap(), expected("[ui]\nmerge = internal:merge\n\n"));
    assert_eq!(config.get("ui", "tool"), None);
}

#[test]
fn test_peer_not_allow_listed_leaves_store_alone() {
    let repos = Repos::new();
    let config = repos.client_config("servers = /srv/elsewhere\ninclude = *\nconfirm = false", "");
    std::fs::write(repos.client.join(".hg").join("projrc"), "[ui]\nold = 1\n").unwrap();
    repos.publish("[ui]\nmerge = internal:merge\n");

    let mut sync = Synchronizer::new(&config, repos.store(), FixedAnswer::new(true));
    assert_eq!(sync.sync(&repos.peer(), None).unwrap(), SyncOutcome::NotAllowListed);

    assert_eq!(sync.state(), SyncState::Idle);
    assert_eq!(repos.stored().unwrap(), "[ui]\nold = 1\n");
}

#[test]
fn test_allow_listed_by_path_and_localhost() {
    let repos = Repos::new();
    repos.publish("[ui]\nmerge = internal:merge\n");

    for servers in [repos.central.to_string_lossy().into_owned(), "localhost".to_string()] {
        let _ = std::fs::remove_file(repos.client.join(".hg").join("projrc"));
        let config = repos.client_config(&format!("servers = {}\ninclude = ui\nconfirm = no", servers), "");
        let mut sync = Synchronizer::new(&config, repos.store(), FixedAnswer::new(true));
        assert_eq!(sync.sync(&repos.peer(), None).unwrap(), SyncOutcome::Applied, "servers = {}", servers);
    }
}

#[test]
fn test_second_sync_is_a_noop() {
    let repos = Repos::new();
    let config = repos.client_config("servers = *\ninclude = *", "");
    repos.publish("[ui]\nmerge = internal:merge\n");

    let mut sync = Synchronizer::new(&config, repos.store(), FixedAnswer::new(true));
    assert_eq!(sync.sync(&repos.peer(), None).unwrap(), SyncOutcome::Applied);
    assert_eq!(sync.prompt().asked, 1);

    let modified = std::fs::metadata(repos.store().path()).unwrap().modified().unwrap();
    assert_eq!(sync.sync(&repos.peer(), None).unwrap(), SyncOutcome::Unchanged);
    assert_eq!(sync.prompt().asked, 1);
    assert_eq!(sync.state(), SyncState::Idle);
    assert_eq!(
        std::fs::metadata(repos.store().path()).unwrap().modified().unwrap(),
        modified
    );
}

#[test]
fn test_declined_update_is_not_stored() {
    let repos = Repos::new();
    let config = repos.client_config("servers = *\ninclude = *\nconfirm = true", "");
    repos.publish("[ui]\nmerge = internal:merge\n");

    let mut sync = Synchronizer::new(&config, repos.store(), FixedAnswer::new(false));
    assert_eq!(sync.sync(&repos.peer(), None).unwrap(), SyncOutcome::Declined);

    assert_eq!(sync.prompt().asked, 1);
    assert!(repos.stored().is_none());
    assert_eq!(config.get("ui", "merge"), None);
}

#[test]
fn test_confirm_first_only_asks_once() {
    let repos = Repos::new();
    let config = repos.client_config("servers = *\ninclude = *\nconfirm = first", "");
    let mut sync = Synchronizer::new(&config, repos.store(), FixedAnswer::new(true));

    repos.publish("[ui]\nmerge = internal:merge\n");
    assert_eq!(sync.sync(&repos.peer(), None).unwrap(), SyncOutcome::Applied);
    assert_eq!(sync.prompt().asked, 1);

    repos.publish("[ui]\nmerge = internal:merge\ntool = meld\n");
    assert_eq!(sync.sync(&repos.peer(), None).unwrap(), SyncOutcome::Applied);
    assert_eq!(sync.prompt().asked, 1);
    assert_eq!(config.get("ui", "tool").as_deref(), Some("meld"));
}

#[test]
fn test_confirm_override() {
    let repos = Repos::new();
    let config = repos.client_config("servers = *\ninclude = *\nconfirm = never", "");
    repos.publish("[ui]\nmerge = internal:merge\n");

    let mut sync = Synchronizer::new(&config, repos.store(), FixedAnswer::new(false));
    assert_eq!(sync.sync(&repos.peer(), Some(true)).unwrap(), SyncOutcome::Declined);
    assert_eq!(sync.prompt().asked, 1);
}

#[test]
fn test_malformed_overlay_is_rejected() {
    let repos = Repos::new();
    let config = repos.client_config("servers = *\ninclude = *\nconfirm = false", "");
    std::fs::write(repos.client.join(".hg").join("projrc"), "[ui]\nold = 1\n").unwrap();
    repos.publish("[ui]\nthis line is broken\n");

    let mut sync = Synchronizer::new(&config, repos.store(), FixedAnswer::new(true));
    let outcome = sync.sync(&repos.peer(), None).unwrap();

    match outcome {
        SyncOutcome::Rejected { code, message } => {
            assert_eq!(code, ErrorCode::ParseFailure);
            assert!(message.contains("this line is broken"), "{}", message);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(sync.state(), SyncState::Rejected);
    assert_eq!(repos.stored().unwrap(), "[ui]\nold = 1\n");
}

#[test]
fn test_bad_escape_is_rejected() {
    let repos = Repos::new();
    let config = repos.client_config("servers = *\ninclude = *\nconfirm = false", "");

    let mut sync = Synchronizer::new(&config, repos.store(), FixedAnswer::new(true));
    let outcome = sync.sync(&StaticPeer::with_data("[ui]\\qmerge"), None).unwrap();

    assert!(matches!(
        outcome,
        SyncOutcome::Rejected {
            code: ErrorCode::DecodeFailure,
            ..
        }
    ));
    assert!(repos.stored().is_none());
}

#[test]
fn test_overlay_include_directive_is_rejected() {
    let repos = Repos::new();
    let config = repos.client_config("servers = *\ninclude = *\nconfirm = false", "");

    let mut sync = Synchronizer::new(&config, repos.store(), FixedAnswer::new(true));
    let outcome = sync
        .sync(&StaticPeer::with_data(&escape("%include /etc/passwd\n")), None)
        .unwrap();

    assert!(matches!(outcome, SyncOutcome::Rejected { code: ErrorCode::ParseFailure, .. }));
}

#[test]
fn test_transport_failure_is_an_error() {
    let repos = Repos::new();
    let config = repos.client_config("servers = *\ninclude = *\nconfirm = false", "");
    std::fs::write(repos.client.join(".hg").join("projrc"), "[ui]\nold = 1\n").unwrap();

    let mut sync = Synchronizer::new(&config, repos.store(), FixedAnswer::new(true));
    let err = sync.sync(&DownPeer, None).unwrap_err();

    assert!(matches!(err, SyncError::Transport(_)));
    assert_eq!(err.code(), ErrorCode::TransportFailure);
    assert_eq!(sync.state(), SyncState::Rejected);
    assert_eq!(repos.stored().unwrap(), "[ui]\nold = 1\n");
}

#[test]
fn test_missing_central_repository_is_transport_error() {
    let repos = Repos::new();
    let config = repos.client_config("servers = *\ninclude = *", "");
    let mut sync = Synchronizer::new(&config, repos.store(), FixedAnswer::new(true));

    let peer = LocalPeer::new(repos.central.join("missing"));
    assert!(matches!(sync.sync(&peer, None), Err(SyncError::Transport(_))));
}

#[test]
fn test_nothing_published_keeps_store() {
    let repos = Repos::new();
    let config = repos.client_config("servers = *\ninclude = *\nconfirm = false", "");
    std::fs::write(repos.client.join(".hg").join("projrc"), "[ui]\nold = 1\n").unwrap();

    let mut sync = Synchronizer::new(&config, repos.store(), FixedAnswer::new(true));
    assert_eq!(sync.sync(&repos.peer(), None).unwrap(), SyncOutcome::NoRemoteData);
    assert_eq!(repos.stored().unwrap(), "[ui]\nold = 1\n");
}

#[test]
fn test_without_filter_lists_everything_but_own_section_is_accepted() {
    let repos = Repos::new();
    let config = repos.client_config("servers = *\nconfirm = false", "");
    repos.publish("[ui]\nmerge=internal:merge\n[projrc]\ninclude = *\n");

    let mut sync = Synchronizer::new(&config, repos.store(), FixedAnswer::new(true));
    assert_eq!(sync.sync(&repos.peer(), None).unwrap(), SyncOutcome::Applied);

    assert_eq!(repos.stored().unwrap(), expected("[ui]\nmerge = internal:merge\n\n"));
    assert_eq!(config.get("ui", "merge").as_deref(), Some("internal:merge"));
    assert_eq!(config.get("projrc", "include"), None);
}

#[test]
fn test_no_accepted_keys_removes_store() {
    let repos = Repos::new();
    let config = repos.client_config("servers = *\ninclude = hooks\nconfirm = false", "");
    std::fs::write(repos.client.join(".hg").join("projrc"), "[hooks]\nold = 1\n").unwrap();
    repos.publish("[ui]\nmerge = internal:merge\n");

    let mut sync = Synchronizer::new(&config, repos.store(), FixedAnswer::new(true));
    assert_eq!(sync.sync(&repos.peer(), None).unwrap(), SyncOutcome::Removed);
    assert_eq!(sync.state(), SyncState::Applied);
    assert!(repos.stored().is_none());

    assert_eq!(sync.sync(&repos.peer(), None).unwrap(), SyncOutcome::Unchanged);
    assert!(repos.stored().is_none());
}

#[test]
fn test_removal_asks_before_deleting() {
    let repos = Repos::new();
    let config = repos.client_config("servers = *\ninclude = hooks", "");
    std::fs::write(repos.client.join(".hg").join("projrc"), "[hooks]\nold = 1\n").unwrap();
    repos.publish("[ui]\nmerge = internal:merge\n");

    let mut sync = Synchronizer::new(&config, repos.store(), FixedAnswer::new(false));
    assert_eq!(sync.sync(&repos.peer(), None).unwrap(), SyncOutcome::Declined);
    assert_eq!(sync.prompt().asked, 1);
    assert_eq!(repos.stored().unwrap(), "[hooks]\nold = 1\n");
}

#[test]
fn test_overlay_cannot_reconfigure_itself() {
    let repos = Repos::new();
    let config = repos.client_config(
        "servers = http://central.example.com/*\ninclude = *, projrc.servers\nconfirm = false",
        "",
    );
    let peer = StaticPeer::with_data(&escape("[projrc]\nservers = *\n[ui]\nmerge = internal:merge\n"));

    let mut sync = Synchronizer::new(&config, repos.store(), FixedAnswer::new(true));
    assert_eq!(sync.sync(&peer, None).unwrap(), SyncOutcome::Applied);

    assert_eq!(repos.stored().unwrap(), expected("[ui]\nmerge = internal:merge\n\n"));
    assert_eq!(
        config.get("projrc", "servers").as_deref(),
        Some("http://central.example.com/*")
    );
}

#[test]
fn test_local_settings_win_over_overlay() {
    let repos = Repos::new();
    let config = repos.client_config(
        "servers = *\ninclude = *\nconfirm = false",
        "[ui]\nmerge = mine\n",
    );
    repos.publish("[ui]\nmerge = internal:merge\nverbose = true\n");

    let mut sync = Synchronizer::new(&config, repos.store(), FixedAnswer::new(true));
    assert_eq!(sync.sync(&repos.peer(), None).unwrap(), SyncOutcome::Applied);

    assert!(repos.stored().unwrap().contains("merge = internal:merge"));
    assert_eq!(config.get("ui", "merge").as_deref(), Some("mine"));
    assert_eq!(config.get("ui", "verbose").as_deref(), Some("true"));
}

#[test]
fn test_incoming_reports_without_writing() {
    let repos = Repos::new();
    let config = repos.client_config("servers = *\ninclude = *\nconfirm = false", "");
    repos.publish("[ui]\nmerge = internal:merge\n");

    let mut sync = Synchronizer::new(&config, repos.store(), FixedAnswer::new(true));
    assert_eq!(
        sync.incoming(&repos.peer()).unwrap(),
        IncomingOutcome::Reported(IncomingReport::NewRemoteFile)
    );
    assert!(repos.stored().is_none());

    assert_eq!(sync.sync(&repos.peer(), None).unwrap(), SyncOutcome::Applied);
    assert_eq!(
        sync.incoming(&repos.peer()).unwrap(),
        IncomingOutcome::Reported(IncomingReport::NoChanges)
    );

    repos.publish("[ui]\nmerge = internal:other\n");
    assert_eq!(
        sync.incoming(&repos.peer()).unwrap(),
        IncomingOutcome::Reported(IncomingReport::Differs)
    );
    assert!(repos.stored().unwrap().contains("internal:merge"));
}

#[test]
fn test_incoming_unavailable_when_not_allow_listed() {
    let repos = Repos::new();
    let config = repos.client_config("servers = /srv/elsewhere\ninclude = *", "");
    repos.publish("[ui]\nmerge = internal:merge\n");

    let mut sync = Synchronizer::new(&config, repos.store(), FixedAnswer::new(true));
    assert_eq!(
        sync.incoming(&repos.peer()).unwrap(),
        IncomingOutcome::Reported(IncomingReport::Unavailable)
    );
}

#[test]
fn test_incoming_update_modes() {
    let repos = Repos::new();
    repos.publish("[ui]\nmerge = internal:merge\n");

    let config = repos.client_config("servers = *\ninclude = *\nconfirm = false\nupdateonincoming = auto", "");
    let mut sync = Synchronizer::new(&config, repos.store(), FixedAnswer::new(true));
    assert_eq!(
        sync.incoming(&repos.peer()).unwrap(),
        IncomingOutcome::Synced(SyncOutcome::Applied)
    );
    assert_eq!(sync.prompt().asked, 0);

    repos.publish("[ui]\nmerge = internal:other\n");
    let config = repos.client_config("servers = *\ninclude = *\nconfirm = false\nupdateonincoming = prompt", "");
    let mut sync = Synchronizer::new(&config, repos.store(), FixedAnswer::new(false));
    assert_eq!(
        sync.incoming(&repos.peer()).unwrap(),
        IncomingOutcome::Synced(SyncOutcome::Declined)
    );
    assert_eq!(sync.prompt().asked, 1);
}
