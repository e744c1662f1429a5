use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, bail};
use serde_json::json;

use ff_lineup_terminal::backend_fetch::{
    LastRunInfo, LeagueBackend, Registration, load_roster_bundle,
};
use ff_lineup_terminal::demo_backend::DemoBackend;
use ff_lineup_terminal::error::FetchError;
use ff_lineup_terminal::identity::SessionIdentity;
use ff_lineup_terminal::provider::spawn_provider;
use ff_lineup_terminal::roster::{
    FreeAgentRecommendations, LeagueCatalog, LeagueEntry, RosterBundle, RosterPayload,
    parse_roster_entry,
};
use ff_lineup_terminal::state::{AppState, Delta, Phase, ProviderCommand, apply_delta};

/// Serves a one-player roster and records which identity each call carried.
struct StubBackend {
    flat: bool,
    free_agents_fail: bool,
    seen: Mutex<Vec<(String, String)>>,
}

impl StubBackend {
    fn new(flat: bool, free_agents_fail: bool) -> Self {
        Self {
            flat,
            free_agents_fail,
            seen: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, call: &str, identity: &SessionIdentity) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push((call.to_string(), identity.as_str().to_string()));
        }
    }
}

impl LeagueBackend for StubBackend {
    fn last_run_info(&self) -> Result<LastRunInfo> {
        Ok(LastRunInfo {
            runtime: "yesterday".to_string(),
        })
    }

    fn register_user(
        &self,
        identity: &SessionIdentity,
        _registration: &Registration,
    ) -> Result<()> {
        self.record("register", identity);
        Ok(())
    }

    fn fetch_catalog(&self, identity: &SessionIdentity) -> Result<LeagueCatalog> {
        self.record("catalog", identity);
        Ok(LeagueCatalog::new(vec![LeagueEntry {
            key: "k1".to_string(),
            name: "League One".to_string(),
        }]))
    }

    fn fetch_roster(&self, identity: &SessionIdentity, league: &str) -> Result<RosterPayload> {
        self.record("roster", identity);
        if league == "Broken" {
            bail!("http 500 Internal Server Error: boom");
        }
        let entry =
            parse_roster_entry(&json!({ "NAME": "Starter", "POS": "RB", "POS_RANK": "3" }))
                .expect("object entry");
        if self.flat {
            Ok(RosterPayload::Flat(vec![entry]))
        } else {
            Ok(RosterPayload::Embedded(RosterBundle {
                entries: vec![entry],
                free_agents: FreeAgentRecommendations::new(),
            }))
        }
    }

    fn fetch_free_agents(
        &self,
        identity: &SessionIdentity,
        _league: &str,
    ) -> Result<FreeAgentRecommendations> {
        self.record("free_agents", identity);
        if self.free_agents_fail {
            bail!("http 404 Not Found");
        }
        let mut recs = FreeAgentRecommendations::new();
        let fa = parse_roster_entry(&json!({ "NAME": "Waiver Pick", "POS": "WR" }))
            .expect("object entry");
        recs.push("WR", fa);
        Ok(recs)
    }
}

fn identity() -> SessionIdentity {
    SessionIdentity::from_raw("abcd-1234").expect("valid identity")
}

#[test]
fn flat_roster_falls_back_to_legacy_free_agents() {
    let backend = StubBackend::new(true, false);
    let mut warnings = Vec::new();
    let bundle = load_roster_bundle(&backend, &identity(), "League One", &mut |w: String| {
        warnings.push(w)
    })
    .expect("bundle loads");
    assert_eq!(bundle.entries.len(), 1);
    assert_eq!(bundle.free_agents.get("WR").map(<[_]>::len), Some(1));
    assert!(warnings.is_empty());

    let seen = backend.seen.lock().expect("lock");
    let calls: Vec<&str> = seen.iter().map(|(call, _)| call.as_str()).collect();
    assert_eq!(calls, vec!["roster", "free_agents"]);
    assert!(seen.iter().all(|(_, id)| id == "abcd-1234"));
}

#[test]
fn embedded_roster_skips_legacy_endpoint() {
    let backend = StubBackend::new(false, false);
    let bundle = load_roster_bundle(&backend, &identity(), "League One", &mut |_: String| {})
        .expect("bundle loads");
    assert!(bundle.free_agents.is_empty());
    let seen = backend.seen.lock().expect("lock");
    assert_eq!(seen.len(), 1);
}

#[test]
fn legacy_free_agent_failure_only_warns() {
    let backend = StubBackend::new(true, true);
    let mut warnings = Vec::new();
    let bundle = load_roster_bundle(&backend, &identity(), "League One", &mut |w: String| {
        warnings.push(w)
    })
    .expect("roster still loads");
    assert_eq!(bundle.entries.len(), 1);
    assert!(bundle.free_agents.is_empty());
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].starts_with("[WARN]"));
}

#[test]
fn roster_transport_failure_is_an_error() {
    let backend = StubBackend::new(true, false);
    let err = load_roster_bundle(&backend, &identity(), "Broken", &mut |_: String| {})
        .expect_err("roster failure propagates");
    let mapped = FetchError::roster("Broken", &err);
    assert!(matches!(
        mapped,
        FetchError::RosterUnavailable { ref league, .. } if league == "Broken"
    ));
    assert!(mapped.to_string().contains("500"));
}

fn drive_until(
    state: &mut AppState,
    cmd_tx: &mpsc::Sender<ProviderCommand>,
    rx: &mpsc::Receiver<Delta>,
    done: impl Fn(&AppState) -> bool,
) {
    for _ in 0..50 {
        for cmd in state.take_pending() {
            cmd_tx.send(cmd).expect("provider alive");
        }
        if done(state) {
            return;
        }
        let delta = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("provider should answer");
        apply_delta(state, delta);
    }
    panic!("state never settled: {:?}", state.phase);
}

#[test]
fn provider_runs_registration_through_roster() {
    let backend = Arc::new(StubBackend::new(true, false));
    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_provider(backend.clone(), tx, cmd_rx);

    let mut state = AppState::new(Some(identity()));
    state.request_last_run();
    state.username_input = "gridiron_guru".to_string();
    state.submit_username().expect("queued");

    drive_until(&mut state, &cmd_tx, &rx, |s| {
        matches!(s.phase, Phase::RosterReady { .. }) && s.last_run.is_some()
    });

    assert_eq!(state.last_run.as_deref(), Some("yesterday"));
    let view = state.roster.as_ref().expect("roster displayed");
    assert_eq!(view.rows[0].entry.name, "Starter");
    assert!(view.has_free_agents());

    let seen = backend.seen.lock().expect("lock");
    let calls: Vec<&str> = seen.iter().map(|(call, _)| call.as_str()).collect();
    assert_eq!(calls, vec!["register", "catalog", "roster", "free_agents"]);
}

#[test]
fn demo_backend_serves_full_session() {
    let backend = Arc::new(DemoBackend::new(Duration::ZERO));
    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_provider(backend, tx, cmd_rx);

    let mut state = AppState::new(Some(identity()));
    state.activate().expect("identity present");
    drive_until(&mut state, &cmd_tx, &rx, |s| matches!(s.phase, Phase::RosterReady { .. }));

    let view = state.roster.as_ref().expect("roster displayed");
    assert!(!view.rows.is_empty());
    assert!(view.has_free_agents());
    assert!(view.rows.iter().any(|r| r.probability.is_some()));
}
