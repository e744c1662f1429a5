use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;

use crate::config::{AppConfig, BackendMode, Website};
use crate::demo_backend::DemoBackend;
use crate::http_client::{get_text, http_client, post_json};
use crate::identity::SessionIdentity;
use crate::roster::{
    FreeAgentRecommendations, LeagueCatalog, LeagueEntry, RosterBundle, RosterPayload,
    parse_roster_entries,
};

const LAST_RUN_PATH: &str = "/load-last-run-info";
const REGISTER_PATH: &str = "/load-sleeper-info";
const CATALOG_PATH: &str = "/load-cached-starts";
const LEAGUE_DATA_PATH: &str = "/load-league-data";
const FREE_AGENT_PATH: &str = "/load-free-agent-data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastRunInfo {
    pub runtime: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub name: String,
    pub website: Website,
}

/// Reads against the rankings backend. Every call except `last_run_info` is scoped
/// to a session identity.
pub trait LeagueBackend: Send + Sync {
    fn last_run_info(&self) -> Result<LastRunInfo>;

    fn register_user(
        &self,
        identity: &SessionIdentity,
        registration: &Registration,
    ) -> Result<()>;

    fn fetch_catalog(&self, identity: &SessionIdentity) -> Result<LeagueCatalog>;

    fn fetch_roster(&self, identity: &SessionIdentity, league: &str) -> Result<RosterPayload>;

    /// Legacy endpoint, only consulted when the roster response has no embedded
    /// recommendations.
    fn fetch_free_agents(
        &self,
        identity: &SessionIdentity,
        league: &str,
    ) -> Result<FreeAgentRecommendations>;
}

pub struct HttpBackend {
    base_url: String,
    client: &'static Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, config: &AppConfig) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client(config.http_timeout)?,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl LeagueBackend for HttpBackend {
    fn last_run_info(&self) -> Result<LastRunInfo> {
        let body = get_text(self.client, &self.url(LAST_RUN_PATH), None, &[])
            .context("last run request failed")?;
        parse_last_run_json(&body)
    }

    fn register_user(
        &self,
        identity: &SessionIdentity,
        registration: &Registration,
    ) -> Result<()> {
        if registration.name.trim().is_empty() {
            bail!("Username is required");
        }
        post_json(self.client, &self.url(REGISTER_PATH), identity, registration)
            .context("registration request failed")?;
        Ok(())
    }

    fn fetch_catalog(&self, identity: &SessionIdentity) -> Result<LeagueCatalog> {
        let body = get_text(self.client, &self.url(CATALOG_PATH), Some(identity), &[])
            .context("league catalog request failed")?;
        parse_catalog_json(&body)
    }

    fn fetch_roster(&self, identity: &SessionIdentity, league: &str) -> Result<RosterPayload> {
        let body = get_text(
            self.client,
            &self.url(LEAGUE_DATA_PATH),
            Some(identity),
            &[("league", league)],
        )
        .context("league data request failed")?;
        parse_roster_json(&body)
    }

    fn fetch_free_agents(
        &self,
        identity: &SessionIdentity,
        league: &str,
    ) -> Result<FreeAgentRecommendations> {
        let body = get_text(
            self.client,
            &self.url(FREE_AGENT_PATH),
            Some(identity),
            &[("league", league)],
        )
        .context("free agent request failed")?;
        parse_free_agents_json(&body)
    }
}

pub fn backend_from_config(config: &AppConfig) -> Result<Arc<dyn LeagueBackend>> {
    match &config.backend {
        BackendMode::Http { base_url } => Ok(Arc::new(HttpBackend::new(base_url, config)?)),
        BackendMode::Demo => Ok(Arc::new(DemoBackend::new(config.demo_delay))),
    }
}

/// Roster plus recommendations for one league. A flat roster response falls back to
/// the legacy free-agent endpoint; a failure there only costs the recommendations.
pub fn load_roster_bundle(
    backend: &dyn LeagueBackend,
    identity: &SessionIdentity,
    league: &str,
    warn: &mut dyn FnMut(String),
) -> Result<RosterBundle> {
    match backend.fetch_roster(identity, league)? {
        RosterPayload::Embedded(bundle) => Ok(bundle),
        RosterPayload::Flat(entries) => {
            let free_agents = match backend.fetch_free_agents(identity, league) {
                Ok(recs) => recs,
                Err(err) => {
                    warn(format!("[WARN] Free agents for {league} unavailable: {err:#}"));
                    FreeAgentRecommendations::new()
                }
            };
            Ok(RosterBundle {
                entries,
                free_agents,
            })
        }
    }
}

pub fn parse_last_run_json(raw: &str) -> Result<LastRunInfo> {
    let root: Value = serde_json::from_str(raw.trim()).context("invalid last run json")?;
    let runtime = root
        .get("Runtime")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("response has no Runtime"))?;
    Ok(LastRunInfo {
        runtime: runtime.to_string(),
    })
}

/// `league_names` is normally a key -> name object (order preserved); a bare list of
/// names is accepted too, keyed by index.
pub fn parse_catalog_json(raw: &str) -> Result<LeagueCatalog> {
    let root: Value = serde_json::from_str(raw.trim()).context("invalid league catalog json")?;
    let Some(names) = root.get("league_names") else {
        let message = pick_message(&root).unwrap_or("response has no league_names");
        bail!("{message}");
    };

    let leagues = match names {
        Value::Object(map) => map
            .iter()
            .filter_map(|(key, name)| {
                league_name(name).map(|name| LeagueEntry {
                    key: key.clone(),
                    name,
                })
            })
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .filter_map(|(idx, name)| {
                league_name(name).map(|name| LeagueEntry {
                    key: idx.to_string(),
                    name,
                })
            })
            .collect(),
        Value::Null => bail!("league_names is null"),
        _ => bail!("league_names has unexpected shape"),
    };
    Ok(LeagueCatalog::new(leagues))
}

pub fn parse_roster_json(raw: &str) -> Result<RosterPayload> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(RosterPayload::Flat(Vec::new()));
    }
    let root: Value = serde_json::from_str(trimmed).context("invalid league data json")?;
    match &root {
        Value::Array(_) => Ok(RosterPayload::Flat(parse_roster_entries(Some(&root)))),
        Value::Object(map) if map.contains_key("suggested_starts") => {
            Ok(RosterPayload::Embedded(RosterBundle {
                entries: parse_roster_entries(root.get("suggested_starts")),
                free_agents: parse_free_agent_recs(root.get("free_agent_recs")),
            }))
        }
        _ => {
            let message = pick_message(&root).unwrap_or("unexpected league data shape");
            bail!("{message}")
        }
    }
}

pub fn parse_free_agents_json(raw: &str) -> Result<FreeAgentRecommendations> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(FreeAgentRecommendations::new());
    }
    let root: Value = serde_json::from_str(trimmed).context("invalid free agent json")?;
    if let Some(err) = root.get("error").and_then(Value::as_str) {
        bail!("{err}");
    }
    Ok(parse_free_agent_recs(Some(&root)))
}

fn parse_free_agent_recs(value: Option<&Value>) -> FreeAgentRecommendations {
    match value {
        Some(Value::Object(map)) => {
            let mut recs = FreeAgentRecommendations::new();
            for (position, candidates) in map {
                for entry in parse_roster_entries(Some(candidates)) {
                    recs.push(position, entry);
                }
            }
            recs
        }
        Some(list @ Value::Array(_)) => {
            FreeAgentRecommendations::from_flat(parse_roster_entries(Some(list)))
        }
        _ => FreeAgentRecommendations::new(),
    }
}

fn league_name(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn pick_message(value: &Value) -> Option<&str> {
    ["error", "message"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
}
