//! In-process stand-in for the rankings backend.
//!
//! Serves the same wire payloads as the real service (built as JSON, then run
//! through the regular parsers) with a random per-call delay, so the terminal and the
//! stale-result handling can be exercised without a server. Rosters are seeded
//! from the league name and stay stable across refetches.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;
use std::time::Duration;

use anyhow::{Result, bail};
use chrono::Local;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value, json};

use crate::backend_fetch::{
    LastRunInfo, LeagueBackend, Registration, parse_catalog_json, parse_free_agents_json,
    parse_roster_json,
};
use crate::identity::SessionIdentity;
use crate::roster::{FreeAgentRecommendations, LeagueCatalog, RosterPayload};

const DEMO_LEAGUES: &[&str] = &["Dynasty Degens", "Work League", "Family Bragging Rights"];

// Lineup slot -> real-life position pool used to fill it.
const LINEUP_SLOTS: &[(&str, &str)] = &[
    ("QB", "QB"),
    ("RB", "RB"),
    ("RB", "RB"),
    ("WR", "WR"),
    ("WR", "WR"),
    ("TE", "TE"),
    ("FLEX", "WR"),
    ("REC_FLEX", "TE"),
    ("K", "K"),
    ("DEF", "DEF"),
    ("BN", "RB"),
    ("BN", "WR"),
    ("BN", "QB"),
];

const PLAYER_POOL: &[(&str, &[(&str, &str)])] = &[
    (
        "QB",
        &[
            ("Josh Allen", "BUF"),
            ("Jalen Hurts", "PHI"),
            ("Lamar Jackson", "BAL"),
            ("Joe Burrow", "CIN"),
            ("Jared Goff", "DET"),
        ],
    ),
    (
        "RB",
        &[
            ("Bijan Robinson", "ATL"),
            ("Saquon Barkley", "PHI"),
            ("Jahmyr Gibbs", "DET"),
            ("Derrick Henry", "BAL"),
            ("Kyren Williams", "LA"),
            ("James Cook", "BUF"),
            ("Chase Brown", "CIN"),
        ],
    ),
    (
        "WR",
        &[
            ("Ja'Marr Chase", "CIN"),
            ("Justin Jefferson", "MIN"),
            ("CeeDee Lamb", "DAL"),
            ("Amon-Ra St. Brown", "DET"),
            ("Puka Nacua", "LA"),
            ("Nico Collins", "HOU"),
            ("Drake London", "ATL"),
        ],
    ),
    (
        "TE",
        &[
            ("Brock Bowers", "LV"),
            ("Trey McBride", "ARI"),
            ("George Kittle", "SF"),
            ("Sam LaPorta", "DET"),
        ],
    ),
    ("K", &[("Brandon Aubrey", "DAL"), ("Cameron Dicker", "LAC")]),
    (
        "DEF",
        &[("Pittsburgh Steelers", "PIT"), ("Denver Broncos", "DEN")],
    ),
];

pub struct DemoBackend {
    max_delay: Duration,
}

impl DemoBackend {
    pub fn new(max_delay: Duration) -> Self {
        Self { max_delay }
    }

    fn simulate_latency(&self) {
        let max_ms = self.max_delay.as_millis() as u64;
        if max_ms == 0 {
            return;
        }
        let ms = rand::thread_rng().gen_range(max_ms / 4..=max_ms);
        thread::sleep(Duration::from_millis(ms));
    }
}

impl LeagueBackend for DemoBackend {
    fn last_run_info(&self) -> Result<LastRunInfo> {
        Ok(LastRunInfo {
            runtime: Local::now().format("%Y-%m-%d %H:%M").to_string(),
        })
    }

    fn register_user(
        &self,
        _identity: &SessionIdentity,
        registration: &Registration,
    ) -> Result<()> {
        self.simulate_latency();
        if registration.name.trim().is_empty() {
            bail!("Username is required");
        }
        Ok(())
    }

    fn fetch_catalog(&self, _identity: &SessionIdentity) -> Result<LeagueCatalog> {
        self.simulate_latency();
        let names: Map<String, Value> = DEMO_LEAGUES
            .iter()
            .enumerate()
            .map(|(idx, name)| (format!("league_{}", idx + 1), json!(name)))
            .collect();
        parse_catalog_json(&json!({ "league_names": names }).to_string())
    }

    fn fetch_roster(&self, _identity: &SessionIdentity, league: &str) -> Result<RosterPayload> {
        self.simulate_latency();
        if !DEMO_LEAGUES.contains(&league) {
            bail!("No data found for the specified league");
        }
        parse_roster_json(&demo_league_json(league).to_string())
    }

    fn fetch_free_agents(
        &self,
        _identity: &SessionIdentity,
        league: &str,
    ) -> Result<FreeAgentRecommendations> {
        self.simulate_latency();
        let payload = demo_league_json(league);
        parse_free_agents_json(&payload["free_agent_recs"].to_string())
    }
}

/// Embedded-form league payload for `league`.
pub fn demo_league_json(league: &str) -> Value {
    let mut rng = StdRng::seed_from_u64(seed_for(league));
    let mut used: Vec<&str> = Vec::new();

    let starts: Vec<Value> = LINEUP_SLOTS
        .iter()
        .map(|(slot, pool_pos)| {
            match pick_player(&mut rng, pool_pos, &used) {
                Some((name, team)) => {
                    used.push(name);
                    player_json(&mut rng, slot, pool_pos, name, team)
                }
                None => json!({ "NAME": "None Owned", "POS": slot, "POS_RANK": "Unranked" }),
            }
        })
        .collect();

    let mut recs = Map::new();
    for pos in ["QB", "RB", "WR", "TE"] {
        let mut candidates = Vec::new();
        while candidates.len() < 2 {
            let Some((name, team)) = pick_player(&mut rng, pos, &used) else {
                break;
            };
            used.push(name);
            candidates.push(player_json(&mut rng, pos, pos, name, team));
        }
        candidates.sort_by(|a, b| vegas_of(b).total_cmp(&vegas_of(a)));
        recs.insert(pos.to_string(), Value::Array(candidates));
    }

    json!({ "suggested_starts": starts, "free_agent_recs": recs })
}

fn pick_player(
    rng: &mut StdRng,
    pos: &str,
    used: &[&str],
) -> Option<(&'static str, &'static str)> {
    let pool = PLAYER_POOL
        .iter()
        .find(|(p, _)| *p == pos)
        .map(|(_, players)| *players)?;
    let free: Vec<&(&str, &str)> = pool
        .iter()
        .filter(|(name, _)| !used.contains(name))
        .collect();
    if free.is_empty() {
        return None;
    }
    let &(name, team) = free[rng.gen_range(0..free.len())];
    Some((name, team))
}

fn player_json(rng: &mut StdRng, slot: &str, real_pos: &str, name: &str, team: &str) -> Value {
    let tier: u8 = rng.gen_range(1..=12);
    let pos_rank = if tier > 10 {
        "Unranked".to_string()
    } else {
        tier.to_string()
    };
    let mut out = json!({
        "NAME": name,
        "POS": slot,
        "POS_RANK": pos_rank,
        "REALLIFE_POS": real_pos,
        "MATCHUP_RATING": rng.gen_range(1..=5).to_string(),
    });

    if real_pos == "DEF" {
        out["TEAM"] = json!(team);
        out["VEGAS"] = json!("No vegas scores for DEF/K");
        return out;
    }
    out["TEAM_NAME"] = json!(team);
    out["PID"] = json!(rng.gen_range(1000..9999).to_string());
    if real_pos == "K" {
        out["VEGAS"] = json!("No vegas scores for DEF/K");
        return out;
    }
    if matches!(real_pos, "RB" | "WR" | "TE") {
        let flex: u8 = rng.gen_range(1..=10);
        out["FLEX"] = json!(flex.to_string());
    }

    let base: f64 = match real_pos {
        "QB" => rng.gen_range(14.0..26.0),
        "TE" => rng.gen_range(5.0..14.0),
        _ => rng.gen_range(6.0..20.0),
    };
    let spread = base * rng.gen_range(0.35..0.6);
    let mut percentiles = Map::new();
    for bucket in (0..=100).step_by(10) {
        let z = (f64::from(bucket) - 50.0) / 50.0;
        let points = (base + z * spread * 1.8).max(0.0);
        percentiles.insert(bucket.to_string(), json!(format!("{points:.1}")));
    }
    let boom = (35.0 - spread).clamp(5.0, 40.0);
    let bust = (20.0 + spread).clamp(5.0, 45.0);
    let vegas = format!("{base:.2}");
    out["VEGAS"] = if rng.gen_bool(0.1) {
        json!(format!("{vegas}\t Old projection, no lines available, confirm uninjured"))
    } else {
        json!(vegas)
    };
    out["BOOM"] = json!(format!("{boom:.1}"));
    out["BUST"] = json!(format!("{bust:.1}"));
    out["PERCENTILES"] = Value::Object(percentiles);
    out["VEGAS_STATS"] = json!({
        "Receptions": format!("{:.1}", base / 3.0),
        "Rushing Yards": format!("{:.1}", base * 2.5),
    });
    out
}

fn vegas_of(value: &Value) -> f64 {
    value["VEGAS"]
        .as_str()
        .and_then(|s| s.split_whitespace().next())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0)
}

fn seed_for(league: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    league.hash(&mut hasher);
    hasher.finish()
}
