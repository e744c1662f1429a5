//! League catalog and roster entities, parsed defensively from the backend's
//! loosely-typed JSON. Field-level defects fall back to safe values here so the
//! rest of the pipeline never sees a half-formed entry.

use serde_json::Value;

use crate::percentiles::PercentileTable;
use crate::tiers::{RankValue, parse_leading_int};

const HEADSHOT_URL: &str = "https://sleepercdn.com/content/nfl/players";
const TEAM_LOGO_URL: &str = "https://sleepercdn.com/images/team_logos/nfl";
const STALE_PROJECTION_MARKER: &str = "old projection";
pub const MAX_MATCHUP_STARS: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeagueEntry {
    pub key: String,
    pub name: String,
}

/// Leagues available to the session, in backend order. The first is the default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeagueCatalog {
    leagues: Vec<LeagueEntry>,
}

impl LeagueCatalog {
    pub fn new(leagues: Vec<LeagueEntry>) -> Self {
        Self { leagues }
    }

    pub fn default_selection(&self) -> Option<&str> {
        self.leagues.first().map(|l| l.name.as_str())
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.leagues.iter().position(|l| l.name == name)
    }

    pub fn get(&self, idx: usize) -> Option<&LeagueEntry> {
        self.leagues.get(idx)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.leagues.iter().map(|l| l.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.leagues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leagues.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RosterSlot {
    Qb,
    Rb,
    Wr,
    Te,
    Flex,
    RecFlex,
    SuperFlex,
    K,
    Def,
    Bench,
    Other(String),
}

impl RosterSlot {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_uppercase().as_str() {
            "QB" => Self::Qb,
            "RB" => Self::Rb,
            "WR" => Self::Wr,
            "TE" => Self::Te,
            "FLEX" => Self::Flex,
            "REC_FLEX" => Self::RecFlex,
            "SUPER_FLEX" => Self::SuperFlex,
            "K" => Self::K,
            "DEF" | "DST" => Self::Def,
            "BN" => Self::Bench,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Qb => "QB",
            Self::Rb => "RB",
            Self::Wr => "WR",
            Self::Te => "TE",
            Self::Flex => "FLEX",
            Self::RecFlex => "REC_FLEX",
            Self::SuperFlex => "SUPER_FLEX",
            Self::K => "K",
            Self::Def => "DEF",
            Self::Bench => "BN",
            Self::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Points(f64),
    /// No current lines were available; the number comes from an older projection.
    Stale(f64),
    NotApplicable,
}

impl Projection {
    pub fn parse(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Number(n)) => n
                .as_f64()
                .filter(|p| p.is_finite())
                .map(Self::Points)
                .unwrap_or(Self::NotApplicable),
            Some(Value::String(raw)) => {
                let points = raw
                    .split_whitespace()
                    .next()
                    .and_then(|token| token.parse::<f64>().ok())
                    .filter(|p| p.is_finite());
                match points {
                    Some(p) if raw.to_ascii_lowercase().contains(STALE_PROJECTION_MARKER) => {
                        Self::Stale(p)
                    }
                    Some(p) => Self::Points(p),
                    None => Self::NotApplicable,
                }
            }
            _ => Self::NotApplicable,
        }
    }

    pub fn points(self) -> Option<f64> {
        match self {
            Self::Points(p) | Self::Stale(p) => Some(p),
            Self::NotApplicable => None,
        }
    }

    pub fn label(self) -> String {
        match self {
            Self::Points(p) => format!("{p:.2} Points"),
            Self::Stale(p) => format!("{p:.2} Points (old projection)"),
            Self::NotApplicable => "n/a".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatLine {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub name: String,
    pub slot: RosterSlot,
    pub pos_rank: RankValue,
    pub flex_rank: Option<RankValue>,
    pub real_life_pos: Option<String>,
    pub team: Option<String>,
    pub team_name: Option<String>,
    pub player_id: Option<String>,
    pub projection: Projection,
    pub matchup_stars: u8,
    pub stat_line: Vec<StatLine>,
    pub boom: Option<f64>,
    pub bust: Option<f64>,
    pub percentiles: Option<PercentileTable>,
}

impl RosterEntry {
    /// The flex indicator is hidden for slots and positions that can never flex.
    pub fn shows_flex_line(&self) -> bool {
        let slot_excluded = matches!(
            self.slot,
            RosterSlot::RecFlex | RosterSlot::K | RosterSlot::Def
        );
        let qb = self
            .real_life_pos
            .as_deref()
            .is_some_and(|pos| pos.eq_ignore_ascii_case("QB"));
        !(slot_excluded || qb)
    }

    pub fn headshot_url(&self) -> Option<String> {
        self.player_id
            .as_deref()
            .map(|pid| format!("{HEADSHOT_URL}/{pid}.jpg"))
    }

    /// Defenses carry `TEAM`; players carry `TEAM_NAME`.
    pub fn team_logo_url(&self) -> Option<String> {
        self.team
            .as_deref()
            .or(self.team_name.as_deref())
            .filter(|team| !team.eq_ignore_ascii_case("UNKNOWN"))
            .map(|team| format!("{TEAM_LOGO_URL}/{}.png", team.to_ascii_lowercase()))
    }
}

/// Best-first free-agent candidates per position label, in backend order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FreeAgentRecommendations {
    groups: Vec<(String, Vec<RosterEntry>)>,
}

impl FreeAgentRecommendations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, position: &str, entry: RosterEntry) {
        match self.groups.iter_mut().find(|(pos, _)| pos == position) {
            Some((_, entries)) => entries.push(entry),
            None => self.groups.push((position.to_string(), vec![entry])),
        }
    }

    /// Groups a flat candidate list by each entry's `POS`.
    pub fn from_flat(entries: Vec<RosterEntry>) -> Self {
        let mut recs = Self::new();
        for entry in entries {
            let position = entry.slot.label().to_string();
            recs.push(&position, entry);
        }
        recs
    }

    pub fn get(&self, position: &str) -> Option<&[RosterEntry]> {
        self.groups
            .iter()
            .find(|(pos, _)| pos == position)
            .map(|(_, entries)| entries.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RosterEntry])> + '_ {
        self.groups
            .iter()
            .map(|(pos, entries)| (pos.as_str(), entries.as_slice()))
    }

    pub fn into_groups(self) -> Vec<(String, Vec<RosterEntry>)> {
        self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|(_, entries)| entries.is_empty())
    }

    pub fn total_len(&self) -> usize {
        self.groups.iter().map(|(_, entries)| entries.len()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RosterBundle {
    pub entries: Vec<RosterEntry>,
    pub free_agents: FreeAgentRecommendations,
}

/// Shape of a league data response.
#[derive(Debug, Clone, PartialEq)]
pub enum RosterPayload {
    /// Lineup only; recommendations come from the legacy free-agent endpoint.
    Flat(Vec<RosterEntry>),
    Embedded(RosterBundle),
}

/// Parses one `NAME/POS/...` record. Returns `None` only for non-objects.
pub fn parse_roster_entry(value: &Value) -> Option<RosterEntry> {
    if !value.is_object() {
        return None;
    }
    let rank = field_string(value, "POS_RANK");
    let flex = field_string(value, "FLEX");

    Some(RosterEntry {
        name: field_string(value, "NAME").unwrap_or_else(|| "Unknown".to_string()),
        slot: RosterSlot::parse(&field_string(value, "POS").unwrap_or_default()),
        pos_rank: RankValue::parse(rank.as_deref()),
        flex_rank: flex.as_deref().map(|raw| RankValue::parse(Some(raw))),
        real_life_pos: field_string(value, "REALLIFE_POS"),
        team: field_string(value, "TEAM"),
        team_name: field_string(value, "TEAM_NAME"),
        player_id: field_string(value, "PID"),
        projection: Projection::parse(value.get("VEGAS")),
        matchup_stars: parse_matchup_stars(value.get("MATCHUP_RATING")),
        stat_line: parse_stat_line(value.get("VEGAS_STATS")),
        boom: field_f64(value, "BOOM"),
        bust: field_f64(value, "BUST"),
        percentiles: parse_percentile_table(value.get("PERCENTILES")),
    })
}

pub fn parse_roster_entries(value: Option<&Value>) -> Vec<RosterEntry> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(parse_roster_entry).collect())
        .unwrap_or_default()
}

/// Unknown or non-numeric ratings read as zero stars.
pub fn parse_matchup_stars(value: Option<&Value>) -> u8 {
    let rating = match value {
        Some(Value::Number(n)) => n.as_f64().map(|v| v.trunc() as i64),
        Some(Value::String(raw)) => parse_leading_int(raw),
        _ => None,
    };
    rating
        .map(|r| r.clamp(0, i64::from(MAX_MATCHUP_STARS)) as u8)
        .unwrap_or(0)
}

/// Accepts `{ "50": "12.3" }` objects or a dense array indexed by percentile.
/// Returns `None` when nothing usable is present.
pub fn parse_percentile_table(value: Option<&Value>) -> Option<PercentileTable> {
    let mut table = PercentileTable::new();
    match value? {
        Value::Object(map) => {
            for (bucket, points) in map {
                let Ok(bucket) = bucket.trim().parse::<u8>() else {
                    continue;
                };
                if let Some(points) = value_f64(points) {
                    table.insert(bucket, points);
                }
            }
        }
        Value::Array(items) => {
            for (bucket, points) in items.iter().enumerate() {
                let (Ok(bucket), Some(points)) = (u8::try_from(bucket), value_f64(points)) else {
                    continue;
                };
                table.insert(bucket, points);
            }
        }
        _ => {}
    }
    (!table.is_empty()).then_some(table)
}

fn parse_stat_line(value: Option<&Value>) -> Vec<StatLine> {
    let Some(Value::Object(map)) = value else {
        return Vec::new();
    };
    map.iter()
        .filter_map(|(name, v)| {
            value_f64(v).map(|value| StatLine {
                name: name.clone(),
                value,
            })
        })
        .collect()
}

fn field_string(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn field_f64(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(value_f64)
}

fn value_f64(value: &Value) -> Option<f64> {
    let out = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    out.filter(|v| v.is_finite())
}
