use crate::percentiles::{
    DEFAULT_THRESHOLD_UPPER_BOUND, probability_at_least, threshold_upper_bound,
};
use crate::roster::{RosterBundle, RosterEntry};
use crate::tiers::{RankValue, TierColor};

#[derive(Debug, Clone, PartialEq)]
pub struct TierIndicator {
    pub color: TierColor,
    pub label: String,
}

/// A roster entry with everything the renderer needs already derived.
#[derive(Debug, Clone, PartialEq)]
pub struct LineupRow {
    pub entry: RosterEntry,
    pub position: TierIndicator,
    /// `None` when the flex line is hidden for this slot.
    pub flex: Option<TierIndicator>,
    pub stars: u8,
    pub projection_label: String,
    pub threshold: f64,
    pub threshold_max: f64,
    /// `None` when the entry has no percentile table.
    pub probability: Option<f64>,
}

impl LineupRow {
    pub fn from_entry(entry: RosterEntry) -> Self {
        let position = TierIndicator {
            color: entry.pos_rank.color(),
            label: entry.pos_rank.label(),
        };
        let flex = entry.shows_flex_line().then(|| {
            // A missing flex rank renders the same as an unranked one.
            let rank = entry.flex_rank.unwrap_or(RankValue::Unranked);
            TierIndicator {
                color: rank.color(),
                label: rank.label(),
            }
        });
        let threshold_max = entry
            .percentiles
            .as_ref()
            .map(threshold_upper_bound)
            .unwrap_or(DEFAULT_THRESHOLD_UPPER_BOUND)
            .max(0.0);
        let initial = entry.projection.points().unwrap_or(0.0).round();

        let mut row = Self {
            stars: entry.matchup_stars,
            projection_label: entry.projection.label(),
            position,
            flex,
            entry,
            threshold: 0.0,
            threshold_max,
            probability: None,
        };
        row.set_threshold(initial);
        row
    }

    /// Clamps to `[0, threshold_max]` and recomputes the probability.
    pub fn set_threshold(&mut self, value: f64) {
        let value = if value.is_finite() { value } else { 0.0 };
        self.threshold = value.clamp(0.0, self.threshold_max);
        self.probability = self
            .entry
            .percentiles
            .as_ref()
            .and_then(|table| probability_at_least(table, self.threshold));
    }

    pub fn nudge_threshold(&mut self, delta: f64) {
        self.set_threshold(self.threshold + delta);
    }

    /// Boom and bust are independent; each half is shown only when present.
    pub fn boom_bust_label(&self) -> Option<String> {
        let parts: Vec<String> = [("Boom", self.entry.boom), ("Bust", self.entry.bust)]
            .into_iter()
            .filter_map(|(name, pct)| pct.map(|pct| format!("{name} {pct:.1}%")))
            .collect();
        (!parts.is_empty()).then(|| parts.join(" | "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FreeAgentGroup {
    pub position: String,
    pub rows: Vec<LineupRow>,
}

/// The displayed bundle for the selected league.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterView {
    pub league: String,
    pub rows: Vec<LineupRow>,
    pub free_agents: Vec<FreeAgentGroup>,
}

impl RosterView {
    pub fn from_bundle(league: impl Into<String>, bundle: RosterBundle) -> Self {
        Self {
            league: league.into(),
            rows: bundle.entries.into_iter().map(LineupRow::from_entry).collect(),
            free_agents: bundle
                .free_agents
                .into_groups()
                .into_iter()
                .map(|(position, entries)| FreeAgentGroup {
                    position,
                    rows: entries.into_iter().map(LineupRow::from_entry).collect(),
                })
                .collect(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len() + self.free_agents.iter().map(|g| g.rows.len()).sum::<usize>()
    }

    /// Lineup rows first, then free agents group by group.
    pub fn row(&self, idx: usize) -> Option<&LineupRow> {
        if idx < self.rows.len() {
            return self.rows.get(idx);
        }
        let mut rest = idx - self.rows.len();
        for group in &self.free_agents {
            if rest < group.rows.len() {
                return group.rows.get(rest);
            }
            rest -= group.rows.len();
        }
        None
    }

    pub fn row_mut(&mut self, idx: usize) -> Option<&mut LineupRow> {
        if idx < self.rows.len() {
            return self.rows.get_mut(idx);
        }
        let mut rest = idx - self.rows.len();
        for group in &mut self.free_agents {
            if rest < group.rows.len() {
                return group.rows.get_mut(rest);
            }
            rest -= group.rows.len();
        }
        None
    }

    pub fn has_free_agents(&self) -> bool {
        self.free_agents.iter().any(|g| !g.rows.is_empty())
    }
}
