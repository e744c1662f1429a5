use serde_json::{Value, json};

use ff_lineup_terminal::lineup::{LineupRow, RosterView};
use ff_lineup_terminal::roster::{FreeAgentRecommendations, RosterBundle, parse_roster_entry};
use ff_lineup_terminal::tiers::WORST_TIER_COLOR;

fn row(value: Value) -> LineupRow {
    LineupRow::from_entry(parse_roster_entry(&value).expect("object entry"))
}

#[test]
fn unranked_entry_hides_flex_for_non_flex_slots() {
    for slot in ["REC_FLEX", "K", "DEF"] {
        let r = row(json!({ "NAME": "X", "POS": slot, "REALLIFE_POS": "TE" }));
        assert_eq!(r.position.color, WORST_TIER_COLOR, "slot {slot}");
        assert_eq!(r.position.label, "Unranked");
        assert!(r.flex.is_none(), "slot {slot}");
    }

    let qb = row(json!({ "NAME": "Q", "POS": "SUPER_FLEX", "REALLIFE_POS": "QB" }));
    assert_eq!(qb.position.color, WORST_TIER_COLOR);
    assert!(qb.flex.is_none());
}

#[test]
fn missing_flex_rank_shows_worst_color_on_flex_slots() {
    let r = row(json!({ "NAME": "W", "POS": "FLEX", "REALLIFE_POS": "WR" }));
    let flex = r.flex.expect("flex line shown");
    assert_eq!(flex.color, WORST_TIER_COLOR);
    assert_eq!(flex.label, "Unranked");
}

#[test]
fn ranked_indicators_use_gradient() {
    let r = row(json!({ "NAME": "R", "POS": "RB", "POS_RANK": "1", "FLEX": "10" }));
    assert_eq!(r.position.color.hex, "#004d00");
    assert_eq!(r.position.label, "Tier 1");
    assert_eq!(r.flex.map(|f| f.color), Some(WORST_TIER_COLOR));
}

#[test]
fn threshold_starts_at_rounded_projection() {
    let r = row(json!({
        "NAME": "P",
        "POS": "WR",
        "VEGAS": "14.6",
        "PERCENTILES": { "0": "0", "50": "10", "90": "20", "100": "30" }
    }));
    assert_eq!(r.threshold, 15.0);
    assert_eq!(r.threshold_max, 30.0);
    assert_eq!(r.probability, Some(0.5));
}

#[test]
fn threshold_is_clamped_to_table_bounds() {
    let mut r = row(json!({
        "NAME": "P",
        "POS": "WR",
        "VEGAS": "12",
        "PERCENTILES": { "0": "0", "50": "10", "90": "20", "100": "29.2" }
    }));
    r.set_threshold(100.0);
    assert_eq!(r.threshold, 30.0);
    assert_eq!(r.probability, Some(0.0));

    r.set_threshold(-4.0);
    assert_eq!(r.threshold, 0.0);
    assert_eq!(r.probability, Some(1.0));

    r.set_threshold(f64::NAN);
    assert_eq!(r.threshold, 0.0);

    r.nudge_threshold(11.0);
    assert_eq!(r.threshold, 11.0);
    assert_eq!(r.probability, Some(0.5));
}

#[test]
fn missing_distribution_stays_unavailable() {
    let mut r = row(json!({ "NAME": "K", "POS": "K", "VEGAS": "No vegas scores for DEF/K" }));
    assert_eq!(r.threshold, 0.0);
    assert_eq!(r.threshold_max, 50.0);
    assert_eq!(r.probability, None);
    r.nudge_threshold(5.0);
    assert_eq!(r.probability, None);
    assert_eq!(r.projection_label, "n/a");
}

#[test]
fn boom_and_bust_render_independently() {
    let both = row(json!({ "NAME": "A", "POS": "WR", "BOOM": "31.5", "BUST": "12" }));
    assert_eq!(both.boom_bust_label().as_deref(), Some("Boom 31.5% | Bust 12.0%"));

    let boom_only = row(json!({ "NAME": "B", "POS": "WR", "BOOM": "20" }));
    assert_eq!(boom_only.boom_bust_label().as_deref(), Some("Boom 20.0%"));

    let bust_only = row(json!({ "NAME": "C", "POS": "WR", "BUST": "8.4" }));
    assert_eq!(bust_only.boom_bust_label().as_deref(), Some("Bust 8.4%"));

    let neither = row(json!({ "NAME": "D", "POS": "WR" }));
    assert_eq!(neither.boom_bust_label(), None);
}

#[test]
fn view_indexes_lineup_then_free_agents() {
    let lineup = vec![
        parse_roster_entry(&json!({ "NAME": "A", "POS": "QB" })).expect("entry"),
        parse_roster_entry(&json!({ "NAME": "B", "POS": "RB" })).expect("entry"),
    ];
    let mut recs = FreeAgentRecommendations::new();
    recs.push("WR", parse_roster_entry(&json!({ "NAME": "C", "POS": "WR" })).expect("entry"));
    recs.push("TE", parse_roster_entry(&json!({ "NAME": "D", "POS": "TE" })).expect("entry"));
    recs.push("WR", parse_roster_entry(&json!({ "NAME": "E", "POS": "WR" })).expect("entry"));

    let mut view = RosterView::from_bundle(
        "L",
        RosterBundle {
            entries: lineup,
            free_agents: recs,
        },
    );
    assert_eq!(view.row_count(), 5);
    let names: Vec<&str> = (0..5)
        .filter_map(|i| view.row(i))
        .map(|r| r.entry.name.as_str())
        .collect();
    assert_eq!(names, vec!["A", "B", "C", "E", "D"]);
    assert!(view.row(5).is_none());

    view.row_mut(4).expect("row 4").set_threshold(3.0);
    assert_eq!(view.free_agents[1].rows[0].threshold, 3.0);
}
