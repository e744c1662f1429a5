use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use ff_lineup_terminal::backend_fetch::{parse_catalog_json, parse_roster_json};
use ff_lineup_terminal::demo_backend::demo_league_json;
use ff_lineup_terminal::lineup::RosterView;
use ff_lineup_terminal::percentiles::{PercentileTable, probability_at_least};
use ff_lineup_terminal::roster::RosterPayload;
use ff_lineup_terminal::tiers::color_for;

fn dense_table() -> PercentileTable {
    (0..=100u8)
        .map(|p| (p, f64::from(p) * 0.31 + 2.0))
        .collect()
}

fn bench_roster_parse(c: &mut Criterion) {
    c.bench_function("roster_parse", |b| {
        b.iter(|| {
            let payload = parse_roster_json(black_box(LEAGUE_DATA_JSON)).unwrap();
            black_box(payload);
        })
    });
}

fn bench_demo_roster_view(c: &mut Criterion) {
    let raw = demo_league_json("Work League").to_string();
    c.bench_function("demo_roster_view", |b| {
        b.iter(|| {
            let RosterPayload::Embedded(bundle) = parse_roster_json(black_box(&raw)).unwrap()
            else {
                return;
            };
            let view = RosterView::from_bundle("Work League", bundle);
            black_box(view.row_count());
        })
    });
}

fn bench_catalog_parse(c: &mut Criterion) {
    c.bench_function("catalog_parse", |b| {
        b.iter(|| {
            let catalog = parse_catalog_json(black_box(CATALOG_JSON)).unwrap();
            black_box(catalog.len());
        })
    });
}

fn bench_probability_sweep(c: &mut Criterion) {
    let table = dense_table();
    c.bench_function("probability_sweep", |b| {
        b.iter(|| {
            let mut total = 0.0;
            for step in 0..=40 {
                let threshold = f64::from(step);
                total += probability_at_least(black_box(&table), threshold).unwrap_or(0.0);
            }
            black_box(total);
        })
    });
}

fn bench_tier_colors(c: &mut Criterion) {
    let ranks = ["1", "4", "10", "11", "Unranked", "", "7th"];
    c.bench_function("tier_colors", |b| {
        b.iter(|| {
            for rank in ranks {
                black_box(color_for(black_box(Some(rank))));
            }
        })
    });
}

criterion_group!(
    perf,
    bench_roster_parse,
    bench_demo_roster_view,
    bench_catalog_parse,
    bench_probability_sweep,
    bench_tier_colors
);
criterion_main!(perf);

static LEAGUE_DATA_JSON: &str = include_str!("../tests/fixtures/league_data_embedded.json");
static CATALOG_JSON: &str = include_str!("../tests/fixtures/league_catalog.json");
