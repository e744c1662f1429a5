use std::collections::BTreeMap;

/// Upper bound for a threshold control when the table has no 100th bucket.
pub const DEFAULT_THRESHOLD_UPPER_BOUND: f64 = 50.0;
pub const MAX_BUCKET: u8 = 100;

/// Simulated outcome distribution: percentile bucket (0..=100) -> projected points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PercentileTable {
    buckets: BTreeMap<u8, f64>,
}

impl PercentileTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignores buckets above 100 and non-finite values.
    pub fn insert(&mut self, bucket: u8, points: f64) -> bool {
        if bucket > MAX_BUCKET || !points.is_finite() {
            return false;
        }
        self.buckets.insert(bucket, points);
        true
    }

    pub fn get(&self, bucket: u8) -> Option<f64> {
        self.buckets.get(&bucket).copied()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, f64)> + '_ {
        self.buckets.iter().map(|(bucket, points)| (*bucket, *points))
    }

    /// Whether points never decrease as the percentile rises.
    pub fn is_monotonic(&self) -> bool {
        self.buckets
            .values()
            .zip(self.buckets.values().skip(1))
            .all(|(lo, hi)| lo <= hi)
    }

    pub fn threshold_upper_bound(&self) -> f64 {
        threshold_upper_bound(self)
    }

    pub fn probability_at_least(&self, threshold: f64) -> Option<f64> {
        probability_at_least(self, threshold)
    }
}

impl FromIterator<(u8, f64)> for PercentileTable {
    fn from_iter<I: IntoIterator<Item = (u8, f64)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (bucket, points) in iter {
            table.insert(bucket, points);
        }
        table
    }
}

/// Probability of scoring at least `threshold`.
///
/// Takes the largest percentile whose simulated value is strictly below the
/// threshold (0 when none is) and returns `(100 - p) / 100`. `None` means there is
/// no distribution to read, which callers must keep distinct from a 0% estimate.
pub fn probability_at_least(table: &PercentileTable, threshold: f64) -> Option<f64> {
    if table.is_empty() {
        return None;
    }
    let mut by_value: Vec<(u8, f64)> = table.iter().collect();
    by_value.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

    let below = by_value
        .iter()
        .take_while(|(_, points)| *points < threshold)
        .map(|(bucket, _)| *bucket)
        .max()
        .unwrap_or(0);
    Some(f64::from(MAX_BUCKET - below) / 100.0)
}

pub fn threshold_upper_bound(table: &PercentileTable) -> f64 {
    table
        .get(MAX_BUCKET)
        .map(f64::ceil)
        .unwrap_or(DEFAULT_THRESHOLD_UPPER_BOUND)
}

pub fn format_probability(probability: Option<f64>) -> String {
    match probability {
        Some(p) => format!("{:.0}%", p * 100.0),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PercentileTable {
        [(0, 0.0), (50, 10.0), (90, 20.0), (100, 30.0)]
            .into_iter()
            .collect()
    }

    #[test]
    fn insert_rejects_out_of_range() {
        let mut t = PercentileTable::new();
        assert!(!t.insert(101, 3.0));
        assert!(!t.insert(50, f64::NAN));
        assert!(t.insert(50, 3.0));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn threshold_between_buckets_uses_lower_bucket() {
        assert_eq!(probability_at_least(&table(), 15.0), Some(0.5));
        // Equal to a bucket value does not count as below it.
        assert_eq!(probability_at_least(&table(), 10.0), Some(1.0));
        assert_eq!(probability_at_least(&table(), 10.5), Some(0.5));
    }

    #[test]
    fn unsorted_table_uses_largest_percentile_below() {
        let t: PercentileTable = [(0, 5.0), (50, 2.0), (100, 9.0)].into_iter().collect();
        assert!(!t.is_monotonic());
        assert_eq!(probability_at_least(&t, 6.0), Some(0.5));
        assert_eq!(probability_at_least(&t, 3.0), Some(0.5));
    }

    #[test]
    fn upper_bound_rounds_up() {
        let t: PercentileTable = [(100, 27.2)].into_iter().collect();
        assert_eq!(threshold_upper_bound(&t), 28.0);
        let t: PercentileTable = [(90, 27.2)].into_iter().collect();
        assert_eq!(threshold_upper_bound(&t), DEFAULT_THRESHOLD_UPPER_BOUND);
    }

    #[test]
    fn format_keeps_unavailable_distinct() {
        assert_eq!(format_probability(Some(0.0)), "0%");
        assert_eq!(format_probability(None), "n/a");
        assert_eq!(format_probability(Some(0.5)), "50%");
    }
}
