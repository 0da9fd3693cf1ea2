// Property tests for the aggregation engine.

use proptest::prelude::*;

use region_latency::metrics::{compute_stats, evaluate, RegionReport, Threshold};
use region_latency::telemetry::{Sample, TelemetryStore};

fn to_samples(region: &str, rows: &[(f64, f64)]) -> Vec<Sample> {
    rows.iter()
        .map(|&(latency_ms, uptime)| Sample {
            region: region.into(),
            latency_ms,
            uptime,
            timestamp: None,
        })
        .collect()
}

/// Whole-millisecond latencies keep every sum exact, so reordering must not
/// change a single bit of the means.
fn rows() -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec(
        ((0u32..5_000).prop_map(f64::from), (0u32..=100).prop_map(|u| f64::from(u) / 4.0)),
        1..64,
    )
}

proptest! {
    #[test]
    fn means_are_order_invariant(rows in rows(), seed in any::<u64>()) {
        let mut shuffled = rows.clone();
        // Deterministic rotate + reverse stands in for a shuffle
        let len = shuffled.len();
        shuffled.rotate_left((seed % len as u64) as usize);
        shuffled.reverse();

        let a = compute_stats(&to_samples("r", &rows), Threshold::default());
        let b = compute_stats(&to_samples("r", &shuffled), Threshold::default());
        prop_assert_eq!(a, b);
    }

    #[test]
    fn p95_is_bounded_by_min_and_max(rows in rows()) {
        let RegionReport::Stats(stats) = compute_stats(&to_samples("r", &rows), Threshold::default()) else {
            return Err(TestCaseError::fail("non-empty input produced Absent"));
        };
        let min = rows.iter().map(|r| r.0).fold(f64::INFINITY, f64::min);
        let max = rows.iter().map(|r| r.0).fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(stats.p95_latency >= min && stats.p95_latency <= max);
        prop_assert!(stats.breaches as usize <= rows.len());
    }

    #[test]
    fn breaches_match_strict_count(rows in rows(), threshold in -10.0f64..6_000.0) {
        let report = compute_stats(&to_samples("r", &rows), Threshold::new(threshold).unwrap());
        let expected = rows.iter().filter(|r| r.0 > threshold).count() as u64;
        prop_assert_eq!(report.stats().unwrap().breaches, expected);
    }

    #[test]
    fn other_regions_never_affect_a_region(own in rows(), noise in rows()) {
        let alone = TelemetryStore::from_samples(to_samples("own", &own)).unwrap();
        let mut mixed = to_samples("noise", &noise);
        mixed.extend(to_samples("own", &own));
        let mixed = TelemetryStore::from_samples(mixed).unwrap();

        let a = evaluate(&alone, &["own"], 180.0).unwrap();
        let b = evaluate(&mixed, &["own"], 180.0).unwrap();
        prop_assert_eq!(a, b);
    }
}
