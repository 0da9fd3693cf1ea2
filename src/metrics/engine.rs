use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use super::percentiles;
use crate::telemetry::{Sample, TelemetryStore};

// ─── Configuration ───────────────────────────────────────────────

/// Threshold applied when a query does not carry one.
pub const DEFAULT_THRESHOLD_MS: f64 = 180.0;

/// Percentile reported as `p95_latency`.
const TAIL_PERCENTILE: f64 = 95.0;

// ─── Public types ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// A latency threshold that is known to be finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold(f64);

impl Threshold {
    pub fn new(ms: f64) -> Result<Self, EngineError> {
        if !ms.is_finite() {
            return Err(EngineError::InvalidInput(format!(
                "threshold_ms must be a finite number, got {ms}"
            )));
        }
        Ok(Self(ms))
    }

    pub fn ms(self) -> f64 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLD_MS)
    }
}

/// Aggregates for one region under one threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stats {
    pub avg_latency: f64,
    pub p95_latency: f64,
    pub avg_uptime: f64,
    /// Samples with latency strictly above the threshold
    pub breaches: u64,
}

/// Outcome for a single requested region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegionReport {
    Stats(Stats),
    /// The region has no samples in the snapshot
    Absent,
}

impl RegionReport {
    pub fn stats(&self) -> Option<&Stats> {
        match self {
            Self::Stats(s) => Some(s),
            Self::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// Region → report, in first-occurrence order of the request.
pub type Evaluation = IndexMap<String, RegionReport>;

// ─── Engine ──────────────────────────────────────────────────────

/// Compute the four aggregates over one region's samples.
///
/// Latency and uptime are read from the same samples, so the two series
/// stay aligned. An empty slice yields `RegionReport::Absent`.
pub fn compute_stats(samples: &[Sample], threshold: Threshold) -> RegionReport {
    if samples.is_empty() {
        return RegionReport::Absent;
    }

    let mut latencies: Vec<f64> = samples.iter().map(|s| s.latency_ms).collect();
    let uptimes: Vec<f64> = samples.iter().map(|s| s.uptime).collect();

    let breaches = latencies.iter().filter(|&&l| l > threshold.ms()).count() as u64;

    latencies.sort_by(f64::total_cmp);

    // `samples` is non-empty here, so all three are Some.
    let (Some(avg_latency), Some(avg_uptime), Some(p95_latency)) = (
        percentiles::mean(&latencies),
        percentiles::mean(&uptimes),
        percentiles::percentile_sorted(&latencies, TAIL_PERCENTILE),
    ) else {
        return RegionReport::Absent;
    };

    RegionReport::Stats(Stats {
        avg_latency,
        p95_latency,
        avg_uptime,
        breaches,
    })
}

/// Evaluate every requested region independently against the store.
///
/// Unknown regions come back as `Absent`. A region requested more than once
/// is computed each time and occupies a single entry; the store is
/// immutable, so repeated computations are identical.
pub fn evaluate<S: AsRef<str>>(
    store: &TelemetryStore,
    regions: &[S],
    threshold_ms: f64,
) -> Result<Evaluation, EngineError> {
    let threshold = Threshold::new(threshold_ms)?;
    debug!(regions = regions.len(), threshold_ms, "evaluating query");

    let mut out = Evaluation::with_capacity(regions.len());
    for region in regions {
        let region = region.as_ref();
        let report = compute_stats(store.samples_for(region), threshold);
        out.insert(region.to_owned(), report);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(region: &str, latencies: &[f64]) -> Vec<Sample> {
        latencies
            .iter()
            .enumerate()
            .map(|(i, &latency_ms)| Sample {
                region: region.into(),
                latency_ms,
                uptime: if i % 2 == 0 { 0.99 } else { 0.97 },
                timestamp: None,
            })
            .collect()
    }

    fn stats(report: RegionReport) -> Stats {
        *report.stats().expect("expected stats")
    }

    fn store() -> TelemetryStore {
        let mut all = samples("emea", &[100.0, 180.0, 181.0, 300.0]);
        all.extend(samples("apac", &[10.0, 20.0, 30.0, 40.0]));
        TelemetryStore::from_samples(all).unwrap()
    }

    #[test]
    fn empty_samples_are_absent() {
        assert_eq!(compute_stats(&[], Threshold::default()), RegionReport::Absent);
    }

    #[test]
    fn threshold_boundary_is_exclusive() {
        let s = stats(compute_stats(
            &samples("emea", &[100.0, 180.0, 181.0, 300.0]),
            Threshold::new(180.0).unwrap(),
        ));
        assert_eq!(s.breaches, 2);
    }

    #[test]
    fn negative_threshold_counts_every_positive_latency() {
        let s = stats(compute_stats(
            &samples("emea", &[0.5, 12.0, 250.0]),
            Threshold::new(-1.0).unwrap(),
        ));
        assert_eq!(s.breaches, 3);
    }

    #[test]
    fn computes_all_four_aggregates() {
        let s = stats(compute_stats(
            &samples("apac", &[10.0, 20.0, 30.0, 40.0]),
            Threshold::new(25.0).unwrap(),
        ));
        assert_eq!(s.avg_latency, 25.0);
        assert!((s.p95_latency - 38.5).abs() < 1e-9);
        assert!((s.avg_uptime - 0.98).abs() < 1e-12);
        assert_eq!(s.breaches, 2);
    }

    #[test]
    fn single_sample_region() {
        let s = stats(compute_stats(&samples("amer", &[77.0]), Threshold::default()));
        assert_eq!(s.avg_latency, 77.0);
        assert_eq!(s.p95_latency, 77.0);
        assert_eq!(s.breaches, 0);
    }

    #[test]
    fn extreme_latencies_stay_finite() {
        let s = stats(compute_stats(&samples("emea", &[1e308, 1e308]), Threshold::default()));
        assert_eq!(s.avg_latency, 1e308);
        assert_eq!(s.p95_latency, 1e308);
        assert_eq!(s.breaches, 2);
    }

    #[test]
    fn non_finite_threshold_is_invalid_input() {
        let store = store();
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = evaluate(&store, &["emea"], bad).unwrap_err();
            assert!(matches!(err, EngineError::InvalidInput(_)));
        }
    }

    #[test]
    fn unknown_region_is_isolated() {
        let result = evaluate(&store(), &["emea", "mars"], 180.0).unwrap();
        assert!(result["mars"].is_absent());
        assert_eq!(result["emea"].stats().unwrap().breaches, 2);
    }

    #[test]
    fn regions_do_not_leak_into_each_other() {
        let result = evaluate(&store(), &["apac"], 180.0).unwrap();
        let apac = result["apac"].stats().unwrap();
        assert_eq!(apac.avg_latency, 25.0);
        assert_eq!(apac.breaches, 0);
    }

    #[test]
    fn empty_request_gives_empty_result() {
        let result = evaluate::<&str>(&store(), &[], 180.0).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn duplicate_regions_collapse_to_one_entry() {
        let store = store();
        let single = evaluate(&store, &["emea"], 180.0).unwrap();
        let dup = evaluate(&store, &["emea", "apac", "emea"], 180.0).unwrap();

        assert_eq!(dup.len(), 2);
        assert_eq!(dup.keys().collect::<Vec<_>>(), ["emea", "apac"]);
        assert_eq!(dup["emea"], single["emea"]);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let store = store();
        let a = evaluate(&store, &["emea", "apac"], 150.0).unwrap();
        let b = evaluate(&store, &["emea", "apac"], 150.0).unwrap();
        for (region, report) in &a {
            let (x, y) = (report.stats().unwrap(), b[region].stats().unwrap());
            assert_eq!(x.avg_latency.to_bits(), y.avg_latency.to_bits());
            assert_eq!(x.p95_latency.to_bits(), y.p95_latency.to_bits());
            assert_eq!(x.avg_uptime.to_bits(), y.avg_uptime.to_bits());
            assert_eq!(x.breaches, y.breaches);
        }
    }
}
