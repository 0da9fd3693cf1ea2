pub mod loader;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use loader::{load_snapshot, resolve_snapshot_path, LoadError, SnapshotFormat};

/// A single telemetry observation for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// e.g. "emea"
    pub region: String,
    /// Measured round-trip latency in milliseconds
    pub latency_ms: f64,
    /// Fraction or percentage; averaged as-is
    pub uptime: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Per-region overview served by `GET /api/regions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSummary {
    pub region: String,
    pub samples: usize,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
}

// ─── Store ───────────────────────────────────────────────────────

/// Immutable, region-partitioned snapshot of telemetry.
///
/// Built once at startup and shared behind an `Arc`; there is no way to
/// mutate it after construction, so concurrent readers never need a lock.
#[derive(Debug, Default)]
pub struct TelemetryStore {
    /// Regions in order of first appearance
    regions: Vec<String>,
    by_region: HashMap<String, Vec<Sample>>,
    total: usize,
}

impl TelemetryStore {
    /// Build a store from already-parsed samples.
    ///
    /// Rejects empty region ids and non-finite numbers so the engine never
    /// sees them. Insertion order is kept within each region.
    pub fn from_samples<I>(samples: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = Sample>,
    {
        let mut store = Self::default();

        for (index, sample) in samples.into_iter().enumerate() {
            if sample.region.trim().is_empty() {
                return Err(LoadError::EmptyRegion { index });
            }
            for (field, value) in [("latency_ms", sample.latency_ms), ("uptime", sample.uptime)] {
                if !value.is_finite() {
                    return Err(LoadError::NonFinite { index, field });
                }
            }

            if !store.by_region.contains_key(&sample.region) {
                store.regions.push(sample.region.clone());
            }
            store
                .by_region
                .entry(sample.region.clone())
                .or_default()
                .push(sample);
            store.total += 1;
        }

        Ok(store)
    }

    /// Samples for `region` in snapshot order; empty if the region is unknown.
    pub fn samples_for(&self, region: &str) -> &[Sample] {
        self.by_region
            .get(region)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Sample count and observed time range for a known region.
    pub fn summary(&self, region: &str) -> Option<RegionSummary> {
        let samples = self.by_region.get(region)?;
        let stamps = samples.iter().filter_map(|s| s.timestamp);

        Some(RegionSummary {
            region: region.to_owned(),
            samples: samples.len(),
            first_seen: stamps.clone().min(),
            last_seen: stamps.max(),
        })
    }

    pub fn summaries(&self) -> Vec<RegionSummary> {
        self.regions
            .iter()
            .filter_map(|r| self.summary(r))
            .collect()
    }
}
