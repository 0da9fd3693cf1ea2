use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use tracing::info;

use crate::telemetry::{Sample, SnapshotFormat};

// ─── Constants ───────────────────────────────────────────────────

/// Spacing between consecutive samples of one region.
const SAMPLE_INTERVAL_SECS: i64 = 60;
/// Fraction of samples that land in a latency spike.
const SPIKE_PROBABILITY: f64 = 0.05;
const SPIKE_FACTOR: f64 = 2.5;
/// First generated timestamp (2025-01-15T09:00:00Z).
const START_EPOCH_SECS: i64 = 1_736_931_600;

// ─── Generation ──────────────────────────────────────────────────

/// Build a deterministic snapshot: the same seed and inputs always
/// produce the same samples.
///
/// Each region gets its own base latency; samples jitter around it
/// with occasional spikes, and uptime stays between 0.95 and 1.0.
pub fn generate(regions: &[String], per_region: usize, seed: u64) -> Vec<Sample> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start: DateTime<Utc> = DateTime::from_timestamp(START_EPOCH_SECS, 0).unwrap_or_default();

    let mut out = Vec::with_capacity(regions.len() * per_region);
    for region in regions {
        let base: f64 = rng.gen_range(60.0..160.0);

        for i in 0..per_region {
            let mut latency: f64 = base + rng.gen_range(-25.0..25.0);
            if rng.gen_bool(SPIKE_PROBABILITY) {
                latency *= SPIKE_FACTOR;
            }
            let uptime: f64 = rng.gen_range(0.95..=1.0);

            out.push(Sample {
                region: region.clone(),
                latency_ms: round_to(latency.max(1.0), 1),
                uptime: round_to(uptime, 4),
                timestamp: Some(start + Duration::seconds(SAMPLE_INTERVAL_SECS * i as i64)),
            });
        }
    }
    out
}

/// Write samples to `path` in the requested layout. `Auto` follows the
/// file extension, same as the loader.
pub fn write_snapshot(path: &Path, samples: &[Sample], format: SnapshotFormat) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("cannot create snapshot {}", path.display()))?;
    let mut out = BufWriter::new(file);

    let lines = format.resolve(path) == SnapshotFormat::Jsonl;

    if lines {
        for sample in samples {
            serde_json::to_writer(&mut out, sample)?;
            out.write_all(b"\n")?;
        }
    } else {
        serde_json::to_writer_pretty(&mut out, samples)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    info!(
        path = %path.display(),
        samples = samples.len(),
        jsonl = lines,
        "synthetic snapshot written"
    );
    Ok(())
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::load_snapshot;

    fn regions() -> Vec<String> {
        vec!["amer".into(), "apac".into(), "emea".into()]
    }

    #[test]
    fn same_seed_same_samples() {
        assert_eq!(generate(&regions(), 50, 7), generate(&regions(), 50, 7));
        assert_ne!(generate(&regions(), 50, 7), generate(&regions(), 50, 8));
    }

    #[test]
    fn values_stay_in_range() {
        let samples = generate(&regions(), 300, 42);
        assert_eq!(samples.len(), 900);
        for s in &samples {
            assert!(s.latency_ms >= 1.0);
            assert!((0.95..=1.0).contains(&s.uptime), "{}", s.uptime);
            assert!(s.timestamp.is_some());
        }
    }

    #[test]
    fn written_snapshot_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let samples = generate(&regions(), 20, 1);

        for name in ["snap.json", "snap.jsonl"] {
            let path = dir.path().join(name);
            write_snapshot(&path, &samples, SnapshotFormat::Auto).unwrap();

            let store = load_snapshot(&path, SnapshotFormat::Auto).unwrap();
            assert_eq!(store.len(), samples.len());
            assert_eq!(store.regions(), regions().as_slice());
            assert_eq!(store.samples_for("apac"), &samples[20..40]);
        }
    }
}
