use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{Sample, TelemetryStore};

// ─── Configuration ───────────────────────────────────────────────

/// Tried in order when no snapshot path is configured.
pub const DEFAULT_SNAPSHOT_PATHS: &[&str] =
    &["telemetry.json", "telemetry.jsonl", "data/telemetry.jsonl"];

// ─── Errors ──────────────────────────────────────────────────────

/// Everything that can go wrong while building the store.
/// All of these are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed snapshot {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed snapshot {path}: {detail}")]
    Shape { path: PathBuf, detail: String },

    #[error("malformed snapshot {path}, record {index}: {source}")]
    Record {
        path: PathBuf,
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed snapshot {path}, region '{key}' record {index}: {source}")]
    KeyedRecord {
        path: PathBuf,
        key: String,
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed snapshot {path} at line {line}: {source}")]
    JsonLine {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("record {index} has no region")]
    MissingRegion { index: usize },

    #[error("record {index} has an empty region")]
    EmptyRegion { index: usize },

    #[error("record {index} has a non-finite {field}")]
    NonFinite { index: usize, field: &'static str },

    #[error("record under key '{key}' is tagged with region '{region}'")]
    RegionMismatch { key: String, region: String },

    #[error("no telemetry snapshot found (tried: {})", tried.join(", "))]
    NotFound { tried: Vec<String> },
}

/// On-disk layout of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SnapshotFormat {
    /// Pick from the file extension
    #[default]
    Auto,
    /// One JSON document: array of records, or object keyed by region
    Json,
    /// Newline-delimited records
    Jsonl,
}

impl SnapshotFormat {
    /// Replace `Auto` with the layout implied by the file extension.
    pub fn resolve(self, path: &Path) -> Self {
        match self {
            Self::Auto => match path.extension().and_then(|e| e.to_str()) {
                Some("jsonl") | Some("ndjson") => Self::Jsonl,
                _ => Self::Json,
            },
            other => other,
        }
    }
}

// ─── Wire records ────────────────────────────────────────────────

/// A record as it appears on disk. `region` is optional because the
/// keyed-object layout carries it in the key instead. Unknown fields are
/// ignored.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    region: Option<String>,
    latency_ms: f64,
    uptime: f64,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    timestamp: Option<DateTime<Utc>>,
}

/// Accepts RFC 3339 strings or integer epoch seconds. Anything else is
/// dropped with a warning; the timestamp never fails a load.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| parse_timestamp(&v)))
}

fn parse_timestamp(raw: &Value) -> Option<DateTime<Utc>> {
    let parsed = match raw {
        Value::Null => return None,
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)),
        _ => None,
    };
    if parsed.is_none() {
        warn!(timestamp = %raw, "ignoring unparseable timestamp");
    }
    parsed
}

impl RawRecord {
    fn into_sample(self, index: usize) -> Result<Sample, LoadError> {
        let region = self.region.ok_or(LoadError::MissingRegion { index })?;
        Ok(Sample {
            region,
            latency_ms: self.latency_ms,
            uptime: self.uptime,
            timestamp: self.timestamp,
        })
    }
}

// ─── Public entry points ─────────────────────────────────────────

/// Pick the snapshot to load: the configured path if any, otherwise the
/// first default candidate that exists in the working directory.
pub fn resolve_snapshot_path(configured: Option<&Path>) -> Result<PathBuf, LoadError> {
    resolve_in(Path::new(""), configured)
}

fn resolve_in(base: &Path, configured: Option<&Path>) -> Result<PathBuf, LoadError> {
    if let Some(path) = configured {
        return Ok(path.to_path_buf());
    }

    DEFAULT_SNAPSHOT_PATHS
        .iter()
        .map(|candidate| base.join(candidate))
        .find(|p| p.is_file())
        .ok_or_else(|| LoadError::NotFound {
            tried: DEFAULT_SNAPSHOT_PATHS.iter().map(|s| s.to_string()).collect(),
        })
}

/// Read and validate a snapshot file into a `TelemetryStore`.
pub fn load_snapshot(path: &Path, format: SnapshotFormat) -> Result<TelemetryStore, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let format = format.resolve(path);
    debug!(path = %path.display(), ?format, bytes = text.len(), "parsing snapshot");

    let samples = match format {
        SnapshotFormat::Jsonl => parse_lines(path, &text)?,
        _ => parse_document(path, &text)?,
    };

    let store = TelemetryStore::from_samples(samples)?;
    info!(
        path = %path.display(),
        samples = store.len(),
        regions = store.regions().len(),
        "telemetry snapshot loaded"
    );
    Ok(store)
}

// ─── Parsers ─────────────────────────────────────────────────────

/// Parse a whole-document snapshot. Records are decoded one at a time so a
/// bad record is reported with its position.
fn parse_document(path: &Path, text: &str) -> Result<Vec<Sample>, LoadError> {
    let doc: Value = serde_json::from_str(text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    match doc {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let record: RawRecord =
                    serde_json::from_value(item).map_err(|source| LoadError::Record {
                        path: path.to_path_buf(),
                        index,
                        source,
                    })?;
                record.into_sample(index)
            })
            .collect(),
        Value::Object(map) => {
            let mut out = Vec::new();
            for (key, entries) in map {
                let Value::Array(items) = entries else {
                    return Err(LoadError::Shape {
                        path: path.to_path_buf(),
                        detail: format!("region '{key}' must map to an array of records"),
                    });
                };
                for (index, item) in items.into_iter().enumerate() {
                    let mut record: RawRecord = match serde_json::from_value(item) {
                        Ok(record) => record,
                        Err(source) => {
                            return Err(LoadError::KeyedRecord {
                                path: path.to_path_buf(),
                                key,
                                index,
                                source,
                            })
                        }
                    };
                    if let Some(tagged) = record.region.as_deref() {
                        if tagged != key {
                            return Err(LoadError::RegionMismatch {
                                region: tagged.to_owned(),
                                key,
                            });
                        }
                    }
                    record.region = Some(key.clone());
                    let position = out.len();
                    out.push(record.into_sample(position)?);
                }
            }
            Ok(out)
        }
        _ => Err(LoadError::Shape {
            path: path.to_path_buf(),
            detail: "expected an array of records or an object keyed by region".into(),
        }),
    }
}

fn parse_lines(path: &Path, text: &str) -> Result<Vec<Sample>, LoadError> {
    let mut out = Vec::new();

    for (n, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: RawRecord =
            serde_json::from_str(line).map_err(|source| LoadError::JsonLine {
                path: path.to_path_buf(),
                line: n + 1,
                source,
            })?;
        let index = out.len();
        out.push(record.into_sample(index)?);
    }

    Ok(out)
}
