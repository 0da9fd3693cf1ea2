use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::config::AbsentPolicy;
use crate::metrics::{self, RegionReport};
use crate::AppState;

use super::AppError;

// ─── Request / response types ────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct LatencyQuery {
    #[serde(default)]
    pub regions: Vec<String>,

    /// Kept loose so a non-numeric value becomes a 400 with a clear
    /// message instead of a generic body rejection. `null` means unset.
    #[serde(default)]
    pub threshold_ms: Option<Value>,
}

/// Wire shape of one region. Absent regions serialize with null
/// aggregates and zero breaches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionBody {
    pub avg_latency: Option<f64>,
    pub p95_latency: Option<f64>,
    pub avg_uptime: Option<f64>,
    pub breaches: u64,
}

impl From<&RegionReport> for RegionBody {
    fn from(report: &RegionReport) -> Self {
        match report {
            RegionReport::Stats(s) => Self {
                avg_latency: Some(s.avg_latency),
                p95_latency: Some(s.p95_latency),
                avg_uptime: Some(s.avg_uptime),
                breaches: s.breaches,
            },
            RegionReport::Absent => Self {
                avg_latency: None,
                p95_latency: None,
                avg_uptime: None,
                breaches: 0,
            },
        }
    }
}

pub type LatencyResponse = IndexMap<String, RegionBody>;

// ─── POST / and POST /latency ────────────────────────────────────

pub async fn check_latency(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LatencyQuery>, JsonRejection>,
) -> Result<Json<LatencyResponse>, AppError> {
    let Json(query) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let threshold_ms = resolve_threshold(query.threshold_ms.as_ref(), state.default_threshold_ms)?;

    let evaluation = metrics::evaluate(&state.store, query.regions.as_slice(), threshold_ms)?;

    let body: LatencyResponse = evaluation
        .iter()
        .filter(|(_, report)| !(state.absent == AbsentPolicy::Omit && report.is_absent()))
        .map(|(region, report)| (region.clone(), RegionBody::from(report)))
        .collect();

    Ok(Json(body))
}

// ─── Helpers ─────────────────────────────────────────────────────

fn resolve_threshold(raw: Option<&Value>, default_ms: f64) -> Result<f64, AppError> {
    match raw {
        None | Some(Value::Null) => Ok(default_ms),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| AppError::BadRequest("threshold_ms is out of range".into())),
        Some(other) => Err(AppError::BadRequest(format!(
            "threshold_ms must be a number, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn threshold_defaults_when_missing_or_null() {
        assert_eq!(resolve_threshold(None, 180.0).unwrap(), 180.0);
        assert_eq!(resolve_threshold(Some(&Value::Null), 150.0).unwrap(), 150.0);
    }

    #[test]
    fn integer_threshold_is_accepted() {
        assert_eq!(resolve_threshold(Some(&json!(200)), 180.0).unwrap(), 200.0);
        assert_eq!(resolve_threshold(Some(&json!(-5.5)), 180.0).unwrap(), -5.5);
    }

    #[test]
    fn string_threshold_is_rejected() {
        let err = resolve_threshold(Some(&json!("fast")), 180.0).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn absent_body_has_null_aggregates() {
        let body = RegionBody::from(&RegionReport::Absent);
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({
                "avg_latency": null,
                "p95_latency": null,
                "avg_uptime": null,
                "breaches": 0
            })
        );
    }
}
