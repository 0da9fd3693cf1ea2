use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::telemetry::RegionSummary;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub samples: usize,
    pub regions: usize,
}

// ─── GET /api/regions ────────────────────────────────────────────

/// Every region in the snapshot with its sample count and time range.
pub async fn list_regions(State(state): State<Arc<AppState>>) -> Json<Vec<RegionSummary>> {
    Json(state.store.summaries())
}

// ─── GET /health ─────────────────────────────────────────────────

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        samples: state.store.len(),
        regions: state.store.regions().len(),
    })
}
