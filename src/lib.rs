//! Per-region latency and uptime aggregation over an immutable telemetry
//! snapshot, served over HTTP.

use std::sync::Arc;

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod mock_data;
pub mod observability;
pub mod server;
pub mod telemetry;

use config::AbsentPolicy;
use telemetry::TelemetryStore;

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Snapshot loaded at startup; read-only from here on.
    pub store: Arc<TelemetryStore>,

    /// Applied when a query omits `threshold_ms`.
    pub default_threshold_ms: f64,

    /// Whether regions without data are reported or dropped.
    pub absent: AbsentPolicy,
}

impl AppState {
    pub fn new(store: TelemetryStore) -> Self {
        Self {
            store: Arc::new(store),
            default_threshold_ms: metrics::DEFAULT_THRESHOLD_MS,
            absent: AbsentPolicy::default(),
        }
    }
}
