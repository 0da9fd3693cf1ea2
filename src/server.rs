use axum::{
    http::Method,
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::timing;
use crate::AppState;

/// Builds the full Axum `Router` with all routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // ── Aggregation queries ─────────────────────────────────
        .route("/", post(handlers::latency::check_latency))
        .route("/latency", post(handlers::latency::check_latency))
        // ── Snapshot introspection ──────────────────────────────
        .route("/api/regions", get(handlers::regions::list_regions))
        .route("/health", get(handlers::regions::health))
        .with_state(state)
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn(timing::timing_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors())
}

/// Any origin may poll; only the verbs the API actually uses.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}
