use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

/// Tower-compatible middleware that adds three response headers:
///
///   X-Request-Id       : random v4 UUID, also attached to the log line
///   X-Response-Time-Us : total handler wall time in microseconds
///   Server-Timing      : same value in the standard Server-Timing format
pub async fn timing_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let request_id = Uuid::new_v4();

    let start = Instant::now();
    let mut response = next.run(req).await;
    let elapsed = start.elapsed();
    let us = elapsed.as_micros();

    // ── Inject response headers ─────────────────────────────────
    if let Ok(val) = request_id.to_string().parse() {
        response.headers_mut().insert("X-Request-Id", val);
    }
    if let Ok(val) = us.to_string().parse() {
        response.headers_mut().insert("X-Response-Time-Us", val);
    }

    let server_timing =
        format!("total;dur={:.3}", elapsed.as_secs_f64() * 1000.0);
    if let Ok(val) = server_timing.parse() {
        response.headers_mut().insert("Server-Timing", val);
    }

    info!(
        %request_id,
        %method,
        path = %path,
        status = response.status().as_u16(),
        us = us as u64,
        "request served"
    );

    response
}
