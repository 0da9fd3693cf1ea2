use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use region_latency::config::{Cli, Command, GenerateArgs, ServeArgs};
use region_latency::telemetry::{load_snapshot, resolve_snapshot_path};
use region_latency::{mock_data, observability, server, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    observability::init_logging(cli.verbose, cli.quiet)?;

    match cli.into_command() {
        Command::Serve(args) => serve(args).await,
        Command::Generate(args) => generate(args),
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    // ── 1. Load the snapshot (fatal on any error) ────────────────
    let path = resolve_snapshot_path(args.snapshot.as_deref())?;
    let store = load_snapshot(&path, args.format)
        .with_context(|| format!("refusing to start without telemetry from {}", path.display()))?;
    if store.is_empty() {
        warn!(path = %path.display(), "snapshot contains no samples; every region will be absent");
    }

    // ── 2. Build shared state ────────────────────────────────────
    let mut state = AppState::new(store);
    state.default_threshold_ms = args.default_threshold;
    state.absent = args.absent;

    // ── 3. Build Axum router ─────────────────────────────────────
    let app = server::create_router(Arc::new(state));

    // ── 4. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;

    info!(
        addr = %listener.local_addr()?,
        default_threshold_ms = args.default_threshold,
        absent = ?args.absent,
        "server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server exited with error")?;

    info!("server stopped");
    Ok(())
}

fn generate(args: GenerateArgs) -> Result<()> {
    let samples = mock_data::generate(&args.regions, args.samples_per_region, args.seed);
    mock_data::write_snapshot(&args.out, &samples, args.format)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for ctrl-c; shutting down");
    }
}
