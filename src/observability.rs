use anyhow::Result;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "region_latency=info,tower_http=warn";
const VERBOSE_FILTER: &str = "region_latency=debug,tower_http=debug,info";

/// Install the global tracing subscriber.
///
/// `quiet` forces error-only output even if RUST_LOG is set. Otherwise
/// RUST_LOG wins over the flag-derived default.
pub fn init_logging(verbose: bool, quiet: bool) -> Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::try_from_default_env()?
    } else if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::new(DEFAULT_FILTER)
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(!quiet)
        .with_thread_ids(verbose)
        .with_line_number(verbose);

    // Already initialized is fine (tests install their own)
    if tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
    {
        debug!("logging initialized");
    }
    Ok(())
}
