use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::metrics::DEFAULT_THRESHOLD_MS;
use crate::telemetry::SnapshotFormat;

/// How regions without samples appear in a query response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AbsentPolicy {
    /// Include the region with null aggregates and zero breaches
    #[default]
    Null,
    /// Leave the region out of the response entirely
    Omit,
}

#[derive(Debug, Parser)]
#[command(
    name = "region-latency",
    version,
    about = "Per-region latency and uptime aggregation over a telemetry snapshot",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Errors only; overrides RUST_LOG
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Command>,

    /// `serve` options, accepted without the subcommand name
    #[command(flatten)]
    pub serve: ServeArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load a snapshot and serve aggregation queries over HTTP
    Serve(ServeArgs),
    /// Write a deterministic synthetic snapshot
    Generate(GenerateArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Snapshot file; defaults to the first of telemetry.json,
    /// telemetry.jsonl, data/telemetry.jsonl that exists
    #[arg(short, long, env = "TELEMETRY_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = SnapshotFormat::Auto)]
    pub format: SnapshotFormat,

    #[arg(short, long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind: String,

    /// Threshold used when a query omits threshold_ms
    #[arg(long, default_value_t = DEFAULT_THRESHOLD_MS, value_parser = parse_threshold)]
    pub default_threshold: f64,

    #[arg(long, value_enum, default_value_t = AbsentPolicy::Null)]
    pub absent: AbsentPolicy,
}

#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    #[arg(short, long)]
    pub out: PathBuf,

    #[arg(short = 'n', long, default_value_t = 200)]
    pub samples_per_region: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(short, long, value_enum, default_value_t = SnapshotFormat::Auto)]
    pub format: SnapshotFormat,

    #[arg(short, long, value_delimiter = ',', default_value = "amer,apac,emea")]
    pub regions: Vec<String>,
}

impl Cli {
    /// The subcommand to run, with bare invocation meaning `serve`.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve(self.serve))
    }
}

fn parse_threshold(raw: &str) -> Result<f64, String> {
    let ms: f64 = raw.parse().map_err(|e| format!("{e}"))?;
    if !ms.is_finite() {
        return Err(format!("threshold must be finite, got {raw}"));
    }
    Ok(ms)
}
