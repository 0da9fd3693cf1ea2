pub mod engine;
pub mod percentiles;

pub use engine::{
    compute_stats, evaluate, EngineError, Evaluation, RegionReport, Stats, Threshold,
    DEFAULT_THRESHOLD_MS,
};
