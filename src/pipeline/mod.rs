//! Pipeline entry points for ingestion and forecasting.
//!
//! - `run_refresh`: one fan-out fetch + materialization cycle
//! - `Scheduler`: the repeating timer driving scheduled cycles
//! - `build_context` / `PredictionEngine`: forecast generation
//! - `compute_status`: the derived system-health view

pub mod context;
pub mod materialize;
pub mod predict;
pub mod refresh;
pub mod scheduler;
pub mod status;

pub use context::{EnvironmentInputs, PredictionContext, build_context};
pub use materialize::storms_from_features;
pub use predict::{PredictionEngine, Trend, TrendAssessment};
pub use refresh::{RefreshOutcome, run_refresh};
pub use scheduler::Scheduler;
pub use status::compute_status;
