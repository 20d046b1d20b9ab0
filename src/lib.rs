//! RAN Trace Preparation
//!
//! Turns per-cell measurement logs and UE position traces from network
//! simulations into smoothed training tables, and evaluates predicted UE
//! trajectories against the recorded ones.

pub mod analytics;
pub mod config;
pub mod error;
pub mod ingest;
pub mod pipeline;

pub use config::{CellCoordinates, ComparisonConfig, PipelineConfig};
pub use error::PrepError;
pub use pipeline::runner::{BatchRunner, ScenarioPipeline};
pub use analytics::comparison::run_comparison;
