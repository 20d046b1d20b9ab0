//! Trajectory evaluation and result logging

pub mod comparison;
pub mod logger;
pub mod metrics;
pub mod trajectory;

pub use comparison::{run_comparison, ComparisonResults};
pub use logger::ResultsLogger;
pub use metrics::MetricsCalculator;
pub use trajectory::{compare_trajectories, TrajectoryErrors, TrajectoryPoint};
