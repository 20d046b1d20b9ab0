//! Training-table preparation stages

pub mod coords;
pub mod finalize;
pub mod join;
pub mod neighbors;
pub mod runner;
pub mod smoothing;
pub mod time;

pub use finalize::TrainingRecord;
pub use neighbors::{select_top_neighbors, NeighborCandidate};
pub use runner::{BatchRunner, PreparationResults, ScenarioPipeline, ScenarioStats};
