//! Trace file readers

pub mod fields;
pub mod measurement;
pub mod position;

pub use measurement::{load_cell_logs, read_cell_log, MeasurementRow, NeighborSlot};
pub use position::{read_positions, PositionSample};
