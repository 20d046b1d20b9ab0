//! Neighbor-cell selection
//!
//! Keeps the strongest valid neighbor candidates of each measurement row and
//! drops rows that do not report enough of them.

use crate::ingest::measurement::{MeasurementRow, NeighborSlot};
use crate::pipeline::time::Rebased;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// A neighbor cell that passed validation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeighborCandidate {
    pub cell_id: i64,
    pub signal: f64,
}

impl NeighborCandidate {
    /// Valid iff the id is present and positive and the signal is present
    pub fn from_slot(slot: &NeighborSlot) -> Option<Self> {
        match (slot.cell_id, slot.signal) {
            (Some(cell_id), Some(signal)) if cell_id > 0 => Some(Self { cell_id, signal }),
            _ => None,
        }
    }
}

/// Measurement row after neighbor selection
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedMeasurement {
    pub relative_timestamp: i64,
    pub imsi: i64,
    pub serving_cell: Option<i64>,
    pub serving_signal: Option<f64>,
    /// Exactly `count` neighbors, strongest first
    pub neighbors: Vec<NeighborCandidate>,
}

/// Pick the `count` strongest valid candidates, or `None` if fewer qualify.
///
/// Ties keep slot order (stable sort on descending signal).
pub fn select_top_neighbors(slots: &[NeighborSlot], count: usize) -> Option<Vec<NeighborCandidate>> {
    let mut candidates: Vec<NeighborCandidate> =
        slots.iter().filter_map(NeighborCandidate::from_slot).collect();

    if candidates.len() < count {
        return None;
    }

    candidates.sort_by(|a, b| b.signal.partial_cmp(&a.signal).unwrap_or(Ordering::Equal));
    candidates.truncate(count);
    Some(candidates)
}

/// Apply selection to every row, keeping input order
pub fn select_neighbors(rows: &[Rebased<MeasurementRow>], count: usize) -> Vec<SelectedMeasurement> {
    let selected: Vec<SelectedMeasurement> = rows
        .iter()
        .filter_map(|row| {
            let neighbors = select_top_neighbors(&row.record.neighbors, count)?;
            Some(SelectedMeasurement {
                relative_timestamp: row.relative_timestamp,
                imsi: row.record.imsi,
                serving_cell: row.record.serving_cell,
                serving_signal: row.record.serving_signal,
                neighbors,
            })
        })
        .collect();

    debug!(
        "Neighbor selection kept {}/{} rows (>= {} valid neighbors)",
        selected.len(),
        rows.len(),
        count
    );
    selected
}
