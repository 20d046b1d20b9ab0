//! Measurement / position join

use crate::ingest::position::PositionSample;
use crate::pipeline::neighbors::SelectedMeasurement;
use crate::pipeline::time::Rebased;
use std::collections::HashMap;

/// A measurement with the UE position recorded at the same relative time
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    pub measurement: SelectedMeasurement,
    pub position: Option<(f64, f64)>,
}

impl JoinedRow {
    pub fn imsi(&self) -> i64 {
        self.measurement.imsi
    }

    pub fn relative_timestamp(&self) -> i64 {
        self.measurement.relative_timestamp
    }
}

/// Left join on (relative timestamp, UE id).
///
/// A measurement matching several samples is repeated once per match, in
/// trace order. The result is stably ordered by (UE id, relative timestamp).
pub fn left_join_positions(
    measurements: Vec<SelectedMeasurement>,
    positions: &[Rebased<PositionSample>],
) -> Vec<JoinedRow> {
    let mut index: HashMap<(i64, i64), Vec<(f64, f64)>> = HashMap::new();
    for sample in positions {
        index
            .entry((sample.relative_timestamp, sample.record.imsi))
            .or_default()
            .push((sample.record.x, sample.record.y));
    }

    let mut joined = Vec::with_capacity(measurements.len());
    for measurement in measurements {
        match index.get(&(measurement.relative_timestamp, measurement.imsi)) {
            Some(matches) => {
                for &position in matches {
                    joined.push(JoinedRow {
                        measurement: measurement.clone(),
                        position: Some(position),
                    });
                }
            }
            None => joined.push(JoinedRow {
                measurement,
                position: None,
            }),
        }
    }

    joined.sort_by_key(|row| (row.imsi(), row.relative_timestamp()));
    joined
}
