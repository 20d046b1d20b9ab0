//! UE position traces

use crate::error::{PrepError, Result};
use crate::ingest::fields::Columns;
use crate::pipeline::time::Timestamped;
use std::path::Path;
use tracing::debug;

/// Accepted names of the UE id column; `imsi` appears in predicted traces
pub const ID_COLUMNS: &[&str] = &["id", "imsi", "UE (imsi)"];

/// Position of one UE at one timestamp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSample {
    pub timestamp: i64,
    pub imsi: i64,
    pub x: f64,
    pub y: f64,
}

impl Timestamped for PositionSample {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

/// Read a `timestamp, id, x, y` trace
pub fn read_positions(path: &Path) -> Result<Vec<PositionSample>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| PrepError::csv(path, e))?;

    let headers = reader.headers().map_err(|e| PrepError::csv(path, e))?.clone();
    let columns = Columns::new(path, headers);

    let ts_idx = columns.require("timestamp")?;
    let id_idx = columns.require_any(ID_COLUMNS)?;
    let x_idx = columns.require("x")?;
    let y_idx = columns.require("y")?;

    let mut samples = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| PrepError::csv(path, e))?;
        let fields = columns.fields(&record);
        samples.push(PositionSample {
            timestamp: fields.required_int(ts_idx)?,
            imsi: fields.required_int(id_idx)?,
            x: fields.required_float(x_idx)?,
            y: fields.required_float(y_idx)?,
        });
    }

    debug!("{}: {} position samples", path.display(), samples.len());
    Ok(samples)
}
