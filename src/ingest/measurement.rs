//! Per-cell CU-CP measurement logs

use crate::config::PipelineConfig;
use crate::error::{PrepError, Result};
use crate::ingest::fields::Columns;
use crate::pipeline::time::Timestamped;
use std::path::Path;
use tracing::{debug, info};

pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const UE_COLUMN: &str = "UE (imsi)";
pub const SERVING_ID_COLUMN: &str = "L3 serving Id(m_cellId)";
pub const SERVING_SINR_COLUMN: &str = "L3 serving SINR 3gpp";

pub fn neighbor_id_column(slot: usize) -> String {
    format!("L3 neigh Id {} (cellId)", slot)
}

pub fn neighbor_sinr_column(slot: usize) -> String {
    format!("L3 neigh SINR 3gpp {} (convertedSinr)", slot)
}

/// One neighbor slot as reported by the cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborSlot {
    pub cell_id: Option<i64>,
    pub signal: Option<f64>,
}

/// One cell's report for one UE at one absolute timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRow {
    pub timestamp: i64,
    pub imsi: i64,
    pub serving_cell: Option<i64>,
    pub serving_signal: Option<f64>,
    /// Neighbor slots present in the file header, in slot order
    pub neighbors: Vec<NeighborSlot>,
}

impl Timestamped for MeasurementRow {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

/// Read one cell log
pub fn read_cell_log(path: &Path, max_slots: usize) -> Result<Vec<MeasurementRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| PrepError::csv(path, e))?;

    let headers = reader.headers().map_err(|e| PrepError::csv(path, e))?.clone();
    let columns = Columns::new(path, headers);

    let ts_idx = columns.require(TIMESTAMP_COLUMN)?;
    let ue_idx = columns.require(UE_COLUMN)?;
    let serving_id_idx = columns.require(SERVING_ID_COLUMN)?;
    let serving_sinr_idx = columns.require(SERVING_SINR_COLUMN)?;

    // A slot is usable only when both of its columns exist
    let slot_columns: Vec<(usize, usize)> = (1..=max_slots)
        .filter_map(|slot| {
            let id = columns.optional(&neighbor_id_column(slot))?;
            let sinr = columns.optional(&neighbor_sinr_column(slot))?;
            Some((id, sinr))
        })
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| PrepError::csv(path, e))?;
        let fields = columns.fields(&record);

        let mut neighbors = Vec::with_capacity(slot_columns.len());
        for &(id_idx, sinr_idx) in &slot_columns {
            neighbors.push(NeighborSlot {
                cell_id: fields.int(id_idx)?,
                signal: fields.float(sinr_idx)?,
            });
        }

        rows.push(MeasurementRow {
            timestamp: fields.required_int(ts_idx)?,
            imsi: fields.required_int(ue_idx)?,
            serving_cell: fields.int(serving_id_idx)?,
            serving_signal: fields.float(serving_sinr_idx)?,
            neighbors,
        });
    }

    debug!(
        "{}: {} rows, {} neighbor slots",
        path.display(),
        rows.len(),
        slot_columns.len()
    );
    Ok(rows)
}

/// Concatenate every configured cell log of a scenario, in cell id order
pub fn load_cell_logs(dir: &Path, config: &PipelineConfig) -> Result<Vec<MeasurementRow>> {
    let mut rows = Vec::new();
    for &cell_id in &config.cell_ids {
        let path = dir.join(config.measurement_file(cell_id));
        rows.extend(read_cell_log(&path, config.max_neighbor_slots)?);
    }
    info!(
        "Loaded {} measurement rows from {} cell logs",
        rows.len(),
        config.cell_ids.len()
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const HEADER: &str = "timestamp,UE (imsi),L3 serving Id(m_cellId),L3 serving SINR 3gpp,\
L3 neigh Id 1 (cellId),L3 neigh SINR 3gpp 1 (convertedSinr),\
L3 neigh Id 2 (cellId),L3 neigh SINR 3gpp 2 (convertedSinr)";

    #[test]
    fn test_read_cell_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cu-cp-cell-2.txt");
        fs::write(
            &path,
            format!("{}\n1000,1,2,10.5,3,4.0,,\n1100,1,2,,4,nan,5,1.5\n", HEADER),
        )
        .unwrap();

        let rows = read_cell_log(&path, 7).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].timestamp, 1000);
        assert_eq!(rows[0].serving_signal, Some(10.5));
        assert_eq!(rows[0].neighbors.len(), 2);
        assert_eq!(rows[0].neighbors[1], NeighborSlot { cell_id: None, signal: None });
        assert_eq!(rows[1].serving_signal, None);
        assert_eq!(rows[1].neighbors[0], NeighborSlot { cell_id: Some(4), signal: None });
        assert_eq!(rows[1].neighbors[1].signal, Some(1.5));
    }

    #[test]
    fn test_missing_required_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cu-cp-cell-2.txt");
        fs::write(&path, "timestamp,UE (imsi)\n1000,1\n").unwrap();

        let err = read_cell_log(&path, 7).unwrap_err();
        assert!(matches!(err, PrepError::MissingColumn { ref column, .. } if column == SERVING_ID_COLUMN));
    }

    #[test]
    fn test_load_cell_logs_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            cell_ids: vec![2],
            ..Default::default()
        };
        assert!(matches!(
            load_cell_logs(dir.path(), &config),
            Err(PrepError::Csv { .. })
        ));
    }

    #[test]
    fn test_load_cell_logs_concatenates_in_cell_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cu-cp-cell-2.txt"), format!("{}\n2000,1,2,1.0,,,,\n", HEADER)).unwrap();
        fs::write(dir.path().join("cu-cp-cell-3.txt"), format!("{}\n1000,2,3,2.0,,,,\n", HEADER)).unwrap();
        let config = PipelineConfig {
            cell_ids: vec![2, 3],
            ..Default::default()
        };

        let rows = load_cell_logs(dir.path(), &config).unwrap();
        assert_eq!(rows.iter().map(|r| r.timestamp).collect::<Vec<_>>(), vec![2000, 1000]);
    }
}
