//! Output records and CSV serialization

use crate::config::PipelineConfig;
use crate::error::{PrepError, Result};
use crate::ingest::measurement::{neighbor_sinr_column, SERVING_SINR_COLUMN};
use crate::pipeline::coords::map_sites;
use crate::pipeline::smoothing::SmoothedRow;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One row of the training table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    /// Relative timestamp on the position grid
    pub relative_timestamp: i64,
    pub imsi: i64,
    pub serving_x: f64,
    pub serving_y: f64,
    pub serving_sinr_ma: f64,
    pub neighbor_sinr_ma: Vec<f64>,
    /// Truncated site coordinates of the selected neighbors
    pub neighbor_sites: Vec<(i64, i64)>,
    pub ue_x: f64,
    pub ue_y: f64,
}

/// Round half to even, normalizing `-0.0`
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    let rounded = (value * scale).round_ties_even() / scale;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Integral floats keep one decimal, others use the shortest exact form
pub fn format_float(value: f64) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Turn smoothed rows into output records.
///
/// Rows without a UE position are dropped; unknown serving or neighbor sites
/// become 0.
pub fn finalize(rows: &[SmoothedRow], config: &PipelineConfig) -> Vec<TrainingRecord> {
    rows.iter()
        .filter_map(|smoothed| {
            let (ue_x, ue_y) = smoothed.row.position?;
            let measurement = &smoothed.row.measurement;
            let sites = map_sites(measurement, &config.coordinates);
            let (serving_x, serving_y) = sites.serving.unwrap_or((0.0, 0.0));

            Some(TrainingRecord {
                relative_timestamp: measurement.relative_timestamp.div_euclid(config.timestamp_divisor),
                imsi: measurement.imsi,
                serving_x,
                serving_y,
                serving_sinr_ma: round_to(smoothed.serving_signal_ma, config.decimals),
                neighbor_sinr_ma: smoothed
                    .neighbor_signal_ma
                    .iter()
                    .map(|&v| round_to(v, config.decimals))
                    .collect(),
                neighbor_sites: sites
                    .neighbors
                    .iter()
                    .map(|site| site.map_or((0, 0), |(x, y)| (x.trunc() as i64, y.trunc() as i64)))
                    .collect(),
                ue_x: round_to(ue_x, config.decimals),
                ue_y: round_to(ue_y, config.decimals),
            })
        })
        .collect()
}

/// Column names of the training table
pub fn header(config: &PipelineConfig) -> Vec<String> {
    let mut columns = vec![
        "relative_timestamp".to_string(),
        "imsi".to_string(),
        "serving_x".to_string(),
        "serving_y".to_string(),
        format!("{}_ma", SERVING_SINR_COLUMN),
    ];
    columns.extend((1..=config.neighbor_count).map(|i| format!("{}_ma", neighbor_sinr_column(i))));
    if config.include_neighbor_coordinates {
        for i in 1..=config.neighbor_count {
            columns.push(format!("neighbor{}_x", i));
            columns.push(format!("neighbor{}_y", i));
        }
    }
    columns.push("UE_x".to_string());
    columns.push("UE_y".to_string());
    columns
}

impl TrainingRecord {
    /// Fields in `header` order
    pub fn to_fields(&self, include_neighbor_coordinates: bool) -> Vec<String> {
        let mut fields = vec![
            self.relative_timestamp.to_string(),
            self.imsi.to_string(),
            format_float(self.serving_x),
            format_float(self.serving_y),
            format_float(self.serving_sinr_ma),
        ];
        fields.extend(self.neighbor_sinr_ma.iter().map(|&v| format_float(v)));
        if include_neighbor_coordinates {
            for &(x, y) in &self.neighbor_sites {
                fields.push(x.to_string());
                fields.push(y.to_string());
            }
        }
        fields.push(format_float(self.ue_x));
        fields.push(format_float(self.ue_y));
        fields
    }
}

/// Write a training table, creating parent directories
pub fn write_training_csv(path: &Path, records: &[TrainingRecord], config: &PipelineConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PrepError::io(parent, e))?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(|e| PrepError::csv(path, e))?;
    writer
        .write_record(header(config))
        .map_err(|e| PrepError::csv(path, e))?;
    for record in records {
        writer
            .write_record(record.to_fields(config.include_neighbor_coordinates))
            .map_err(|e| PrepError::csv(path, e))?;
    }
    writer.flush().map_err(|e| PrepError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::join::JoinedRow;
    use crate::pipeline::neighbors::{NeighborCandidate, SelectedMeasurement};

    fn smoothed(serving_cell: i64, position: Option<(f64, f64)>) -> SmoothedRow {
        SmoothedRow {
            row: JoinedRow {
                measurement: SelectedMeasurement {
                    relative_timestamp: 1299,
                    imsi: 4,
                    serving_cell: Some(serving_cell),
                    serving_signal: Some(1.0),
                    neighbors: vec![
                        NeighborCandidate { cell_id: 4, signal: 3.0 },
                        NeighborCandidate { cell_id: 11, signal: 2.0 },
                        NeighborCandidate { cell_id: 7, signal: 1.0 },
                    ],
                },
                position,
            },
            serving_signal_ma: 12.34567,
            neighbor_signal_ma: vec![3.0, 2.0004, -0.0001],
        }
    }

    #[test]
    fn test_round_and_format() {
        assert_eq!(round_to(12.34567, 3), 12.346);
        assert_eq!(round_to(-0.0001, 3), 0.0);
        assert_eq!(format_float(800.0), "800.0");
        assert_eq!(format_float(1233.01), "1233.01");
        assert_eq!(format_float(-0.0), "0.0");
        assert_eq!(format_float(12.346), "12.346");
    }

    #[test]
    fn test_round_half_to_even() {
        assert_eq!(round_to(2.0625, 3), 2.062);
        assert_eq!(round_to(0.0625, 3), 0.062);
        assert_eq!(round_to(0.1875, 3), 0.188);
        assert_eq!(round_to(-2.0625, 3), -2.062);
        assert_eq!(round_to(2.5, 0), 2.0);
    }

    #[test]
    fn test_finalize_record() {
        let config = PipelineConfig::default();
        let records = finalize(&[smoothed(3, Some((10.12345, 20.9999)))], &config);
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.relative_timestamp, 12);
        assert_eq!((record.serving_x, record.serving_y), (1300.0, 800.0));
        assert_eq!(record.serving_sinr_ma, 12.346);
        assert_eq!(record.neighbor_sinr_ma, vec![3.0, 2.0, 0.0]);
        assert_eq!(record.neighbor_sites, vec![(1050, 1233), (0, 0), (550, 366)]);
        assert_eq!((record.ue_x, record.ue_y), (10.123, 21.0));
    }

    #[test]
    fn test_rows_without_position_dropped_and_unknown_serving_zeroed() {
        let config = PipelineConfig::default();
        let records = finalize(&[smoothed(3, None), smoothed(42, Some((1.0, 1.0)))], &config);
        assert_eq!(records.len(), 1);
        assert_eq!((records[0].serving_x, records[0].serving_y), (0.0, 0.0));
    }

    #[test]
    fn test_header_and_fields_align() {
        let mut config = PipelineConfig::default();
        let records = finalize(&[smoothed(2, Some((5.5, 6.0)))], &config);
        let record = &records[0];

        let columns = header(&config);
        assert_eq!(
            columns,
            vec![
                "relative_timestamp",
                "imsi",
                "serving_x",
                "serving_y",
                "L3 serving SINR 3gpp_ma",
                "L3 neigh SINR 3gpp 1 (convertedSinr)_ma",
                "L3 neigh SINR 3gpp 2 (convertedSinr)_ma",
                "L3 neigh SINR 3gpp 3 (convertedSinr)_ma",
                "UE_x",
                "UE_y",
            ]
        );
        assert_eq!(
            record.to_fields(false),
            vec!["12", "4", "800.0", "800.0", "12.346", "3.0", "2.0", "0.0", "5.5", "6.0"]
        );

        config.include_neighbor_coordinates = true;
        assert_eq!(header(&config).len(), 16);
        assert_eq!(record.to_fields(true).len(), 16);
        assert_eq!(header(&config)[8], "neighbor1_x");
    }

    #[test]
    fn test_write_training_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenarios").join("data_ten1.csv");
        let config = PipelineConfig::default();
        let records = finalize(&[smoothed(2, Some((5.5, 6.0)))], &config);

        write_training_csv(&path, &records, &config).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("relative_timestamp,imsi,serving_x"));
        assert_eq!(lines[1], "12,4,800.0,800.0,12.346,3.0,2.0,0.0,5.5,6.0");
    }
}
