//! Pipeline configuration

use crate::error::{PrepError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Largest `decimals` whose scale factor stays exact in an f64
pub const MAX_DECIMALS: u32 = 15;

/// Static mapping from cell id to its site coordinates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellCoordinates(BTreeMap<i64, (f64, f64)>);

impl CellCoordinates {
    pub fn new(entries: impl IntoIterator<Item = (i64, (f64, f64))>) -> Self {
        Self(entries.into_iter().collect())
    }

    /// Hexagonal 7-site layout used by the 3GPP scenarios
    pub fn layout_3gpp() -> Self {
        Self::new([
            (2, (800.0, 800.0)),
            (3, (1300.0, 800.0)),
            (4, (1050.0, 1233.01)),
            (5, (550.0, 1233.01)),
            (6, (300.0, 800.0)),
            (7, (550.0, 366.987)),
            (8, (1050.0, 366.987)),
        ])
    }

    /// Wider 7-site layout used by the LOS scenarios
    pub fn layout_los() -> Self {
        Self::new([
            (2, (1500.0, 1500.0)),
            (3, (2500.0, 1500.0)),
            (4, (2000.0, 2366.03)),
            (5, (1000.0, 2366.03)),
            (6, (500.0, 1500.0)),
            (7, (1000.0, 633.975)),
            (8, (2000.0, 633.975)),
        ])
    }

    /// Coordinates for a cell, `None` if the id is not in the table
    pub fn lookup(&self, cell_id: i64) -> Option<(f64, f64)> {
        self.0.get(&cell_id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Observed ids with no entry in the table, ascending
    pub fn missing_ids<I>(&self, observed: I) -> Vec<i64>
    where
        I: IntoIterator<Item = i64>,
    {
        observed
            .into_iter()
            .filter(|id| !self.0.contains_key(id))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Main preparation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Cell ids whose measurement logs are loaded per scenario
    pub cell_ids: Vec<u32>,

    /// File name of a cell log, `{id}` is replaced by the cell id
    pub measurement_file_pattern: String,

    /// File name of the UE position trace
    pub position_file: String,

    /// Scenario directories are the children of the data root starting with this
    pub scenario_prefix: String,

    /// Neighbors kept per row
    pub neighbor_count: usize,

    /// Neighbor slots present in the raw logs
    pub max_neighbor_slots: usize,

    /// Span of the moving average in timestamp units
    pub window_duration: i64,

    /// Divisor applied to the relative timestamp on output
    pub timestamp_divisor: i64,

    /// Decimal places kept for smoothed signals and UE coordinates
    pub decimals: u32,

    /// Cell site coordinates
    pub coordinates: CellCoordinates,

    /// Emit neighbor{i}_x / neighbor{i}_y columns
    pub include_neighbor_coordinates: bool,

    /// Write the table concatenating every scenario
    pub write_combined: bool,

    /// File name of the combined table
    pub combined_file: String,

    /// Fail when an observed cell id has no coordinates
    pub strict_coordinates: bool,

    /// Skip a failing scenario instead of aborting the batch
    pub continue_on_error: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cell_ids: (2..=8).collect(),
            measurement_file_pattern: "cu-cp-cell-{id}.txt".to_string(),
            position_file: "ue_position.txt".to_string(),
            scenario_prefix: "data_ten".to_string(),
            neighbor_count: 3,
            max_neighbor_slots: 7,
            window_duration: 5000,
            timestamp_divisor: 100,
            decimals: 3,
            coordinates: CellCoordinates::layout_3gpp(),
            include_neighbor_coordinates: false,
            write_combined: true,
            combined_file: "training.csv".to_string(),
            strict_coordinates: false,
            continue_on_error: false,
        }
    }
}

impl PipelineConfig {
    /// Create config for the LOS scenario set
    pub fn offline_los() -> Self {
        Self {
            scenario_prefix: "data_LOS".to_string(),
            coordinates: CellCoordinates::layout_los(),
            write_combined: false,
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON file; absent fields take defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| PrepError::io(path, e))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| PrepError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cell_ids.is_empty() {
            return Err(PrepError::Config("cell_ids is empty".into()));
        }
        if !self.measurement_file_pattern.contains("{id}") {
            return Err(PrepError::Config(
                "measurement_file_pattern must contain '{id}'".into(),
            ));
        }
        if self.neighbor_count == 0 || self.neighbor_count > self.max_neighbor_slots {
            return Err(PrepError::Config(format!(
                "neighbor_count must be in 1..={}",
                self.max_neighbor_slots
            )));
        }
        if self.window_duration <= 0 {
            return Err(PrepError::Config("window_duration must be positive".into()));
        }
        if self.timestamp_divisor <= 0 {
            return Err(PrepError::Config("timestamp_divisor must be positive".into()));
        }
        if self.decimals > MAX_DECIMALS {
            return Err(PrepError::Config(format!(
                "decimals must be at most {}",
                MAX_DECIMALS
            )));
        }
        if self.coordinates.is_empty() {
            return Err(PrepError::Config("coordinate table is empty".into()));
        }
        Ok(())
    }

    pub fn measurement_file(&self, cell_id: u32) -> String {
        self.measurement_file_pattern
            .replace("{id}", &cell_id.to_string())
    }
}

/// Configuration of a trajectory comparison run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    pub actual_file: PathBuf,
    pub predicted_file: PathBuf,
    pub output_file: PathBuf,
    /// Divisor bringing actual timestamps onto the prediction grid
    pub timestamp_divisor: i64,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            actual_file: PathBuf::from("ue_position_3gpp1.txt"),
            predicted_file: PathBuf::from("lstm_trajectory_3gpp1.txt"),
            output_file: PathBuf::from("output/trajectory_comparison.json"),
            timestamp_divisor: 100,
        }
    }
}

impl ComparisonConfig {
    pub fn validate(&self) -> Result<()> {
        if self.timestamp_divisor <= 0 {
            return Err(PrepError::Config("timestamp_divisor must be positive".into()));
        }
        Ok(())
    }
}
