//! Scenario Runner
//!
//! Drives the preparation pipeline over one scenario directory, and over every
//! scenario of a data root, collecting per-scenario statistics and the
//! combined training table.

use crate::config::PipelineConfig;
use crate::error::Result as PrepResult;
use crate::ingest::{load_cell_logs, read_positions};
use crate::pipeline::{
    coords::check_coverage,
    finalize::{finalize, write_training_csv, TrainingRecord},
    join::left_join_positions,
    neighbors::select_neighbors,
    smoothing::{smooth_signals, window_size},
    time::rebase,
};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Row counts and parameters of one processed scenario
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioStats {
    pub name: String,
    /// Rows read from all cell logs
    pub measurement_rows: usize,
    /// Rows with enough valid neighbors
    pub selected_rows: usize,
    /// Rows after the position join
    pub joined_rows: usize,
    /// Rows with a serving signal
    pub smoothed_rows: usize,
    /// Rows written
    pub output_rows: usize,
    pub window_size: usize,
    /// Referenced cell ids without coordinates
    pub missing_coordinates: Vec<i64>,
    pub output_file: Option<String>,
}

/// Result of running the pipeline on one scenario
#[derive(Debug, Clone)]
pub struct ScenarioOutput {
    pub stats: ScenarioStats,
    pub records: Vec<TrainingRecord>,
}

/// A scenario skipped because it failed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedScenario {
    pub name: String,
    pub error: String,
}

/// Summary of the configuration a batch ran with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparationConfigSummary {
    pub root: String,
    pub output_dir: String,
    pub scenario_prefix: String,
    pub cell_ids: Vec<u32>,
    pub neighbor_count: usize,
    pub window_duration: i64,
    pub timestamp_divisor: i64,
}

/// Results of a complete batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparationResults {
    pub config: PreparationConfigSummary,
    pub scenarios: Vec<ScenarioStats>,
    pub failed: Vec<FailedScenario>,
    /// Rows across all written scenarios
    pub total_rows: usize,
    pub combined_file: Option<String>,
}

/// Pipeline over a single scenario directory
pub struct ScenarioPipeline<'a> {
    config: &'a PipelineConfig,
}

impl<'a> ScenarioPipeline<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Run every stage on `dir` and return the finalized records
    pub fn run(&self, dir: &Path) -> PrepResult<ScenarioOutput> {
        let config = self.config;
        config.validate()?;
        let name = scenario_name(dir);

        let mut measurements = load_cell_logs(dir, config)?;
        let measurement_rows = measurements.len();
        measurements.sort_by_key(|row| (row.timestamp, row.imsi));
        let measurements = rebase(measurements);

        let selected = select_neighbors(&measurements, config.neighbor_count);
        let selected_rows = selected.len();
        info!(
            "{}: {} rows, {} with >= {} valid neighbors",
            name, measurement_rows, selected_rows, config.neighbor_count
        );

        let positions = rebase(read_positions(&dir.join(&config.position_file))?);
        let joined = left_join_positions(selected, &positions);
        let joined_rows = joined.len();

        let window = window_size(
            joined.iter().map(|row| row.relative_timestamp()),
            config.window_duration,
        );
        info!("{}: window_size = {}", name, window);

        let smoothed = smooth_signals(joined, window);
        let smoothed_rows = smoothed.len();

        let missing_coordinates = check_coverage(
            smoothed.iter().map(|s| &s.row.measurement),
            &config.coordinates,
            config.strict_coordinates,
        )?;

        let records = finalize(&smoothed, config);
        info!(
            "{}: {} joined, {} with serving signal, {} written",
            name,
            joined_rows,
            smoothed_rows,
            records.len()
        );

        Ok(ScenarioOutput {
            stats: ScenarioStats {
                name,
                measurement_rows,
                selected_rows,
                joined_rows,
                smoothed_rows,
                output_rows: records.len(),
                window_size: window,
                missing_coordinates,
                output_file: None,
            },
            records,
        })
    }
}

fn scenario_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}

/// Child directories of `root` whose name starts with `prefix`, sorted by name
pub fn discover_scenarios(root: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(root)
        .with_context(|| format!("Failed to read data root {}", root.display()))?;

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.context("Failed to read directory entry")?;
        let path = entry.path();
        let matches = path
            .file_name()
            .map(|n| n.to_string_lossy().starts_with(prefix))
            .unwrap_or(false);
        if matches && path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Runs every scenario under a data root and writes the training tables
pub struct BatchRunner {
    config: PipelineConfig,
    root: PathBuf,
    output_dir: PathBuf,
}

impl BatchRunner {
    pub fn new(config: PipelineConfig, root: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            root: root.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn scenario_dir(&self) -> PathBuf {
        self.output_dir.join("scenarios")
    }

    /// Process all scenarios in name order
    pub fn run(&self) -> Result<PreparationResults> {
        self.config.validate().context("Invalid configuration")?;
        let scenarios = discover_scenarios(&self.root, &self.config.scenario_prefix)?;
        if scenarios.is_empty() {
            bail!(
                "No scenario directories matching '{}*' under {}",
                self.config.scenario_prefix,
                self.root.display()
            );
        }
        info!("Found {} scenarios under {}", scenarios.len(), self.root.display());

        let scenario_out = self.scenario_dir();
        fs::create_dir_all(&scenario_out)
            .with_context(|| format!("Failed to create {}", scenario_out.display()))?;

        let pipeline = ScenarioPipeline::new(&self.config);
        let mut stats = Vec::new();
        let mut failed = Vec::new();
        let mut combined: Vec<TrainingRecord> = Vec::new();

        for dir in &scenarios {
            let name = scenario_name(dir);
            info!("=== Processing {} ===", name);

            let output = match pipeline.run(dir) {
                Ok(output) => output,
                Err(e) if self.config.continue_on_error => {
                    warn!("Skipping {}: {}", name, e);
                    failed.push(FailedScenario {
                        name,
                        error: e.to_string(),
                    });
                    continue;
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Scenario {} failed", name));
                }
            };

            let path = scenario_out.join(format!("{}.csv", name));
            write_training_csv(&path, &output.records, &self.config)
                .with_context(|| format!("Failed to write scenario table for {}", name))?;
            info!("Saved {} ({} rows)", path.display(), output.records.len());

            let mut scenario_stats = output.stats;
            scenario_stats.output_file = Some(path.display().to_string());
            stats.push(scenario_stats);
            combined.extend(output.records);
        }

        let combined_file = if self.config.write_combined {
            let path = self.output_dir.join(&self.config.combined_file);
            write_training_csv(&path, &combined, &self.config)
                .context("Failed to write combined table")?;
            info!("All scenarios merged into {} ({} rows)", path.display(), combined.len());
            Some(path.display().to_string())
        } else {
            None
        };

        Ok(PreparationResults {
            config: PreparationConfigSummary {
                root: self.root.display().to_string(),
                output_dir: self.output_dir.display().to_string(),
                scenario_prefix: self.config.scenario_prefix.clone(),
                cell_ids: self.config.cell_ids.clone(),
                neighbor_count: self.config.neighbor_count,
                window_duration: self.config.window_duration,
                timestamp_divisor: self.config.timestamp_divisor,
            },
            total_rows: combined.len(),
            scenarios: stats,
            failed,
            combined_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write as _;

    const HEADER: &str = "timestamp,UE (imsi),L3 serving Id(m_cellId),L3 serving SINR 3gpp,\
L3 neigh Id 1 (cellId),L3 neigh SINR 3gpp 1 (convertedSinr),\
L3 neigh Id 2 (cellId),L3 neigh SINR 3gpp 2 (convertedSinr),\
L3 neigh Id 3 (cellId),L3 neigh SINR 3gpp 3 (convertedSinr),\
L3 neigh Id 4 (cellId),L3 neigh SINR 3gpp 4 (convertedSinr)";

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            cell_ids: vec![2, 3],
            window_duration: 200,
            ..Default::default()
        }
    }

    /// Two cells, two UEs, 100 ms reporting, positions for t < 400 only
    fn write_scenario(dir: &Path) {
        fs::create_dir_all(dir).unwrap();

        let mut cell2 = format!("{}\n", HEADER);
        let mut cell3 = format!("{}\n", HEADER);
        for step in 0..5 {
            let t = 10_000 + step * 100;
            let s = step as f64;
            // UE 1 on cell 2: four valid neighbors
            writeln!(cell2, "{},1,2,{},3,{},4,{},5,{},6,{}", t, 10.0 + s, 1.0 + s, 5.0, 3.0, -2.0).unwrap();
            // UE 2 on cell 3: only two valid neighbors
            writeln!(cell3, "{},2,3,{},2,{},0,{},4,{},,", t, 20.0, 1.0, 9.0, 2.0).unwrap();
        }
        // UE 2 row with three neighbors but no serving signal
        writeln!(cell3, "{},2,3,,2,1.0,4,2.0,5,3.0,,", 10_100).unwrap();

        fs::write(dir.join("cu-cp-cell-2.txt"), cell2).unwrap();
        fs::write(dir.join("cu-cp-cell-3.txt"), cell3).unwrap();

        let mut trace = String::from("timestamp,id,x,y\n");
        for step in 0..4 {
            let t = 500 + step * 100;
            writeln!(trace, "{},1,{},{}", t, 100.0 + step as f64 * 0.5, 200.0).unwrap();
            writeln!(trace, "{},2,{},{}", t, 300.0, 400.0).unwrap();
        }
        fs::write(dir.join("ue_position.txt"), trace).unwrap();
    }

    #[test]
    fn test_scenario_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = dir.path().join("data_ten1");
        write_scenario(&scenario);

        let config = test_config();
        let output = ScenarioPipeline::new(&config).run(&scenario).unwrap();

        assert_eq!(output.stats.name, "data_ten1");
        assert_eq!(output.stats.measurement_rows, 11);
        assert_eq!(output.stats.selected_rows, 6);
        assert_eq!(output.stats.smoothed_rows, 5);
        assert_eq!(output.stats.window_size, 2);
        // t = 400 has no position
        assert_eq!(output.records.len(), 4);

        let first = &output.records[0];
        assert_eq!(first.imsi, 1);
        assert_eq!(first.relative_timestamp, 0);
        assert_eq!((first.serving_x, first.serving_y), (800.0, 800.0));
        assert_eq!(first.serving_sinr_ma, 10.0);
        assert_eq!(first.neighbor_sinr_ma, vec![5.0, 3.0, 1.0]);
        assert_eq!((first.ue_x, first.ue_y), (100.0, 200.0));

        let second = &output.records[1];
        assert_eq!(second.relative_timestamp, 1);
        assert_eq!(second.serving_sinr_ma, 10.5);
        // neighbor order [5.0, 3.0, 2.0] at t=100 averaged with [5.0, 3.0, 1.0]
        assert_eq!(second.neighbor_sinr_ma, vec![5.0, 3.0, 1.5]);

        for record in &output.records {
            assert_eq!(record.imsi, 1);
            let ranked = &record.neighbor_sinr_ma;
            assert!(ranked.windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn test_batch_run_writes_tables_deterministically() {
        let data = tempfile::tempdir().unwrap();
        write_scenario(&data.path().join("data_ten2"));
        write_scenario(&data.path().join("data_ten1"));
        fs::create_dir_all(data.path().join("other")).unwrap();

        let out_a = tempfile::tempdir().unwrap();
        let results = BatchRunner::new(test_config(), data.path(), out_a.path()).run().unwrap();

        assert_eq!(results.scenarios.len(), 2);
        assert_eq!(results.scenarios[0].name, "data_ten1");
        assert_eq!(results.total_rows, 8);
        assert!(results.failed.is_empty());

        let combined = fs::read_to_string(out_a.path().join("training.csv")).unwrap();
        assert_eq!(combined.lines().count(), 9);
        assert!(out_a.path().join("scenarios/data_ten2.csv").exists());

        let out_b = tempfile::tempdir().unwrap();
        BatchRunner::new(test_config(), data.path(), out_b.path()).run().unwrap();
        assert_eq!(
            fs::read(out_a.path().join("training.csv")).unwrap(),
            fs::read(out_b.path().join("training.csv")).unwrap()
        );
    }

    #[test]
    fn test_missing_input_aborts_or_skips() {
        let data = tempfile::tempdir().unwrap();
        write_scenario(&data.path().join("data_ten1"));
        fs::create_dir_all(data.path().join("data_ten2")).unwrap();

        let out = tempfile::tempdir().unwrap();
        assert!(BatchRunner::new(test_config(), data.path(), out.path()).run().is_err());

        let config = PipelineConfig {
            continue_on_error: true,
            write_combined: false,
            ..test_config()
        };
        let results = BatchRunner::new(config, data.path(), out.path()).run().unwrap();
        assert_eq!(results.scenarios.len(), 1);
        assert_eq!(results.failed.len(), 1);
        assert_eq!(results.failed[0].name, "data_ten2");
        assert!(results.combined_file.is_none());
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let data = tempfile::tempdir().unwrap();
        write_scenario(&data.path().join("data_ten1"));
        let out = tempfile::tempdir().unwrap();

        let config = PipelineConfig {
            timestamp_divisor: 0,
            ..test_config()
        };
        assert!(BatchRunner::new(config.clone(), data.path(), out.path()).run().is_err());
        assert!(matches!(
            ScenarioPipeline::new(&config).run(&data.path().join("data_ten1")),
            Err(crate::error::PrepError::Config(_))
        ));
        assert!(!out.path().join("training.csv").exists());
    }

    #[test]
    fn test_no_scenarios_is_an_error() {
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        assert!(BatchRunner::new(test_config(), data.path(), out.path()).run().is_err());
    }
}
