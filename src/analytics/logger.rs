//! Run summaries on disk and on the terminal

use crate::analytics::comparison::ComparisonResults;
use crate::analytics::metrics::SummaryStats;
use crate::pipeline::runner::PreparationResults;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Handles writing run results under an output directory
pub struct ResultsLogger {
    output_dir: PathBuf,
}

impl ResultsLogger {
    /// Create a new logger with the specified output directory
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.output_dir.join("logs")
    }

    /// Ensure output directories exist
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(self.logs_dir()).context("Failed to create logs directory")?;
        Ok(())
    }

    /// Save a preparation run summary as timestamped JSON
    pub fn save_preparation(&self, results: &PreparationResults) -> Result<PathBuf> {
        self.ensure_dirs()?;
        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let path = self.logs_dir().join(format!("prepare_{}.json", timestamp));
        write_json(&path, results)?;
        info!("Run summary saved to: {}", path.display());
        Ok(path)
    }

    /// Load a preparation run summary
    pub fn load_preparation(path: &Path) -> Result<PreparationResults> {
        let contents = fs::read_to_string(path).context("Failed to read summary file")?;
        serde_json::from_str(&contents).context("Failed to parse summary file")
    }
}

/// Save comparison results to a JSON file, creating parent directories
pub fn save_comparison(results: &ComparisonResults, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    write_json(path, results)?;
    info!("Comparison saved to: {}", path.display());
    Ok(())
}

/// Load comparison results from a JSON file
pub fn load_comparison(path: &Path) -> Result<ComparisonResults> {
    let contents = fs::read_to_string(path).context("Failed to read comparison file")?;
    serde_json::from_str(&contents).context("Failed to parse comparison file")
}

/// A saved run result reloaded from disk
#[derive(Debug)]
pub enum SavedReport {
    Preparation(PreparationResults),
    Comparison(ComparisonResults),
}

impl SavedReport {
    pub fn format_summary(&self) -> String {
        match self {
            Self::Preparation(results) => format_preparation_summary(results),
            Self::Comparison(results) => format_comparison_summary(results),
        }
    }
}

/// Load either a preparation run summary or a comparison report
pub fn load_report(path: &Path) -> Result<SavedReport> {
    match ResultsLogger::load_preparation(path) {
        Ok(results) => Ok(SavedReport::Preparation(results)),
        Err(_) => load_comparison(path).map(SavedReport::Comparison).with_context(|| {
            format!(
                "{} is neither a run summary nor a comparison report",
                path.display()
            )
        }),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize results")?;
    let mut file = File::create(path).context("Failed to create results file")?;
    file.write_all(json.as_bytes())
        .context("Failed to write results file")?;
    Ok(())
}

/// Format a preparation run as a text table
pub fn format_preparation_summary(results: &PreparationResults) -> String {
    let mut out = String::new();
    out.push_str("\n╔══════════════════════════════════════════════════════════════════╗\n");
    out.push_str("║            TRAINING DATA PREPARATION                             ║\n");
    out.push_str("╚══════════════════════════════════════════════════════════════════╝\n\n");
    out.push_str(&format!(
        "  {:<20} {:>10} {:>10} {:>10} {:>10} {:>7}\n",
        "Scenario", "Loaded", "Selected", "Joined", "Written", "Window"
    ));
    out.push_str(&format!("  {}\n", "─".repeat(72)));
    for s in &results.scenarios {
        out.push_str(&format!(
            "  {:<20} {:>10} {:>10} {:>10} {:>10} {:>7}\n",
            s.name, s.measurement_rows, s.selected_rows, s.joined_rows, s.output_rows, s.window_size
        ));
        if !s.missing_coordinates.is_empty() {
            out.push_str(&format!("    ⚠ no coordinates for cells {:?}\n", s.missing_coordinates));
        }
    }
    for f in &results.failed {
        out.push_str(&format!("  {:<20} FAILED: {}\n", f.name, f.error));
    }
    out.push_str(&format!("\n  Total rows written: {}\n", results.total_rows));
    if let Some(combined) = &results.combined_file {
        out.push_str(&format!("  Combined table:     {}\n", combined));
    }
    out
}

fn stats_lines(label: &str, unit: &str, stats: &SummaryStats) -> String {
    format!(
        "  {}\n     Mean:  {:.2}{} ± {:.2}{}\n     Range: {:.2}{} - {:.2}{}\n",
        label, stats.mean, unit, stats.std, unit, stats.min, unit, stats.max, unit
    )
}

/// Format comparison results as a text summary
pub fn format_comparison_summary(results: &ComparisonResults) -> String {
    let mut out = String::new();
    out.push_str("\n╔══════════════════════════════════════════════════════════════════╗\n");
    out.push_str("║            TRAJECTORY SIMILARITY                                 ║\n");
    out.push_str("╚══════════════════════════════════════════════════════════════════╝\n\n");
    out.push_str(&format!("  Common UEs: {}\n\n", results.common_ues.len()));

    for (ue, e) in &results.per_ue {
        out.push_str(&format!(
            "  UE {:>3}  MAE {:>8.1}m  MSE {:>10.1}  RMSE {:>8.1}m  max {:>8.1}m  ({} pts)\n",
            ue, e.mae, e.mse, e.rmse, e.max_distance, e.matched_points
        ));
    }
    for ue in &results.skipped_ues {
        out.push_str(&format!("  UE {:>3}  insufficient points\n", ue));
    }

    match &results.overall {
        Some(overall) => {
            out.push_str("\n  OVERALL STATISTICS\n  ──────────────────\n");
            out.push_str(&stats_lines("MAE (Mean Absolute Error)", "m", &overall.mae));
            out.push_str(&stats_lines("MSE (Mean Squared Error)", "", &overall.mse));
            out.push_str(&stats_lines("RMSE (Root Mean Squared Error)", "m", &overall.rmse));
            out.push_str(&stats_lines("Maximum Distance Error", "m", &overall.max_distance));

            for (label, ue) in [("Best", overall.best_ue), ("Worst", overall.worst_ue)] {
                if let Some(e) = results.per_ue.get(&ue) {
                    out.push_str(&format!(
                        "\n  {} performance: UE {}\n     MAE: {:.2}m  MSE: {:.2}  RMSE: {:.2}m\n",
                        label, ue, e.mae, e.mse, e.rmse
                    ));
                }
            }
        }
        None => out.push_str("\n  No valid similarity results\n"),
    }
    out
}

/// Print preparation summary to terminal
pub fn print_preparation_summary(results: &PreparationResults) {
    println!("{}", format_preparation_summary(results));
}

/// Print comparison summary to terminal
pub fn print_comparison_summary(results: &ComparisonResults) {
    println!("{}", format_comparison_summary(results));
}
