//! Trajectory comparison run
//!
//! Loads the actual and predicted position files, aligns them on the
//! prediction timestamp grid and compares every UE present in both.

use crate::analytics::metrics::{MetricsCalculator, OverallStatistics};
use crate::analytics::trajectory::{compare_trajectories, TrajectoryErrors, TrajectoryPoint};
use crate::config::ComparisonConfig;
use crate::error::Result;
use crate::ingest::position::{read_positions, PositionSample};
use crate::pipeline::time::rebase;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Trajectories keyed by UE id, each sorted by timestamp
pub type Trajectories = BTreeMap<i64, Vec<TrajectoryPoint>>;

/// Results of a comparison run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResults {
    pub actual_file: String,
    pub predicted_file: String,
    /// UEs present in both files
    pub common_ues: Vec<i64>,
    pub per_ue: BTreeMap<i64, TrajectoryErrors>,
    /// Common UEs without enough points to compare
    pub skipped_ues: Vec<i64>,
    pub overall: Option<OverallStatistics>,
}

/// Group samples into per-UE trajectories ordered by timestamp
pub fn group_by_ue(samples: impl IntoIterator<Item = (i64, TrajectoryPoint)>) -> Trajectories {
    let mut trajectories = Trajectories::new();
    for (ue, point) in samples {
        trajectories.entry(ue).or_default().push(point);
    }
    for points in trajectories.values_mut() {
        points.sort_by_key(|p| p.timestamp);
    }
    trajectories
}

/// Actual positions rebased to their first timestamp and divided onto the grid
pub fn actual_trajectories(samples: Vec<PositionSample>, divisor: i64) -> Trajectories {
    group_by_ue(rebase(samples).into_iter().map(|r| {
        (
            r.record.imsi,
            TrajectoryPoint {
                timestamp: r.relative_timestamp / divisor,
                x: r.record.x,
                y: r.record.y,
            },
        )
    }))
}

/// Predicted positions are already on the grid
pub fn predicted_trajectories(samples: Vec<PositionSample>) -> Trajectories {
    group_by_ue(samples.into_iter().map(|s| {
        (
            s.imsi,
            TrajectoryPoint {
                timestamp: s.timestamp,
                x: s.x,
                y: s.y,
            },
        )
    }))
}

/// Compare every UE present in both sets
pub fn compare_all(actual: &Trajectories, predicted: &Trajectories) -> (Vec<i64>, BTreeMap<i64, TrajectoryErrors>, Vec<i64>) {
    let common: Vec<i64> = actual.keys().filter(|ue| predicted.contains_key(ue)).copied().collect();
    info!("Found {} common UEs", common.len());

    let mut per_ue = BTreeMap::new();
    let mut skipped = Vec::new();
    for (i, &ue) in common.iter().enumerate() {
        match compare_trajectories(&actual[&ue], &predicted[&ue]) {
            Some(errors) => {
                debug!(
                    "UE {:2} ({}/{}): MAE {:.1}m, MSE {:.1}, RMSE {:.1}m",
                    ue,
                    i + 1,
                    common.len(),
                    errors.mae,
                    errors.mse,
                    errors.rmse
                );
                per_ue.insert(ue, errors);
            }
            None => {
                warn!("UE {}: insufficient matched points", ue);
                skipped.push(ue);
            }
        }
    }
    (common, per_ue, skipped)
}

/// Load both files and run the comparison
pub fn run_comparison(config: &ComparisonConfig) -> Result<ComparisonResults> {
    config.validate()?;
    let actual = actual_trajectories(read_positions(&config.actual_file)?, config.timestamp_divisor);
    let predicted = predicted_trajectories(read_positions(&config.predicted_file)?);
    info!(
        "Loaded {} actual and {} predicted trajectories",
        actual.len(),
        predicted.len()
    );

    let (common_ues, per_ue, skipped_ues) = compare_all(&actual, &predicted);
    let overall = MetricsCalculator::overall(&per_ue);
    if overall.is_none() {
        warn!("No valid similarity results");
    }

    Ok(ComparisonResults {
        actual_file: config.actual_file.display().to_string(),
        predicted_file: config.predicted_file.display().to_string(),
        common_ues,
        per_ue,
        skipped_ues,
        overall,
    })
}
