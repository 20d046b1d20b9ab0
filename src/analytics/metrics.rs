//! Aggregate statistics across UEs

use crate::analytics::trajectory::TrajectoryErrors;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mean, population standard deviation and range of a metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl SummaryStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Some(Self {
            mean,
            std: variance.sqrt(),
            min: values.iter().cloned().fold(f64::INFINITY, f64::min),
            max: values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

/// Overall comparison statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallStatistics {
    pub mae: SummaryStats,
    pub mse: SummaryStats,
    pub rmse: SummaryStats,
    pub max_distance: SummaryStats,
    /// UE with the lowest MAE
    pub best_ue: i64,
    /// UE with the highest MAE
    pub worst_ue: i64,
}

fn metric(per_ue: &BTreeMap<i64, TrajectoryErrors>, f: impl Fn(&TrajectoryErrors) -> f64) -> Vec<f64> {
    per_ue.values().map(f).collect()
}

/// Calculator for cross-UE comparison metrics
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Summarize per-UE errors; `None` when no UE produced a result
    pub fn overall(per_ue: &BTreeMap<i64, TrajectoryErrors>) -> Option<OverallStatistics> {
        let mut best: Option<(i64, f64)> = None;
        let mut worst: Option<(i64, f64)> = None;
        for (&ue, errors) in per_ue {
            if best.map_or(true, |(_, mae)| errors.mae < mae) {
                best = Some((ue, errors.mae));
            }
            if worst.map_or(true, |(_, mae)| errors.mae > mae) {
                worst = Some((ue, errors.mae));
            }
        }

        Some(OverallStatistics {
            mae: SummaryStats::from_values(&metric(per_ue, |e| e.mae))?,
            mse: SummaryStats::from_values(&metric(per_ue, |e| e.mse))?,
            rmse: SummaryStats::from_values(&metric(per_ue, |e| e.rmse))?,
            max_distance: SummaryStats::from_values(&metric(per_ue, |e| e.max_distance))?,
            best_ue: best?.0,
            worst_ue: worst?.0,
        })
    }
}
