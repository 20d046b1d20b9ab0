//! Actual vs. predicted trajectory error

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A position on a shared timestamp grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub timestamp: i64,
    pub x: f64,
    pub y: f64,
}

/// Distance statistics over the matched points of one UE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryErrors {
    /// Mean distance
    pub mae: f64,
    /// Mean squared distance
    pub mse: f64,
    pub rmse: f64,
    pub max_distance: f64,
    /// Population standard deviation of the distance
    pub std_distance: f64,
    pub median_distance: f64,
    pub matched_points: usize,
}

/// Pair points sharing a timestamp, like an inner join (duplicates multiply)
pub fn match_points(actual: &[TrajectoryPoint], predicted: &[TrajectoryPoint]) -> Vec<(TrajectoryPoint, TrajectoryPoint)> {
    let mut by_time: HashMap<i64, Vec<&TrajectoryPoint>> = HashMap::new();
    for point in predicted {
        by_time.entry(point.timestamp).or_default().push(point);
    }

    actual
        .iter()
        .flat_map(|a| {
            by_time
                .get(&a.timestamp)
                .into_iter()
                .flatten()
                .map(move |&p| (*a, *p))
        })
        .collect()
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Compare two trajectories of the same UE.
///
/// `None` when either side has fewer than 2 points or fewer than 2 points
/// share a timestamp.
pub fn compare_trajectories(actual: &[TrajectoryPoint], predicted: &[TrajectoryPoint]) -> Option<TrajectoryErrors> {
    if actual.len() < 2 || predicted.len() < 2 {
        return None;
    }

    let pairs = match_points(actual, predicted);
    if pairs.len() < 2 {
        return None;
    }

    let distances: Vec<f64> = pairs
        .iter()
        .map(|(a, p)| (a.x - p.x).hypot(a.y - p.y))
        .collect();
    let n = distances.len() as f64;

    let mae = distances.iter().sum::<f64>() / n;
    let mse = distances.iter().map(|d| d * d).sum::<f64>() / n;
    let variance = distances.iter().map(|d| (d - mae).powi(2)).sum::<f64>() / n;
    let max_distance = distances.iter().cloned().fold(0.0, f64::max);

    let mut sorted = distances.clone();
    sorted.sort_by(f64::total_cmp);

    Some(TrajectoryErrors {
        mae,
        mse,
        rmse: mse.sqrt(),
        max_distance,
        std_distance: variance.sqrt(),
        median_distance: median(&sorted),
        matched_points: distances.len(),
    })
}
