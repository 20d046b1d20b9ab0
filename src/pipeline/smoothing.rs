//! Trailing moving average over fixed-duration windows

use crate::pipeline::join::JoinedRow;
use std::collections::BTreeMap;
use tracing::debug;

/// Joined row with its smoothed signals
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedRow {
    pub row: JoinedRow,
    pub serving_signal_ma: f64,
    /// Smoothed signal per selected neighbor rank
    pub neighbor_signal_ma: Vec<f64>,
}

/// Smallest positive gap between consecutive distinct timestamps
pub fn min_positive_delta<I>(timestamps: I) -> Option<i64>
where
    I: IntoIterator<Item = i64>,
{
    let mut sorted: Vec<i64> = timestamps.into_iter().collect();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.windows(2).map(|w| w[1] - w[0]).min()
}

/// Number of samples spanning `duration` at the finest observed spacing
pub fn window_size<I>(timestamps: I, duration: i64) -> usize
where
    I: IntoIterator<Item = i64>,
{
    match min_positive_delta(timestamps) {
        Some(delta) => usize::try_from(duration / delta).unwrap_or(0).max(1),
        None => 1,
    }
}

/// Trailing mean; the first `window - 1` outputs average what is available
pub fn trailing_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Smooth serving and neighbor signals per UE.
///
/// Rows without a serving signal are dropped first. Each UE group is averaged
/// in relative-timestamp order; the output keeps the input row order.
pub fn smooth_signals(rows: Vec<JoinedRow>, window: usize) -> Vec<SmoothedRow> {
    let rows: Vec<JoinedRow> = rows
        .into_iter()
        .filter(|row| row.measurement.serving_signal.is_some())
        .collect();

    let mut groups: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (i, row) in rows.iter().enumerate() {
        groups.entry(row.imsi()).or_default().push(i);
    }

    let neighbor_count = rows.first().map_or(0, |r| r.measurement.neighbors.len());
    let mut serving_ma = vec![0.0; rows.len()];
    let mut neighbor_ma = vec![vec![0.0; neighbor_count]; rows.len()];

    for (imsi, mut members) in groups {
        members.sort_by_key(|&i| rows[i].relative_timestamp());

        let serving: Vec<f64> = members
            .iter()
            .map(|&i| rows[i].measurement.serving_signal.unwrap_or_default())
            .collect();
        for (&i, value) in members.iter().zip(trailing_mean(&serving, window)) {
            serving_ma[i] = value;
        }

        for rank in 0..neighbor_count {
            let series: Vec<f64> = members
                .iter()
                .map(|&i| {
                    rows[i]
                        .measurement
                        .neighbors
                        .get(rank)
                        .map_or(0.0, |n| n.signal)
                })
                .collect();
            for (&i, value) in members.iter().zip(trailing_mean(&series, window)) {
                neighbor_ma[i][rank] = value;
            }
        }

        debug!("UE {}: smoothed {} rows", imsi, members.len());
    }

    rows.into_iter()
        .zip(serving_ma)
        .zip(neighbor_ma)
        .map(|((row, serving_signal_ma), neighbor_signal_ma)| SmoothedRow {
            row,
            serving_signal_ma,
            neighbor_signal_ma,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::neighbors::{NeighborCandidate, SelectedMeasurement};
    use approx::assert_relative_eq;

    fn joined(t: i64, imsi: i64, serving: Option<f64>, neighbor: f64) -> JoinedRow {
        JoinedRow {
            measurement: SelectedMeasurement {
                relative_timestamp: t,
                imsi,
                serving_cell: Some(2),
                serving_signal: serving,
                neighbors: vec![NeighborCandidate { cell_id: 3, signal: neighbor }],
            },
            position: Some((0.0, 0.0)),
        }
    }

    fn total_variation(values: &[f64]) -> f64 {
        values.windows(2).map(|w| (w[1] - w[0]).abs()).sum()
    }

    #[test]
    fn test_window_size_from_min_delta() {
        assert_eq!(min_positive_delta([0, 200, 100, 100, 350]), Some(100));
        assert_eq!(window_size([0, 200, 100, 100, 350], 5000), 50);
        assert_eq!(window_size([0, 300], 5000), 16);
        assert_eq!(window_size([0, 10_000], 5000), 1);
        assert_eq!(window_size([42, 42], 5000), 1);
        assert_eq!(window_size(std::iter::empty(), 5000), 1);
    }

    #[test]
    fn test_trailing_mean_min_period_one() {
        let smoothed = trailing_mean(&[2.0, 4.0, 6.0, 8.0], 3);
        assert_relative_eq!(smoothed[0], 2.0);
        assert_relative_eq!(smoothed[1], 3.0);
        assert_relative_eq!(smoothed[2], 4.0);
        assert_relative_eq!(smoothed[3], 6.0);
    }

    #[test]
    fn test_window_one_is_identity() {
        let values = [3.5, -1.0, 7.25, 0.0];
        assert_eq!(trailing_mean(&values, 1), values.to_vec());
    }

    #[test]
    fn test_wider_window_flattens_spike() {
        let mut values = vec![0.0; 40];
        values[20] = 10.0;
        let mut previous = total_variation(&values);
        for window in [2, 3, 5, 8] {
            let smoothed = trailing_mean(&values, window);
            let variation = total_variation(&smoothed);
            assert!(variation <= previous + 1e-9, "window {} not smoother", window);
            assert_relative_eq!(smoothed.iter().cloned().fold(f64::MIN, f64::max), 10.0 / window as f64);
            previous = variation;
        }
    }

    #[test]
    fn test_smoothing_is_per_ue_and_drops_missing_serving() {
        let rows = vec![
            joined(0, 1, Some(10.0), 1.0),
            joined(0, 2, Some(100.0), 5.0),
            joined(100, 1, Some(20.0), 3.0),
            joined(100, 2, None, 7.0),
            joined(200, 2, Some(50.0), 9.0),
        ];

        let smoothed = smooth_signals(rows, 2);
        assert_eq!(smoothed.len(), 4);

        assert_relative_eq!(smoothed[0].serving_signal_ma, 10.0);
        assert_relative_eq!(smoothed[1].serving_signal_ma, 100.0);
        assert_relative_eq!(smoothed[2].serving_signal_ma, 15.0);
        assert_relative_eq!(smoothed[2].neighbor_signal_ma[0], 2.0);
        // UE 2 skips the row without serving signal
        assert_relative_eq!(smoothed[3].serving_signal_ma, 75.0);
        assert_relative_eq!(smoothed[3].neighbor_signal_ma[0], 7.0);
    }
}
