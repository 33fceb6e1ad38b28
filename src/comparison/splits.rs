//! Fixed-distance splits and arbitrary segment metrics.

use serde::{Deserialize, Serialize};

use super::MAX_PACE_MIN_PER_KM;
use crate::metrics::{calculate_elevation_stats, elapsed_seconds, index_window, mean_present};
use crate::Route;

/// Windows shorter than this (km) at the end of a route are not reported
const MIN_WINDOW_KM: f64 = 0.001;

/// A split is partial when shorter than this share of the split length
const PARTIAL_SPLIT_RATIO: f64 = 0.9;

/// One fixed-distance split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Split {
    /// 1-based split number
    pub index: usize,
    pub start_km: f64,
    pub end_km: f64,
    /// Window length in km
    pub distance: f64,
    /// Seconds between the boundary samples
    pub duration: Option<f64>,
    /// min/km
    pub pace: Option<f64>,
    /// Meters climbed within the split
    pub elevation_gain: f64,
    pub avg_heart_rate: Option<f64>,
    pub is_partial: bool,
}

/// Metrics over a user-chosen distance window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentMetrics {
    pub start_km: f64,
    pub end_km: f64,
    pub start_index: usize,
    pub end_index: usize,
    /// Ground distance between the boundary samples in km
    pub distance: f64,
    pub duration: Option<f64>,
    /// min/km
    pub pace: Option<f64>,
    /// km/h
    pub avg_speed: Option<f64>,
    pub elevation_gain: f64,
    pub elevation_loss: f64,
    pub avg_heart_rate: Option<f64>,
    pub avg_cadence: Option<f64>,
    pub avg_power: Option<f64>,
}

/// Last index whose cumulative distance is `<= target_km`, clamped to the
/// array bounds. `cumulative` must be non-decreasing.
pub fn find_index_at_distance(cumulative: &[f64], target_km: f64) -> usize {
    let count = cumulative.partition_point(|d| *d <= target_km);
    count
        .saturating_sub(1)
        .min(cumulative.len().saturating_sub(1))
}

/// Elapsed seconds and pace between two sample indices.
///
/// Pace is `None` when either timestamp is missing, the distance is not
/// positive, or the pace falls outside `(0, 30)` min/km.
fn window_timing(
    route: &Route,
    distance_km: f64,
    start_idx: usize,
    end_idx: usize,
) -> (Option<f64>, Option<f64>) {
    let duration = elapsed_seconds(
        route.timestamps.get(start_idx).copied().flatten(),
        route.timestamps.get(end_idx).copied().flatten(),
    );
    let pace = duration
        .filter(|_| distance_km > 0.0)
        .map(|secs| secs / 60.0 / distance_km)
        .filter(|p| *p > 0.0 && *p < MAX_PACE_MIN_PER_KM);
    (duration, pace)
}

/// Split a route into fixed windows of `split_km`.
///
/// The last window may be shorter and is flagged partial when under 90% of
/// `split_km`.
pub fn calculate_splits(route: &Route, split_km: f64) -> Vec<Split> {
    let cumulative = route.cumulative_distances();
    let total = cumulative.last().copied().unwrap_or(0.0);
    if !(split_km > 0.0) || total <= 0.0 {
        return Vec::new();
    }

    let mut splits = Vec::new();
    let mut index = 0usize;

    loop {
        let start_km = index as f64 * split_km;
        if start_km >= total - MIN_WINDOW_KM {
            break;
        }
        let end_km = (start_km + split_km).min(total);
        let window = end_km - start_km;

        let start_idx = find_index_at_distance(&cumulative, start_km);
        let end_idx = find_index_at_distance(&cumulative, end_km);
        let covered = cumulative[end_idx] - cumulative[start_idx];
        let (duration, pace) = window_timing(route, covered, start_idx, end_idx);

        splits.push(Split {
            index: index + 1,
            start_km,
            end_km,
            distance: window,
            duration,
            pace,
            elevation_gain: calculate_elevation_stats(index_window(&route.elevations, start_idx, end_idx)).gain,
            avg_heart_rate: mean_present(index_window(&route.heart_rates, start_idx, end_idx)),
            is_partial: window < split_km * PARTIAL_SPLIT_RATIO,
        });
        index += 1;
    }

    splits
}

/// Metrics over `[start_km, end_km)`.
///
/// `end_km` is clamped to the route length. Returns `None` when the window is
/// empty, negative, or starts beyond the end of the route.
pub fn calculate_segment_metrics(
    route: &Route,
    start_km: f64,
    end_km: f64,
) -> Option<SegmentMetrics> {
    let cumulative = route.cumulative_distances();
    let total = *cumulative.last()?;
    if !(start_km >= 0.0) || !(end_km > start_km) || start_km >= total {
        return None;
    }
    let end_km = end_km.min(total);

    let start_idx = find_index_at_distance(&cumulative, start_km);
    let end_idx = find_index_at_distance(&cumulative, end_km);
    let distance = cumulative[end_idx] - cumulative[start_idx];
    let (duration, pace) = window_timing(route, distance, start_idx, end_idx);
    let avg_speed = duration
        .filter(|d| *d > 0.0 && distance > 0.0)
        .map(|d| distance / (d / 3600.0));

    let elevation = calculate_elevation_stats(index_window(&route.elevations, start_idx, end_idx));

    Some(SegmentMetrics {
        start_km,
        end_km,
        start_index: start_idx,
        end_index: end_idx,
        distance,
        duration,
        pace,
        avg_speed,
        elevation_gain: elevation.gain,
        elevation_loss: elevation.loss,
        avg_heart_rate: mean_present(index_window(&route.heart_rates, start_idx, end_idx)),
        avg_cadence: mean_present(index_window(&route.cadences, start_idx, end_idx)),
        avg_power: mean_present(index_window(&route.powers, start_idx, end_idx)),
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::synthetic_route;
    use super::*;

    #[test]
    fn test_find_index_at_distance() {
        let cum = [0.0, 0.5, 0.5, 1.2, 2.0];
        assert_eq!(find_index_at_distance(&cum, -1.0), 0);
        assert_eq!(find_index_at_distance(&cum, 0.0), 0);
        assert_eq!(find_index_at_distance(&cum, 0.5), 2);
        assert_eq!(find_index_at_distance(&cum, 1.0), 2);
        assert_eq!(find_index_at_distance(&cum, 5.0), 4);
        assert_eq!(find_index_at_distance(&[], 1.0), 0);
    }

    #[test]
    fn test_five_km_constant_pace() {
        // 5 km in 10 m steps at 5:00/km (3 s per 10 m)
        let route = synthetic_route("5k", 501, 0.01, 3.0);
        let splits = calculate_splits(&route, 1.0);

        assert!(splits.len() == 5 || splits.len() == 6, "{} splits", splits.len());
        for split in splits.iter().filter(|s| !s.is_partial) {
            let pace = split.pace.unwrap();
            assert!((pace - 5.0).abs() < 0.5, "split {} pace {}", split.index, pace);
            assert_eq!(split.avg_heart_rate, Some(150.0));
        }
        assert_eq!(splits[0].index, 1);
        assert_eq!(splits[0].start_km, 0.0);
    }

    #[test]
    fn test_partial_final_split() {
        let route = synthetic_route("5.3k", 531, 0.01, 3.0);
        let splits = calculate_splits(&route, 1.0);
        assert_eq!(splits.len(), 6);
        assert!(splits[..5].iter().all(|s| !s.is_partial));
        let last = splits.last().unwrap();
        assert!(last.is_partial);
        assert!((last.distance - 0.3).abs() < 0.01);
    }

    #[test]
    fn test_split_elevation_gain() {
        let mut route = synthetic_route("hill", 201, 0.01, 3.0);
        for (i, e) in route.elevations.iter_mut().enumerate() {
            *e = Some(400.0 + i as f64);
        }
        let splits = calculate_splits(&route, 1.0);
        assert_eq!(splits.len(), 2);
        // ~100 steps of 1 m each
        assert!((splits[0].elevation_gain - 100.0).abs() <= 1.0);
    }

    #[test]
    fn test_split_without_timestamps_has_no_pace() {
        let mut route = synthetic_route("untimed", 201, 0.01, 3.0);
        route.timestamps = vec![None; 201];
        let splits = calculate_splits(&route, 1.0);
        assert!(!splits.is_empty());
        assert!(splits.iter().all(|s| s.pace.is_none()));
    }

    #[test]
    fn test_segment_metrics() {
        let route = synthetic_route("seg", 501, 0.01, 3.0);
        let seg = calculate_segment_metrics(&route, 1.0, 3.0).unwrap();
        assert!((seg.distance - 2.0).abs() < 0.02);
        assert!((seg.pace.unwrap() - 5.0).abs() < 0.1);
        assert!((seg.avg_speed.unwrap() - 12.0).abs() < 0.3);
        assert_eq!(seg.avg_heart_rate, Some(150.0));
        assert_eq!(seg.avg_power, None);
    }

    #[test]
    fn test_segment_outside_route() {
        let route = synthetic_route("seg", 101, 0.01, 3.0);
        assert!(calculate_segment_metrics(&route, 2.0, 3.0).is_none());
        assert!(calculate_segment_metrics(&route, 0.5, 0.5).is_none());
        assert!(calculate_segment_metrics(&route, -0.5, 0.5).is_none());
        // End past the route is clamped
        let seg = calculate_segment_metrics(&route, 0.5, 10.0).unwrap();
        assert!(seg.end_km < 1.0);
    }
}
