//! Distance -> elapsed-time index for cross-route alignment.
//!
//! Two recordings of the same course are compared at equal ground distance,
//! not at equal time. A [`DistanceTimeMap`] records, for every timestamped
//! sample, how far the athlete had travelled and how long it took.

use serde::{Deserialize, Serialize};

use crate::geo_utils::haversine_distance;
use crate::metrics::seconds_between;
use crate::Route;

/// Parallel ascending sequences of cumulative distance (km) and elapsed
/// time (s). Both start at 0 and have the same length (at least 2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceTimeMap {
    pub distances: Vec<f64>,
    pub times: Vec<f64>,
}

impl DistanceTimeMap {
    /// Furthest mapped distance in km.
    pub fn max_distance(&self) -> f64 {
        self.distances.last().copied().unwrap_or(0.0)
    }

    /// Elapsed time at the furthest mapped distance, in seconds.
    pub fn total_time(&self) -> f64 {
        self.times.last().copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }
}

/// Build the distance-time map of a route.
///
/// Returns `None` if the route has no start timestamp or fewer than two
/// timestamped samples. Distance accumulates over every coordinate, but an
/// entry is only recorded where a timestamp exists.
pub fn build_time_distance_map(route: &Route) -> Option<DistanceTimeMap> {
    let start = route.timestamps.first().copied().flatten()?;

    let mut distances = Vec::new();
    let mut times = Vec::new();
    let mut cumulative = 0.0;

    for (i, point) in route.coordinates.iter().enumerate() {
        if i > 0 {
            cumulative += haversine_distance(&route.coordinates[i - 1], point);
        }
        if let Some(ts) = route.timestamps.get(i).copied().flatten() {
            distances.push(cumulative);
            times.push(seconds_between(start, ts));
        }
    }

    if distances.len() < 2 {
        return None;
    }
    Some(DistanceTimeMap { distances, times })
}

/// Linearly interpolate `ys` at `x` over the ascending axis `xs`.
///
/// Caller guarantees `xs[0] < x <= xs[last]`. Binary search keeps
/// `xs[low] <= x < xs[high]` until the bracket is adjacent.
fn interpolate_ascending(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    // Exact hits return the recorded value; with repeated axis values the
    // first occurrence wins.
    if let Ok(idx) = xs.binary_search_by(|v| v.total_cmp(&x)) {
        let first = xs[..idx].iter().rposition(|v| *v < x).map_or(0, |p| p + 1);
        return ys[first];
    }

    let mut low = 0;
    let mut high = xs.len() - 1;
    while high - low > 1 {
        let mid = (low + high) / 2;
        if xs[mid] <= x {
            low = mid;
        } else {
            high = mid;
        }
    }

    let span = xs[high] - xs[low];
    if span <= 0.0 {
        return ys[low];
    }
    let ratio = (x - xs[low]) / span;
    ys[low] + ratio * (ys[high] - ys[low])
}

/// Elapsed seconds at `target_km` along the map.
///
/// `None` beyond the mapped distance, 0 at or before the start.
///
/// # Example
/// ```
/// use route_analytics::{get_time_at_distance, DistanceTimeMap};
///
/// let map = DistanceTimeMap {
///     distances: vec![0.0, 1.0, 2.0],
///     times: vec![0.0, 300.0, 600.0],
/// };
/// assert_eq!(get_time_at_distance(&map, 2.0), Some(600.0));
/// assert_eq!(get_time_at_distance(&map, 1.5), Some(450.0));
/// assert_eq!(get_time_at_distance(&map, 2.5), None);
/// ```
pub fn get_time_at_distance(map: &DistanceTimeMap, target_km: f64) -> Option<f64> {
    if map.is_empty() || target_km > map.max_distance() {
        return None;
    }
    if target_km <= 0.0 {
        return Some(0.0);
    }
    Some(interpolate_ascending(&map.distances, &map.times, target_km))
}

/// Distance in km reached after `seconds`, the inverse lookup of
/// [`get_time_at_distance`].
///
/// `None` beyond the recorded time, 0 at or before the start.
pub fn get_distance_at_time(map: &DistanceTimeMap, seconds: f64) -> Option<f64> {
    if map.is_empty() || seconds > map.total_time() {
        return None;
    }
    if seconds <= 0.0 {
        return Some(0.0);
    }
    Some(interpolate_ascending(&map.times, &map.distances, seconds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GpsPoint;
    use chrono::{TimeZone, Utc};

    fn simple_map() -> DistanceTimeMap {
        DistanceTimeMap {
            distances: vec![0.0, 1.0, 2.0],
            times: vec![0.0, 300.0, 600.0],
        }
    }

    fn route_with_times(times: Vec<Option<i64>>) -> Route {
        let n = times.len();
        Route {
            coordinates: (0..n)
                .map(|i| GpsPoint::new(46.0 + i as f64 * 0.001, 7.0))
                .collect(),
            timestamps: times
                .into_iter()
                .map(|t| t.map(|s| Utc.timestamp_opt(1_700_000_000 + s, 0).unwrap()))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_exact_and_interpolated() {
        let map = simple_map();
        assert_eq!(get_time_at_distance(&map, 2.0), Some(600.0));
        assert_eq!(get_time_at_distance(&map, 1.0), Some(300.0));
        assert_eq!(get_time_at_distance(&map, 1.5), Some(450.0));
        assert_eq!(get_time_at_distance(&map, 0.25), Some(75.0));
    }

    #[test]
    fn test_out_of_range() {
        let map = simple_map();
        assert_eq!(get_time_at_distance(&map, 2.0001), None);
        assert_eq!(get_time_at_distance(&map, 0.0), Some(0.0));
        assert_eq!(get_time_at_distance(&map, -1.0), Some(0.0));
    }

    #[test]
    fn test_repeated_distances() {
        // Standing still at 1 km for 60 s
        let map = DistanceTimeMap {
            distances: vec![0.0, 1.0, 1.0, 2.0],
            times: vec![0.0, 300.0, 360.0, 660.0],
        };
        assert_eq!(get_time_at_distance(&map, 1.0), Some(300.0));
        assert_eq!(get_time_at_distance(&map, 1.5), Some(510.0));
    }

    #[test]
    fn test_distance_at_time() {
        let map = simple_map();
        assert_eq!(get_distance_at_time(&map, 450.0), Some(1.5));
        assert_eq!(get_distance_at_time(&map, 601.0), None);
        assert_eq!(get_distance_at_time(&map, 0.0), Some(0.0));
    }

    #[test]
    fn test_build_map() {
        let route = route_with_times(vec![Some(0), Some(30), None, Some(90)]);
        let map = build_time_distance_map(&route).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.distances[0], 0.0);
        assert_eq!(map.times, vec![0.0, 30.0, 90.0]);
        // Distance keeps accumulating across the untimed sample
        assert!((map.distances[2] - 3.0 * 0.111195).abs() < 0.001);
        assert!(map.distances.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_build_map_requires_start_and_two_points() {
        assert!(build_time_distance_map(&route_with_times(vec![None, Some(10), Some(20)])).is_none());
        assert!(build_time_distance_map(&route_with_times(vec![Some(0), None, None])).is_none());
        assert!(build_time_distance_map(&route_with_times(vec![None, None])).is_none());
    }

    #[test]
    fn test_build_map_with_repeated_points_is_monotonic() {
        let mut route = route_with_times(vec![Some(0), Some(1), Some(2), Some(3), Some(4)]);
        route.coordinates[2] = route.coordinates[1];
        route.coordinates[3] = route.coordinates[1];
        let map = build_time_distance_map(&route).unwrap();
        assert!(map.distances.windows(2).all(|w| w[1] >= w[0]));
        assert_eq!(get_time_at_distance(&map, map.distances[1]), Some(1.0));
    }
}
