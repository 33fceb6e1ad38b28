//! Derived per-point and aggregate metrics.
//!
//! Computes instantaneous speed/pace from validated coordinates and
//! timestamps, elevation statistics, duration, and sensor channel summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo_utils::{haversine_distance, total_distance};
use crate::GpsPoint;

/// Aggregate snapshot of a route.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStats {
    /// Total distance in kilometers
    pub distance: f64,
    /// Total climb in meters
    pub elevation_gain: f64,
    /// Total descent in meters
    pub elevation_loss: f64,
    pub min_elevation: f64,
    pub max_elevation: f64,
    /// Seconds between the first and last timestamp, if at least two exist
    pub duration: Option<f64>,
}

/// Elevation gain/loss and range over a series.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ElevationStats {
    pub gain: f64,
    pub loss: f64,
    pub min: f64,
    pub max: f64,
}

/// Average/min/max of one sensor channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    /// Number of present samples
    pub count: usize,
}

/// Seconds elapsed between two instants (fractional).
pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}

/// Elapsed seconds between two optional instants, if both are present.
pub(crate) fn elapsed_seconds(
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Option<f64> {
    Some(seconds_between(from?, to?))
}

/// Instantaneous speed (km/h) and pace (min/km) at every point.
///
/// Index 0 has no predecessor and is always `None`. A point whose segment has
/// zero distance or zero elapsed time also gets `None` for both.
pub fn calculate_speeds_and_paces(
    coordinates: &[GpsPoint],
    timestamps: &[Option<DateTime<Utc>>],
) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    let n = coordinates.len();
    let mut speeds = vec![None; n];
    let mut paces = vec![None; n];

    for i in 1..n {
        let prev_ts = timestamps.get(i - 1).copied().flatten();
        let curr_ts = timestamps.get(i).copied().flatten();
        let Some(seconds) = elapsed_seconds(prev_ts, curr_ts) else {
            continue;
        };

        let distance_km = haversine_distance(&coordinates[i - 1], &coordinates[i]);
        let hours = seconds / 3600.0;
        if hours > 0.0 && distance_km > 0.0 {
            let speed = distance_km / hours;
            speeds[i] = Some(speed);
            paces[i] = Some(60.0 / speed);
        }
    }

    (speeds, paces)
}

/// Elevation gain, loss, min and max over the present samples.
///
/// Missing samples are skipped: the delta is taken between consecutive
/// present values. An empty or all-missing series yields zeros.
pub fn calculate_elevation_stats(elevations: &[Option<f64>]) -> ElevationStats {
    let mut present = elevations.iter().flatten().copied();
    let Some(first) = present.next() else {
        return ElevationStats::default();
    };

    let mut stats = ElevationStats {
        gain: 0.0,
        loss: 0.0,
        min: first,
        max: first,
    };
    let mut prev = first;
    for e in present {
        let delta = e - prev;
        if delta > 0.0 {
            stats.gain += delta;
        } else {
            stats.loss -= delta;
        }
        stats.min = stats.min.min(e);
        stats.max = stats.max.max(e);
        prev = e;
    }
    stats
}

/// Seconds between the first and last present timestamp.
pub fn calculate_duration(timestamps: &[Option<DateTime<Utc>>]) -> Option<f64> {
    let mut present = timestamps.iter().flatten();
    let first = present.next()?;
    let last = present.last()?;
    Some(seconds_between(*first, *last))
}

/// Summary of a sensor channel, `None` if no sample is present.
pub fn summarize_channel(values: &[Option<f64>]) -> Option<ChannelSummary> {
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut min = f64::MAX;
    let mut max = f64::MIN;

    for v in values.iter().flatten() {
        count += 1;
        sum += v;
        min = min.min(*v);
        max = max.max(*v);
    }

    if count == 0 {
        return None;
    }
    Some(ChannelSummary {
        avg: sum / count as f64,
        min,
        max,
        count,
    })
}

/// Mean of the present samples in `values`, `None` if there are none.
pub(crate) fn mean_present(values: &[Option<f64>]) -> Option<f64> {
    summarize_channel(values).map(|s| s.avg)
}

/// Samples `start..=end` of a channel; empty if the channel is shorter.
pub(crate) fn index_window(values: &[Option<f64>], start: usize, end: usize) -> &[Option<f64>] {
    values.get(start..=end).unwrap_or(&[])
}

/// Aggregate route statistics from validated channels.
pub fn calculate_route_stats(
    coordinates: &[GpsPoint],
    elevations: &[Option<f64>],
    timestamps: &[Option<DateTime<Utc>>],
) -> RouteStats {
    let elevation = calculate_elevation_stats(elevations);
    RouteStats {
        distance: total_distance(coordinates),
        elevation_gain: elevation.gain,
        elevation_loss: elevation.loss,
        min_elevation: elevation.min,
        max_elevation: elevation.max,
        duration: calculate_duration(timestamps),
    }
}
