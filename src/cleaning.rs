//! GPS noise rejection for derived speed/pace series.
//!
//! Two independent detectors flag bad samples:
//! - distance jumps: the haversine hop between consecutive fixes implies an
//!   impossible speed
//! - acceleration spikes: the change in reported speed between consecutive
//!   samples implies an impossible acceleration
//!
//! Rejected samples become `None` in both speed and pace, never errors.

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::geo_utils::haversine_distance;
use crate::metrics::elapsed_seconds;
use crate::stats::rolling_median;
use crate::GpsPoint;

/// Default acceleration ceiling in m/s²
pub const DEFAULT_MAX_ACCELERATION: f64 = 10.0;

/// Cleaned speed/pace series plus the indices that survived every check.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanedSeries {
    pub speeds: Vec<Option<f64>>,
    pub paces: Vec<Option<f64>>,
    pub valid_indices: Vec<usize>,
}

/// Flag each transition whose implied speed exceeds `max_speed_kmh`.
///
/// `flags[0]` is always true. A transition that cannot be evaluated (missing
/// timestamp, zero or negative elapsed time) is assumed valid.
pub fn filter_distance_jumps(
    coordinates: &[GpsPoint],
    timestamps: &[Option<DateTime<Utc>>],
    max_speed_kmh: f64,
) -> Vec<bool> {
    let mut flags = vec![true; coordinates.len()];

    for i in 1..coordinates.len() {
        let prev_ts = timestamps.get(i - 1).copied().flatten();
        let curr_ts = timestamps.get(i).copied().flatten();
        let Some(seconds) = elapsed_seconds(prev_ts, curr_ts) else {
            continue;
        };
        if seconds <= 0.0 {
            continue;
        }

        let distance_km = haversine_distance(&coordinates[i - 1], &coordinates[i]);
        let implied_kmh = distance_km / seconds * 3600.0;
        if implied_kmh > max_speed_kmh {
            flags[i] = false;
        }
    }

    flags
}

/// Reject the later sample of any pair whose acceleration exceeds
/// `max_acceleration` (m/s²).
///
/// Accelerations are always computed from the raw input speeds, so one bad
/// sample can reject at most itself and its successor. Pairs with a missing
/// speed or timestamp pass through unchanged.
pub fn filter_acceleration_spikes(
    speeds: &[Option<f64>],
    timestamps: &[Option<DateTime<Utc>>],
    max_acceleration: f64,
) -> Vec<Option<f64>> {
    let mut result = speeds.to_vec();

    for i in 1..speeds.len() {
        let (Some(prev_speed), Some(curr_speed)) = (speeds[i - 1], speeds[i]) else {
            continue;
        };
        let prev_ts = timestamps.get(i - 1).copied().flatten();
        let curr_ts = timestamps.get(i).copied().flatten();
        let Some(seconds) = elapsed_seconds(prev_ts, curr_ts) else {
            continue;
        };
        if seconds <= 0.0 {
            continue;
        }

        let delta_ms = (curr_speed - prev_speed) / 3.6;
        let acceleration = delta_ms / seconds;
        if acceleration.abs() > max_acceleration {
            result[i] = None;
        }
    }

    result
}

/// Combine both detectors with a plausible-speed range check.
///
/// A point is invalidated (speed and pace both `None`) when its distance-jump
/// flag is false, its acceleration-filtered speed is `None`, or its raw speed
/// lies outside `[0, max_speed]`.
pub fn clean_gps_data(
    speeds: &[Option<f64>],
    paces: &[Option<f64>],
    coordinates: &[GpsPoint],
    timestamps: &[Option<DateTime<Utc>>],
    max_speed: f64,
    max_acceleration: f64,
) -> CleanedSeries {
    let jump_flags = filter_distance_jumps(coordinates, timestamps, max_speed);
    let accel_filtered = filter_acceleration_spikes(speeds, timestamps, max_acceleration);

    let n = speeds.len();
    let mut out = CleanedSeries {
        speeds: Vec::with_capacity(n),
        paces: Vec::with_capacity(n),
        valid_indices: Vec::new(),
    };

    for i in 0..n {
        let jump_ok = jump_flags.get(i).copied().unwrap_or(true);
        let in_range = matches!(speeds[i], Some(s) if (0.0..=max_speed).contains(&s));
        let valid = jump_ok && accel_filtered[i].is_some() && in_range;

        if valid {
            out.speeds.push(speeds[i]);
            out.paces.push(paces.get(i).copied().flatten());
            out.valid_indices.push(i);
        } else {
            out.speeds.push(None);
            out.paces.push(None);
        }
    }

    debug!(
        "[Clean] {} of {} samples kept (max speed {} km/h)",
        out.valid_indices.len(),
        n,
        max_speed
    );

    out
}

/// Rolling-median smoothing of a cleaned series.
pub fn smooth_series(values: &[Option<f64>], window_size: usize) -> Vec<Option<f64>> {
    rolling_median(values, window_size)
}
