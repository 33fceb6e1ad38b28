//! Best efforts: the fastest contiguous stretch of a route for fixed distances.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::metrics::{calculate_elevation_stats, index_window, seconds_between};
use crate::Route;

const HALF_MARATHON_KM: f64 = 21.0975;
const MARATHON_KM: f64 = 42.195;

/// Distances within this many km of a race distance get the race name
const LABEL_TOLERANCE_KM: f64 = 0.1;

/// Fastest stretch found for one target distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestEffort {
    /// Target distance in km
    pub distance: f64,
    pub distance_label: String,
    /// min/km
    pub pace: f64,
    /// Seconds, scaled to exactly `distance`
    pub duration: f64,
    pub start_km: f64,
    pub end_km: f64,
    pub elevation_gain: f64,
}

/// Human label for an effort distance: "400m", "5km", "Half Marathon".
pub fn get_distance_label(km: f64) -> String {
    if (km - HALF_MARATHON_KM).abs() < LABEL_TOLERANCE_KM {
        "Half Marathon".to_string()
    } else if (km - MARATHON_KM).abs() < LABEL_TOLERANCE_KM {
        "Marathon".to_string()
    } else if km < 1.0 {
        format!("{}m", (km * 1000.0).round() as i64)
    } else {
        format!("{}km", km.round() as i64)
    }
}

/// A timestamped sample: route index, cumulative km, elapsed seconds.
#[derive(Debug, Clone, Copy)]
struct TimedSample {
    index: usize,
    distance: f64,
    time: f64,
}

fn timed_samples(route: &Route) -> Vec<TimedSample> {
    let cumulative = route.cumulative_distances();
    let Some(start) = route.timestamps.iter().flatten().next().copied() else {
        return Vec::new();
    };

    cumulative
        .iter()
        .enumerate()
        .filter_map(|(index, &distance)| {
            let ts = route.timestamps.get(index).copied().flatten()?;
            Some(TimedSample {
                index,
                distance,
                time: seconds_between(start, ts),
            })
        })
        .collect()
}

/// Fastest window covering `target_km`, as (start sample, end sample, scaled seconds).
///
/// Two pointers over the samples: for each end, the start moves forward as
/// long as the window would still cover the target.
fn fastest_window(samples: &[TimedSample], target_km: f64) -> Option<(usize, usize, f64)> {
    let mut best: Option<(usize, usize, f64)> = None;
    let mut start = 0;

    for end in 1..samples.len() {
        while start + 1 < end && samples[end].distance - samples[start + 1].distance >= target_km {
            start += 1;
        }

        let covered = samples[end].distance - samples[start].distance;
        let elapsed = samples[end].time - samples[start].time;
        if covered < target_km || elapsed <= 0.0 {
            continue;
        }

        let scaled = elapsed * target_km / covered;
        if best.map_or(true, |(_, _, b)| scaled < b) {
            best = Some((start, end, scaled));
        }
    }

    best
}

/// Best efforts over `targets` (km).
///
/// Needs timestamps; returns an empty list without them. Targets longer than
/// the route are skipped.
pub fn calculate_best_efforts(route: &Route, targets: &[f64]) -> Vec<BestEffort> {
    let samples = timed_samples(route);
    if samples.len() < 2 {
        return Vec::new();
    }
    let total = samples.last().map_or(0.0, |s| s.distance);

    let efforts: Vec<BestEffort> = targets
        .iter()
        .copied()
        .filter(|&target| target > 0.0 && target <= total)
        .filter_map(|target| {
            let (s, e, duration) = fastest_window(&samples, target)?;
            let (from, to) = (samples[s], samples[e]);
            Some(BestEffort {
                distance: target,
                distance_label: get_distance_label(target),
                pace: duration / 60.0 / target,
                duration,
                start_km: from.distance,
                end_km: to.distance,
                elevation_gain: calculate_elevation_stats(index_window(
                    &route.elevations,
                    from.index,
                    to.index,
                ))
                .gain,
            })
        })
        .collect();

    debug!(
        "[Efforts] '{}': {} of {} target distances found",
        route.id,
        efforts.len(),
        targets.len()
    );
    efforts
}
