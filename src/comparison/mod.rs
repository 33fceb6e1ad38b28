//! # Route Comparison
//!
//! Distance-domain analysis of one or more routes.
//!
//! ## Algorithms
//! - **Time gaps**: sample every route's distance-time map at a fixed distance
//!   step and report how far behind (or ahead of) the reference each
//!   comparison route was at that point
//! - **Splits**: fixed-length distance windows with pace, climb and heart rate
//! - **Segments**: the same metrics for an arbitrary `[start, end)` window
//! - **Best efforts**: fastest contiguous stretch for canonical distances
//! - **Steep sections**: contiguous climbs and descents above a grade
//!
//! Alignment assumes the routes follow the same course. Routes that diverge
//! (a shortcut, a detour) are still aligned by distance alone.

mod efforts;
mod splits;
mod steep;

use log::{debug, info};
use serde::{Deserialize, Serialize};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::time_index::{build_time_distance_map, get_time_at_distance, DistanceTimeMap};
use crate::Route;

pub use efforts::{calculate_best_efforts, get_distance_label, BestEffort};
pub use splits::{
    calculate_segment_metrics, calculate_splits, find_index_at_distance, SegmentMetrics, Split,
};
pub use steep::{detect_steep_sections, SteepSection, SteepSections};

/// Upper bound for a plausible pace in min/km; slower windows are treated as
/// stopped rather than moving.
pub(crate) const MAX_PACE_MIN_PER_KM: f64 = 30.0;

/// Gap of one comparison route at one sampled distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteGap {
    pub route_id: String,
    /// Position of the route in the `comparisons` argument
    pub route_index: usize,
    /// Seconds; positive means the comparison route was behind (slower)
    pub gap: f64,
}

/// All comparison gaps at one sampled distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapSample {
    /// Distance from the start in km
    pub distance: f64,
    pub gaps: Vec<RouteGap>,
}

/// Time-gap series of N comparison routes against a reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeGapResult {
    pub reference_route: String,
    pub gaps: Vec<GapSample>,
    /// Common distance range in km (shortest of all mapped routes)
    pub max_distance: f64,
}

fn build_comparison_maps(comparisons: &[Route]) -> Vec<Option<DistanceTimeMap>> {
    #[cfg(feature = "parallel")]
    {
        comparisons.par_iter().map(build_time_distance_map).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        comparisons.iter().map(build_time_distance_map).collect()
    }
}

/// Compare routes against a reference at fixed distance steps.
///
/// Comparison routes without a usable distance-time map are dropped. Returns
/// `None` if the reference has no map or no comparison route has one.
pub fn calculate_time_gaps(
    reference: &Route,
    comparisons: &[Route],
    sample_interval: f64,
) -> Option<TimeGapResult> {
    if !(sample_interval > 0.0) {
        return None;
    }
    let reference_map = build_time_distance_map(reference)?;

    let comparison_maps: Vec<(usize, &Route, DistanceTimeMap)> = build_comparison_maps(comparisons)
        .into_iter()
        .zip(comparisons)
        .enumerate()
        .filter_map(|(i, (map, route))| map.map(|m| (i, route, m)))
        .collect();

    if comparison_maps.is_empty() {
        debug!(
            "[Compare] No comparison route of {} has timestamps",
            comparisons.len()
        );
        return None;
    }

    let max_distance = comparison_maps
        .iter()
        .map(|(_, _, m)| m.max_distance())
        .fold(reference_map.max_distance(), f64::min);

    // Multiply instead of accumulating so long routes don't drift
    let steps = (max_distance / sample_interval + 1e-9).floor() as usize;
    let mut samples = Vec::with_capacity(steps + 1);

    for k in 0..=steps {
        let distance = (k as f64 * sample_interval).min(max_distance);
        let Some(reference_time) = get_time_at_distance(&reference_map, distance) else {
            continue;
        };

        let gaps: Vec<RouteGap> = comparison_maps
            .iter()
            .filter_map(|(i, route, map)| {
                get_time_at_distance(map, distance).map(|t| RouteGap {
                    route_id: route.id.clone(),
                    route_index: *i,
                    gap: t - reference_time,
                })
            })
            .collect();

        if !gaps.is_empty() {
            samples.push(GapSample { distance, gaps });
        }
    }

    info!(
        "[Compare] Time gaps for '{}' vs {} routes: {} samples over {:.2} km",
        reference.id,
        comparison_maps.len(),
        samples.len(),
        max_distance
    );

    Some(TimeGapResult {
        reference_route: reference.id.clone(),
        gaps: samples,
        max_distance,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{GpsPoint, Route};
    use chrono::{TimeZone, Utc};

    /// Straight route northwards with one fix per `step_km`, covering each
    /// step in `seconds_per_step`.
    pub fn synthetic_route(id: &str, points: usize, step_km: f64, seconds_per_step: f64) -> Route {
        // One degree of latitude ~ 111.195 km
        let step_deg = step_km / 111.195;
        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        Route {
            id: id.to_string(),
            coordinates: (0..points)
                .map(|i| GpsPoint::new(46.0 + i as f64 * step_deg, 7.0))
                .collect(),
            elevations: vec![Some(400.0); points],
            timestamps: (0..points)
                .map(|i| {
                    let ms = (i as f64 * seconds_per_step * 1000.0).round() as i64;
                    Some(start + chrono::Duration::milliseconds(ms))
                })
                .collect(),
            heart_rates: vec![Some(150.0); points],
            cadences: vec![None; points],
            powers: vec![None; points],
            speeds: vec![None; points],
            paces: vec![None; points],
            ..Default::default()
        }
    }
}
