//! Display preparation: smoothing and point reduction before charting.
//!
//! Charts should show roughly the same number of points regardless of route
//! length, so both the smoothing window and the decimation factor grow with
//! distance.

use geo::{algorithm::simplify::Simplify, Coord, LineString};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::GpsPoint;

/// Smoothing window and decimation factor for one route length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmoothingParams {
    pub window_size: usize,
    pub decimation_factor: usize,
}

/// A chart-ready series with its distance axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub data: Vec<Option<f64>>,
    pub distances: Vec<f64>,
}

/// Pick smoothing parameters for a route of `total_distance_km`.
pub fn get_adaptive_smoothing_params(total_distance_km: f64) -> SmoothingParams {
    let (window_size, decimation_factor) = if total_distance_km < 10.0 {
        (50, 5)
    } else if total_distance_km < 25.0 {
        (100, 10)
    } else if total_distance_km < 50.0 {
        (200, 15)
    } else if total_distance_km < 100.0 {
        (300, 25)
    } else {
        (500, 50)
    };
    SmoothingParams {
        window_size,
        decimation_factor,
    }
}

/// Centered moving average, clipped at the ends.
///
/// Missing samples are left out of each average; a sample whose window holds
/// no present value keeps its original value. Series shorter than the window
/// are returned unchanged.
pub fn smooth_data(data: &[Option<f64>], window_size: usize) -> Vec<Option<f64>> {
    if data.len() < window_size {
        return data.to_vec();
    }
    let half = window_size / 2;

    (0..data.len())
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(data.len());
            let (sum, count) = data[start..end]
                .iter()
                .flatten()
                .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
            if count > 0 {
                Some(sum / count as f64)
            } else {
                data[i]
            }
        })
        .collect()
}

/// Keep the first point, the last point and every `factor`-th point between.
///
/// Series of `factor * 2` points or fewer are returned unchanged.
pub fn decimate_data<T: Clone>(
    data: &[T],
    distances: &[f64],
    factor: usize,
) -> (Vec<T>, Vec<f64>) {
    let n = data.len().min(distances.len());
    if factor == 0 || n <= factor * 2 {
        return (data.to_vec(), distances.to_vec());
    }

    let mut out_data = Vec::with_capacity(n / factor + 2);
    let mut out_distances = Vec::with_capacity(n / factor + 2);
    for i in (0..n - 1).step_by(factor) {
        out_data.push(data[i].clone());
        out_distances.push(distances[i]);
    }
    out_data.push(data[n - 1].clone());
    out_distances.push(distances[n - 1]);

    (out_data, out_distances)
}

/// Smooth then decimate a per-point series using the adaptive parameters
/// for `total_distance_km`.
pub fn prepare_chart_series(
    data: &[Option<f64>],
    distances: &[f64],
    total_distance_km: f64,
) -> ChartSeries {
    let params = get_adaptive_smoothing_params(total_distance_km);
    let smoothed = smooth_data(data, params.window_size);
    let (data, distances) = decimate_data(&smoothed, distances, params.decimation_factor);
    debug!(
        "[Display] {:.1} km series reduced to {} points (window {}, factor {})",
        total_distance_km,
        data.len(),
        params.window_size,
        params.decimation_factor
    );
    ChartSeries { data, distances }
}

/// Douglas-Peucker simplification of a map polyline.
///
/// `tolerance` is in degrees (0.0001 ~ 11 m). Endpoints are always kept.
pub fn simplify_polyline(points: &[GpsPoint], tolerance: f64) -> Vec<GpsPoint> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let line = LineString::new(
        points
            .iter()
            .map(|p| Coord {
                x: p.longitude,
                y: p.latitude,
            })
            .collect(),
    );

    line.simplify(&tolerance)
        .coords()
        .map(|c| GpsPoint::new(c.y, c.x))
        .collect()
}
