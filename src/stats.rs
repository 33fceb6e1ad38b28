//! Robust statistics over numeric series.
//!
//! Median/MAD based helpers used by the cleaning stage. All functions take
//! borrowed slices and return owned results; inputs are never reordered.

use serde::{Deserialize, Serialize};

/// Median and median absolute deviation of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MadResult {
    pub median: f64,
    pub mad: f64,
}

/// Scale factor turning MAD into a standard-deviation estimate for the
/// modified z-score (Iglewicz & Hoaglin).
const MAD_Z_SCALE: f64 = 0.6745;

/// Minimum series length for outlier filtering to kick in
const MIN_OUTLIER_SAMPLES: usize = 4;

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

fn median_of_sorted(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let mid = n / 2;
    if n % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Linear-interpolated quantile of an already sorted, non-empty slice.
fn quantile_of_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * q;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Median of a series. `None` for an empty series.
///
/// # Example
/// ```
/// use route_analytics::stats::median;
///
/// assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
/// assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
/// assert_eq!(median(&[]), None);
/// ```
pub fn median(values: &[f64]) -> Option<f64> {
    median_of_sorted(&sorted_copy(values))
}

/// Median and median absolute deviation. `None` for an empty series.
pub fn calculate_mad(values: &[f64]) -> Option<MadResult> {
    let med = median(values)?;
    let deviations: Vec<f64> = values.iter().map(|v| (v - med).abs()).collect();
    let mad = median(&deviations)?;
    Some(MadResult { median: med, mad })
}

/// Remove values outside the Tukey fence `[Q1 - k*IQR, Q3 + k*IQR]`.
///
/// Series shorter than 4 values are returned unchanged.
pub fn filter_outliers_iqr(values: &[f64], multiplier: f64) -> Vec<f64> {
    if values.len() < MIN_OUTLIER_SAMPLES {
        return values.to_vec();
    }

    let sorted = sorted_copy(values);
    let q1 = quantile_of_sorted(&sorted, 0.25);
    let q3 = quantile_of_sorted(&sorted, 0.75);
    let iqr = q3 - q1;
    let lower = q1 - multiplier * iqr;
    let upper = q3 + multiplier * iqr;

    values
        .iter()
        .copied()
        .filter(|v| *v >= lower && *v <= upper)
        .collect()
}

/// Remove values whose modified z-score `0.6745 * |x - median| / MAD`
/// exceeds `threshold`.
///
/// Series shorter than 4 values, or with zero MAD, are returned unchanged.
pub fn filter_outliers_mad(values: &[f64], threshold: f64) -> Vec<f64> {
    if values.len() < MIN_OUTLIER_SAMPLES {
        return values.to_vec();
    }
    let Some(MadResult { median, mad }) = calculate_mad(values) else {
        return values.to_vec();
    };
    if mad == 0.0 {
        return values.to_vec();
    }

    values
        .iter()
        .copied()
        .filter(|v| MAD_Z_SCALE * (v - median).abs() / mad <= threshold)
        .collect()
}

/// Centered rolling median over a series with missing samples.
///
/// The window spans `window_size / 2` samples on either side and is clipped at
/// the ends. Missing samples are ignored; a window with no present samples
/// passes the original value through.
///
/// # Example
/// ```
/// use route_analytics::stats::rolling_median;
///
/// let speeds = [Some(10.0), Some(11.0), Some(50.0), Some(12.0), Some(11.0)];
/// assert_eq!(rolling_median(&speeds, 3)[2], Some(12.0));
/// ```
pub fn rolling_median(values: &[Option<f64>], window_size: usize) -> Vec<Option<f64>> {
    let half = window_size / 2;
    let mut window: Vec<f64> = Vec::with_capacity(window_size + 1);

    (0..values.len())
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(values.len());

            window.clear();
            window.extend(values[start..end].iter().flatten().copied());

            if window.is_empty() {
                return values[i];
            }
            window.sort_by(|a, b| a.total_cmp(b));
            median_of_sorted(&window).or(values[i])
        })
        .collect()
}
