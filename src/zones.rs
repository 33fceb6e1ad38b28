//! Time-in-zone distribution for heart rate, power, pace and other channels.
//!
//! Zones are five equal-width bins over the observed `[min, max]` range of the
//! series, not thresholds from a physiological test. Each sample carries the
//! time elapsed since the previous sample, so irregular recording intervals
//! weigh correctly.
//!
//! ## Example
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use route_analytics::zones::{calculate_zones, ZoneMetric};
//!
//! let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
//! let hr: Vec<Option<f64>> = (0..20).map(|i| Some(120.0 + i as f64 * 3.0)).collect();
//! let ts: Vec<_> = (0..20).map(|i| Some(start + chrono::Duration::seconds(i))).collect();
//!
//! let dist = calculate_zones(&hr, &ts, ZoneMetric::HeartRate).unwrap();
//! assert_eq!(dist.zones.iter().map(|z| z.percent).sum::<u32>(), 100);
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{Result, RouteAnalyticsError};
use crate::metrics::elapsed_seconds;
use crate::Route;

pub const ZONE_COUNT: usize = 5;

/// Minimum number of present samples for a distribution
pub const MIN_ZONE_SAMPLES: usize = 10;

const ZONE_NAMES: [&str; ZONE_COUNT] = ["Recovery", "Endurance", "Tempo", "Threshold", "Max"];

/// Channel a distribution is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ZoneMetric {
    HeartRate,
    Power,
    /// min/km: lower values are harder
    Pace,
    Speed,
    Cadence,
}

impl ZoneMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneMetric::HeartRate => "heartRate",
            ZoneMetric::Power => "power",
            ZoneMetric::Pace => "pace",
            ZoneMetric::Speed => "speed",
            ZoneMetric::Cadence => "cadence",
        }
    }

    /// Display name of zone `index` (0-4).
    pub fn zone_name(&self, index: usize) -> &'static str {
        let index = index.min(ZONE_COUNT - 1);
        match self {
            ZoneMetric::Pace => ZONE_NAMES[ZONE_COUNT - 1 - index],
            _ => ZONE_NAMES[index],
        }
    }

    /// Per-point channel of `route` this metric reads.
    pub fn channel<'a>(&self, route: &'a Route) -> &'a [Option<f64>] {
        match self {
            ZoneMetric::HeartRate => &route.heart_rates,
            ZoneMetric::Power => &route.powers,
            ZoneMetric::Pace => &route.paces,
            ZoneMetric::Speed => &route.speeds,
            ZoneMetric::Cadence => &route.cadences,
        }
    }
}

impl fmt::Display for ZoneMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZoneMetric {
    type Err = RouteAnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "heartRate" | "heart_rate" | "hr" => Ok(ZoneMetric::HeartRate),
            "power" => Ok(ZoneMetric::Power),
            "pace" => Ok(ZoneMetric::Pace),
            "speed" => Ok(ZoneMetric::Speed),
            "cadence" => Ok(ZoneMetric::Cadence),
            other => Err(RouteAnalyticsError::Parse {
                message: format!("unknown zone metric '{}'", other),
            }),
        }
    }
}

/// One of the five zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneBucket {
    pub index: usize,
    pub name: String,
    /// Lower bound (inclusive)
    pub min: f64,
    /// Upper bound (exclusive, inclusive for the last zone)
    pub max: f64,
    /// Time spent in the zone
    pub seconds: f64,
    /// Integer share of total time; all zones sum to 100
    pub percent: u32,
}

/// Time-weighted zone distribution of one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneDistribution {
    pub zones: [ZoneBucket; ZONE_COUNT],
    /// Index of the zone with the highest percentage
    pub dominant_zone: usize,
    pub metric: ZoneMetric,
    pub min_val: f64,
    pub max_val: f64,
}

impl ZoneDistribution {
    /// Percentage for zone `index` (0-4), 0 when out of range.
    pub fn get_zone_percent(&self, index: usize) -> u32 {
        self.zones.get(index).map_or(0, |z| z.percent)
    }

    pub fn total_seconds(&self) -> f64 {
        self.zones.iter().map(|z| z.seconds).sum()
    }
}

/// Value range and bin width of a series.
#[derive(Debug, Clone, Copy)]
struct ZoneBounds {
    min: f64,
    max: f64,
    width: f64,
}

impl ZoneBounds {
    fn from_values(values: &[Option<f64>]) -> Option<Self> {
        let mut count = 0usize;
        let mut min = f64::MAX;
        let mut max = f64::MIN;
        for v in values.iter().flatten() {
            count += 1;
            min = min.min(*v);
            max = max.max(*v);
        }
        if count < MIN_ZONE_SAMPLES {
            return None;
        }
        Some(Self {
            min,
            max,
            width: (max - min) / ZONE_COUNT as f64,
        })
    }

    /// Zone of `value`; the maximum lands in the last zone and a flat series
    /// in the first.
    fn zone_of(&self, value: f64) -> usize {
        if self.width <= 0.0 {
            return 0;
        }
        let idx = ((value - self.min) / self.width).floor();
        if idx <= 0.0 {
            0
        } else {
            (idx as usize).min(ZONE_COUNT - 1)
        }
    }
}

/// Seconds from the previous sample attributed to sample `i`, with its zone.
fn weighted_sample(
    bounds: &ZoneBounds,
    values: &[Option<f64>],
    timestamps: &[Option<DateTime<Utc>>],
    i: usize,
) -> Option<(usize, f64)> {
    let value = values.get(i).copied().flatten()?;
    let dt = elapsed_seconds(
        timestamps.get(i - 1).copied().flatten(),
        timestamps.get(i).copied().flatten(),
    )?;
    (dt > 0.0).then(|| (bounds.zone_of(value), dt))
}

fn accumulate_seconds(
    bounds: &ZoneBounds,
    values: &[Option<f64>],
    timestamps: &[Option<DateTime<Utc>>],
) -> [f64; ZONE_COUNT] {
    let mut seconds = [0.0f64; ZONE_COUNT];
    for i in 1..values.len() {
        if let Some((zone, dt)) = weighted_sample(bounds, values, timestamps, i) {
            seconds[zone] += dt;
        }
    }
    seconds
}

/// Index of the first largest value.
fn largest(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// Round shares to integers that sum to exactly 100, putting the rounding
/// residual on the largest zone.
fn rounded_percents(seconds: &[f64; ZONE_COUNT], total: f64) -> [u32; ZONE_COUNT] {
    let mut percents = seconds.map(|s| (s / total * 100.0).round() as i64);
    let residual = 100 - percents.iter().sum::<i64>();
    percents[largest(seconds)] += residual;
    percents.map(|p| p.max(0) as u32)
}

fn build_distribution(
    bounds: ZoneBounds,
    seconds: [f64; ZONE_COUNT],
    metric: ZoneMetric,
) -> Option<ZoneDistribution> {
    let total: f64 = seconds.iter().sum();
    if total <= 0.0 {
        return None;
    }
    let percents = rounded_percents(&seconds, total);

    let zones = std::array::from_fn(|i| ZoneBucket {
        index: i,
        name: metric.zone_name(i).to_string(),
        min: bounds.min + bounds.width * i as f64,
        max: if i == ZONE_COUNT - 1 {
            bounds.max
        } else {
            bounds.min + bounds.width * (i + 1) as f64
        },
        seconds: seconds[i],
        percent: percents[i],
    });
    let dominant_zone = largest(&percents.map(f64::from));

    Some(ZoneDistribution {
        zones,
        dominant_zone,
        metric,
        min_val: bounds.min,
        max_val: bounds.max,
    })
}

/// Time-in-zone distribution of `values`.
///
/// Returns `None` with fewer than 10 present values or when no consecutive
/// pair has a positive elapsed time.
pub fn calculate_zones(
    values: &[Option<f64>],
    timestamps: &[Option<DateTime<Utc>>],
    metric: ZoneMetric,
) -> Option<ZoneDistribution> {
    let bounds = ZoneBounds::from_values(values)?;
    let seconds = accumulate_seconds(&bounds, values, timestamps);
    let distribution = build_distribution(bounds, seconds, metric)?;

    info!(
        "[Zones] {} zones over {} samples, range {:.1}-{:.1}, dominant {}",
        metric,
        values.len(),
        distribution.min_val,
        distribution.max_val,
        distribution.zones[distribution.dominant_zone].name
    );
    Some(distribution)
}

/// Zone distribution of one of a route's channels.
pub fn calculate_route_zones(route: &Route, metric: ZoneMetric) -> Option<ZoneDistribution> {
    calculate_zones(metric.channel(route), &route.timestamps, metric)
}

/// [`calculate_zones`] with the time accumulation split across threads.
/// Falls back to the sequential version below 10,000 samples.
#[cfg(feature = "parallel")]
pub fn calculate_zones_parallel(
    values: &[Option<f64>],
    timestamps: &[Option<DateTime<Utc>>],
    metric: ZoneMetric,
) -> Option<ZoneDistribution> {
    if values.len() < 10_000 {
        return calculate_zones(values, timestamps, metric);
    }

    let bounds = ZoneBounds::from_values(values)?;
    let seconds = (1..values.len())
        .into_par_iter()
        .fold(
            || [0.0f64; ZONE_COUNT],
            |mut acc, i| {
                if let Some((zone, dt)) = weighted_sample(&bounds, values, timestamps, i) {
                    acc[zone] += dt;
                }
                acc
            },
        )
        .reduce(
            || [0.0f64; ZONE_COUNT],
            |mut a, b| {
                for i in 0..ZONE_COUNT {
                    a[i] += b[i];
                }
                a
            },
        );

    build_distribution(bounds, seconds, metric)
}
