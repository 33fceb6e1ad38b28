//! The route entity and the import pipeline that builds it.
//!
//! ```text
//! ParsedRoute -> validate -> derive speed/pace + stats -> clean -> smooth -> Route
//! ```

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::cleaning::{clean_gps_data, smooth_series};
use crate::config::CleaningConfig;
use crate::error::{Result, RouteAnalyticsError};
use crate::geo_utils::cumulative_distances;
use crate::metrics::{
    calculate_route_stats, calculate_speeds_and_paces, summarize_channel, ChannelSummary,
    RouteStats,
};
use crate::validation::{validate_parsed_data, ParsedRoute};
use crate::GpsPoint;

/// A validated, cleaned activity recording.
///
/// All per-point vectors share one length and are index-aligned: index `i`
/// of every channel describes the same physical sample.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: String,
    pub name: Option<String>,
    pub coordinates: Vec<GpsPoint>,
    /// Meters
    pub elevations: Vec<Option<f64>>,
    pub timestamps: Vec<Option<DateTime<Utc>>>,
    pub heart_rates: Vec<Option<f64>>,
    pub cadences: Vec<Option<f64>>,
    pub powers: Vec<Option<f64>>,
    /// km/h, derived then cleaned
    pub speeds: Vec<Option<f64>>,
    /// min/km, `None` wherever speed is `None`
    pub paces: Vec<Option<f64>>,
    pub stats: RouteStats,
    /// Points dropped by validation
    pub skipped: usize,
    pub warnings: Vec<String>,
}

/// Sensor and speed summaries used to compare routes side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
    pub id: String,
    pub stats: RouteStats,
    /// km/h over the whole route (distance / duration)
    pub avg_speed: Option<f64>,
    /// min/km over the whole route
    pub avg_pace: Option<f64>,
    pub speed: Option<ChannelSummary>,
    pub heart_rate: Option<ChannelSummary>,
    pub cadence: Option<ChannelSummary>,
    pub power: Option<ChannelSummary>,
}

impl Route {
    /// Build a route from parser output with the default cleaning settings.
    pub fn from_parsed(raw: &ParsedRoute) -> Result<Self> {
        Self::from_parsed_with_config(raw, &CleaningConfig::default())
    }

    /// Build a route from parser output.
    ///
    /// Fails only when the input has no points or every point was rejected;
    /// everything else degrades to `None` fields and warnings.
    pub fn from_parsed_with_config(raw: &ParsedRoute, config: &CleaningConfig) -> Result<Self> {
        if raw.coordinates.is_empty() {
            return Err(RouteAnalyticsError::EmptyRoute {
                route_id: raw.id.clone(),
            });
        }

        let data = validate_parsed_data(raw);
        if data.is_empty() {
            return Err(RouteAnalyticsError::NoUsablePoints {
                route_id: raw.id.clone(),
                skipped: data.skipped,
            });
        }

        let (raw_speeds, raw_paces) =
            calculate_speeds_and_paces(&data.coordinates, &data.timestamps);
        let stats = calculate_route_stats(&data.coordinates, &data.elevations, &data.timestamps);

        let cleaned = clean_gps_data(
            &raw_speeds,
            &raw_paces,
            &data.coordinates,
            &data.timestamps,
            config.max_speed_kmh,
            config.max_acceleration,
        );
        let speeds = smooth_series(&cleaned.speeds, config.smoothing_window);
        let paces = smooth_series(&cleaned.paces, config.smoothing_window);

        info!(
            "[Route] Imported '{}': {} points ({} skipped), {:.2} km, {} clean speed samples",
            raw.id,
            data.coordinates.len(),
            data.skipped,
            stats.distance,
            cleaned.valid_indices.len()
        );

        Ok(Self {
            id: raw.id.clone(),
            name: raw.name.clone(),
            coordinates: data.coordinates,
            elevations: data.elevations,
            timestamps: data.timestamps,
            heart_rates: data.heart_rates,
            cadences: data.cadences,
            powers: data.powers,
            speeds,
            paces,
            stats,
            skipped: data.skipped,
            warnings: data.warnings,
        })
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// Whether any point carries a timestamp.
    pub fn has_timestamps(&self) -> bool {
        self.timestamps.iter().any(|t| t.is_some())
    }

    /// Cumulative distance in km at every point.
    pub fn cumulative_distances(&self) -> Vec<f64> {
        cumulative_distances(&self.coordinates)
    }

    /// Aggregate summaries for side-by-side comparison.
    pub fn summary(&self) -> RouteSummary {
        let avg_speed = self
            .stats
            .duration
            .filter(|d| *d > 0.0 && self.stats.distance > 0.0)
            .map(|d| self.stats.distance / (d / 3600.0));

        RouteSummary {
            id: self.id.clone(),
            stats: self.stats,
            avg_speed,
            avg_pace: avg_speed.map(|s| 60.0 / s),
            speed: summarize_channel(&self.speeds),
            heart_rate: summarize_channel(&self.heart_rates),
            cadence: summarize_channel(&self.cadences),
            power: summarize_channel(&self.powers),
        }
    }
}
