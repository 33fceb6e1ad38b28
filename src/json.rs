//! JSON entry points for UI collaborators.
//!
//! Input parsing failures are errors. Analytical null results serialize as
//! the JSON literal `null` so the caller can explain them to the user.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::comparison::{
    calculate_best_efforts, calculate_segment_metrics, calculate_splits, calculate_time_gaps,
    detect_steep_sections, BestEffort, Split, SteepSections,
};
use crate::config::{AnalyticsConfig, SteepConfig};
use crate::error::Result;
use crate::route::{Route, RouteSummary};
use crate::validation::ParsedRoute;
use crate::zones::{calculate_route_zones, ZoneDistribution, ZoneMetric};

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        warn!("[Json] Serialization failed: {}", e);
        "null".to_string()
    })
}

/// Build a route from a parser's JSON output with default cleaning.
pub fn route_from_json(json: &str) -> Result<Route> {
    route_from_json_with_config(json, &AnalyticsConfig::default())
}

pub fn route_from_json_with_config(json: &str, config: &AnalyticsConfig) -> Result<Route> {
    let parsed: ParsedRoute = serde_json::from_str(json)?;
    Route::from_parsed_with_config(&parsed, &config.cleaning)
}

pub fn time_gaps_json(reference: &Route, comparisons: &[Route], sample_interval: f64) -> String {
    to_json(&calculate_time_gaps(reference, comparisons, sample_interval))
}

pub fn splits_json(route: &Route, split_km: f64) -> String {
    to_json(&calculate_splits(route, split_km))
}

pub fn segment_json(route: &Route, start_km: f64, end_km: f64) -> String {
    to_json(&calculate_segment_metrics(route, start_km, end_km))
}

pub fn best_efforts_json(route: &Route, targets: &[f64]) -> String {
    to_json(&calculate_best_efforts(route, targets))
}

pub fn steep_sections_json(route: &Route, config: &SteepConfig) -> String {
    to_json(&detect_steep_sections(route, config.min_length_m, config.min_grade))
}

/// Zone distribution of the channel named by `metric` ("heartRate", "power",
/// "pace", "speed", "cadence"). Unknown names give `null`.
pub fn zones_json(route: &Route, metric: &str) -> String {
    match metric.parse::<ZoneMetric>() {
        Ok(metric) => to_json(&calculate_route_zones(route, metric)),
        Err(e) => {
            warn!("[Json] {}", e);
            "null".to_string()
        }
    }
}

/// Everything the activity screen shows for one route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteReport {
    pub summary: RouteSummary,
    pub splits: Vec<Split>,
    pub best_efforts: Vec<BestEffort>,
    pub steep_sections: SteepSections,
    pub heart_rate_zones: Option<ZoneDistribution>,
    pub pace_zones: Option<ZoneDistribution>,
    pub warnings: Vec<String>,
}

impl RouteReport {
    pub fn new(route: &Route, config: &AnalyticsConfig) -> Self {
        Self {
            summary: route.summary(),
            splits: calculate_splits(route, config.comparison.split_km),
            best_efforts: calculate_best_efforts(route, &config.comparison.best_effort_distances),
            steep_sections: detect_steep_sections(
                route,
                config.steep.min_length_m,
                config.steep.min_grade,
            ),
            heart_rate_zones: calculate_route_zones(route, ZoneMetric::HeartRate),
            pace_zones: calculate_route_zones(route, ZoneMetric::Pace),
            warnings: route.warnings.clone(),
        }
    }
}

/// Import a route and analyze it in one call.
///
/// `config_json` may be partial; `None` uses the defaults.
pub fn analyze_route_json(route_json: &str, config_json: Option<&str>) -> Result<String> {
    let config = match config_json {
        Some(json) => AnalyticsConfig::from_json(json)?,
        None => AnalyticsConfig::default(),
    };
    let route = route_from_json_with_config(route_json, &config)?;
    let report = RouteReport::new(&route, &config);

    info!(
        "[Json] Report for '{}': {} splits, {} best efforts, {} climbs",
        route.id,
        report.splits.len(),
        report.best_efforts.len(),
        report.steep_sections.climbs.len()
    );
    Ok(serde_json::to_string(&report)?)
}
