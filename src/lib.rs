//! # Route Analytics
//!
//! GPS signal processing and distance-aligned comparison of activity
//! recordings.
//!
//! This library provides:
//! - Validation of parsed GPX/FIT records and outlier rejection
//! - Speed/pace derivation and rolling-median cleaning
//! - Adaptive smoothing and decimation for charts and maps
//! - Time-gap, split, segment, best-effort, climb and zone analysis across
//!   recordings of different length, sampling rate and speed
//!
//! ## Features
//!
//! - **`parallel`** - Build comparison routes' distance-time maps and accumulate zone time in parallel with rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use route_analytics::{calculate_splits, ParsedRoute, RawCoordinate, RawTimestamp, Route};
//! use chrono::{TimeZone, Utc};
//!
//! let start = Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap();
//! let raw = ParsedRoute {
//!     id: "morning-run".to_string(),
//!     coordinates: (0..600)
//!         .map(|i| RawCoordinate::new(46.0 + i as f64 * 0.00003, 7.0))
//!         .collect(),
//!     timestamps: (0..600)
//!         .map(|i| Some(RawTimestamp::Instant(start + chrono::Duration::seconds(i))))
//!         .collect(),
//!     ..Default::default()
//! };
//!
//! let route = Route::from_parsed(&raw).unwrap();
//! let splits = calculate_splits(&route, 1.0);
//! println!("{} km in {} splits", route.stats.distance, splits.len());
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, RouteAnalyticsError};

// Pipeline and comparison settings
pub mod config;
pub use config::{AnalyticsConfig, CleaningConfig, ComparisonConfig, SteepConfig};

// Geographic utilities (haversine, cumulative distance)
pub mod geo_utils;
pub use geo_utils::haversine_distance;

// Median / MAD / rolling median
pub mod stats;

// Raw record validation
pub mod validation;
pub use validation::{
    validate_parsed_data, ParsedRoute, RawCoordinate, RawTimestamp, ValidatedData,
};

// Derived speed, pace, elevation and duration
pub mod metrics;
pub use metrics::{ElevationStats, RouteStats};

// Distance-jump and acceleration-spike rejection
pub mod cleaning;

// Route entity and import pipeline
pub mod route;
pub use route::{Route, RouteSummary};

// Chart/map preparation
pub mod display;

// Distance -> elapsed time lookups
pub mod time_index;
pub use time_index::{
    build_time_distance_map, get_distance_at_time, get_time_at_distance, DistanceTimeMap,
};

// Cross-route comparison (gaps, splits, segments, best efforts, climbs)
pub mod comparison;
pub use comparison::{
    calculate_best_efforts, calculate_segment_metrics, calculate_splits, calculate_time_gaps,
    detect_steep_sections, BestEffort, SegmentMetrics, Split, TimeGapResult,
};

// Time-in-zone distribution
pub mod zones;
pub use zones::{calculate_route_zones, calculate_zones, ZoneDistribution, ZoneMetric};

// Presentation strings
pub mod format;

// JSON entry points for the UI layer
pub mod json;

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude in degrees.
///
/// # Example
/// ```
/// use route_analytics::GpsPoint;
/// let point = GpsPoint::new(51.5074, -0.1278); // London
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        validation::validate_coordinate(Some(self.latitude), Some(self.longitude)).valid
    }
}
