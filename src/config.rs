//! Configuration for the cleaning pipeline and route comparisons.
//!
//! Every struct has sensible defaults; JSON overrides only need to name the
//! fields they change.

use serde::{Deserialize, Serialize};

use crate::error::{RouteAnalyticsError, Result};

/// Canonical best-effort distances in kilometers
pub const STANDARD_EFFORT_DISTANCES: &[f64] = &[1.0, 5.0, 10.0, 21.0975, 42.195];

/// Configuration for GPS cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CleaningConfig {
    /// Maximum plausible speed in km/h. Faster samples and position jumps are rejected.
    /// Default: 100.0 (covers descending cyclists)
    pub max_speed_kmh: f64,
    /// Maximum plausible acceleration in m/s².
    /// Default: 10.0
    pub max_acceleration: f64,
    /// Rolling-median window applied to speed and pace after cleaning.
    /// Default: 5
    pub smoothing_window: usize,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            max_speed_kmh: 100.0,
            max_acceleration: 10.0,
            smoothing_window: 5,
        }
    }
}

/// Configuration for cross-route comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComparisonConfig {
    /// Distance step for time-gap sampling in km.
    /// Default: 0.1
    pub sample_interval_km: f64,
    /// Split length in km.
    /// Default: 1.0
    pub split_km: f64,
    /// Distances searched for best efforts, in km.
    pub best_effort_distances: Vec<f64>,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            sample_interval_km: 0.1,
            split_km: 1.0,
            best_effort_distances: STANDARD_EFFORT_DISTANCES.to_vec(),
        }
    }
}

/// Configuration for climb/descent detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SteepConfig {
    /// Minimum section length in meters.
    /// Default: 100.0
    pub min_length_m: f64,
    /// Minimum absolute grade as a fraction (0.05 = 5%).
    /// Default: 0.05
    pub min_grade: f64,
}

impl Default for SteepConfig {
    fn default() -> Self {
        Self {
            min_length_m: 100.0,
            min_grade: 0.05,
        }
    }
}

/// Complete analytics configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsConfig {
    pub cleaning: CleaningConfig,
    pub comparison: ComparisonConfig,
    pub steep: SteepConfig,
}

impl AnalyticsConfig {
    /// Preset for running: anything above 35 km/h is GPS noise.
    pub fn running() -> Self {
        Self {
            cleaning: CleaningConfig {
                max_speed_kmh: 35.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Preset for cycling.
    pub fn cycling() -> Self {
        Self {
            cleaning: CleaningConfig {
                max_speed_kmh: 100.0,
                ..Default::default()
            },
            steep: SteepConfig {
                min_length_m: 200.0,
                min_grade: 0.04,
            },
            ..Default::default()
        }
    }

    /// Parse a (possibly partial) JSON configuration and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the algorithms cannot work with.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            (self.cleaning.max_speed_kmh > 0.0, "maxSpeedKmh must be positive"),
            (
                self.cleaning.max_acceleration > 0.0,
                "maxAcceleration must be positive",
            ),
            (
                self.cleaning.smoothing_window > 0,
                "smoothingWindow must be at least 1",
            ),
            (
                self.comparison.sample_interval_km > 0.0,
                "sampleIntervalKm must be positive",
            ),
            (self.comparison.split_km > 0.0, "splitKm must be positive"),
            (
                self.comparison
                    .best_effort_distances
                    .iter()
                    .all(|d| d.is_finite() && *d > 0.0),
                "bestEffortDistances must be positive",
            ),
            (self.steep.min_length_m >= 0.0, "minLengthM must not be negative"),
            (self.steep.min_grade > 0.0, "minGrade must be positive"),
        ];

        match checks.iter().find(|(ok, _)| !ok) {
            Some((_, message)) => Err(RouteAnalyticsError::Config {
                message: message.to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(AnalyticsConfig::default().validate().is_ok());
        assert!(AnalyticsConfig::running().validate().is_ok());
        assert!(AnalyticsConfig::cycling().validate().is_ok());
    }

    #[test]
    fn test_partial_json_override() {
        let config =
            AnalyticsConfig::from_json(r#"{"cleaning": {"maxSpeedKmh": 30}, "comparison": {"splitKm": 0.5}}"#)
                .unwrap();
        assert_eq!(config.cleaning.max_speed_kmh, 30.0);
        assert_eq!(config.cleaning.smoothing_window, 5);
        assert_eq!(config.comparison.split_km, 0.5);
        assert_eq!(config.comparison.sample_interval_km, 0.1);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = AnalyticsConfig::from_json(r#"{"comparison": {"sampleIntervalKm": 0}}"#).unwrap_err();
        assert!(matches!(err, RouteAnalyticsError::Config { .. }));

        let err = AnalyticsConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, RouteAnalyticsError::Parse { .. }));
    }
}
