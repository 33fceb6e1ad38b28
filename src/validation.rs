//! Field validation for parsed route records.
//!
//! The file parser hands over raw, index-aligned per-point channels. This
//! module decides which points survive:
//! - an invalid coordinate drops the whole point (all channels at that index)
//! - an invalid elevation, timestamp or sensor reading only nulls that field
//!
//! The output channels are always mutually index-aligned with length
//! `N - skipped`.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::GpsPoint;

/// Lowest accepted elevation in meters (below the Dead Sea shore with margin)
pub const MIN_ELEVATION_M: f64 = -500.0;

/// Highest accepted elevation in meters
pub const MAX_ELEVATION_M: f64 = 9000.0;

// ============================================================================
// Raw Input Types
// ============================================================================

/// A coordinate as produced by the file parser, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RawCoordinate {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl RawCoordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat: Some(lat),
            lng: Some(lng),
        }
    }
}

/// A timestamp as produced by the file parser.
///
/// Parsers either hand over a decoded instant, epoch milliseconds, or the raw
/// text from the file. Text must be RFC 3339 to be accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Instant(DateTime<Utc>),
    EpochMillis(i64),
    Text(String),
}

impl RawTimestamp {
    /// Resolve to an instant, or `None` if the value cannot be interpreted.
    pub fn resolve(&self) -> Option<DateTime<Utc>> {
        match self {
            RawTimestamp::Instant(t) => Some(*t),
            RawTimestamp::EpochMillis(ms) => DateTime::from_timestamp_millis(*ms),
            RawTimestamp::Text(s) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|t| t.with_timezone(&Utc)),
        }
    }
}

impl From<DateTime<Utc>> for RawTimestamp {
    fn from(t: DateTime<Utc>) -> Self {
        RawTimestamp::Instant(t)
    }
}

/// Raw per-point channels of one recording, pre-aligned by index.
///
/// Channels shorter than `coordinates` are treated as missing at the
/// trailing indices.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParsedRoute {
    pub id: String,
    pub name: Option<String>,
    pub coordinates: Vec<RawCoordinate>,
    pub elevations: Vec<Option<f64>>,
    pub timestamps: Vec<Option<RawTimestamp>>,
    pub heart_rates: Vec<Option<f64>>,
    pub cadences: Vec<Option<f64>>,
    pub powers: Vec<Option<f64>>,
}

// ============================================================================
// Check Results
// ============================================================================

/// Why a coordinate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateIssue {
    Missing,
    InvalidNumber,
    LatOutOfRange,
    LngOutOfRange,
}

impl fmt::Display for CoordinateIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CoordinateIssue::Missing => "missing",
            CoordinateIssue::InvalidNumber => "invalid_number",
            CoordinateIssue::LatOutOfRange => "lat_out_of_range",
            CoordinateIssue::LngOutOfRange => "lng_out_of_range",
        };
        f.write_str(s)
    }
}

/// Result of a coordinate check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateCheck {
    pub valid: bool,
    pub reason: Option<CoordinateIssue>,
}

impl CoordinateCheck {
    fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    fn rejected(reason: CoordinateIssue) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
        }
    }
}

/// Result of an optional numeric field check. `value` is `None` when invalid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldCheck {
    pub valid: bool,
    pub value: Option<f64>,
}

/// Why a timestamp was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampIssue {
    Unparseable,
    NotChronological,
}

impl fmt::Display for TimestampIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampIssue::Unparseable => f.write_str("unparseable"),
            TimestampIssue::NotChronological => f.write_str("not_chronological"),
        }
    }
}

/// Result of a timestamp check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimestampCheck {
    pub valid: bool,
    pub value: Option<DateTime<Utc>>,
    pub reason: Option<TimestampIssue>,
}

/// Validated, index-aligned channels ready for metric derivation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedData {
    pub coordinates: Vec<GpsPoint>,
    pub elevations: Vec<Option<f64>>,
    pub timestamps: Vec<Option<DateTime<Utc>>>,
    pub heart_rates: Vec<Option<f64>>,
    pub cadences: Vec<Option<f64>>,
    pub powers: Vec<Option<f64>>,
    /// Points dropped because of an invalid coordinate
    pub skipped: usize,
    pub warnings: Vec<String>,
}

impl ValidatedData {
    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }
}

// ============================================================================
// Field Checks
// ============================================================================

/// Check a coordinate pair. Boundary values (±90, ±180) are valid.
pub fn validate_coordinate(lat: Option<f64>, lng: Option<f64>) -> CoordinateCheck {
    let (Some(lat), Some(lng)) = (lat, lng) else {
        return CoordinateCheck::rejected(CoordinateIssue::Missing);
    };
    if !lat.is_finite() || !lng.is_finite() {
        return CoordinateCheck::rejected(CoordinateIssue::InvalidNumber);
    }
    if !(-90.0..=90.0).contains(&lat) {
        return CoordinateCheck::rejected(CoordinateIssue::LatOutOfRange);
    }
    if !(-180.0..=180.0).contains(&lng) {
        return CoordinateCheck::rejected(CoordinateIssue::LngOutOfRange);
    }
    CoordinateCheck::ok()
}

/// Check an elevation in meters. A missing elevation is valid.
pub fn validate_elevation(elevation: Option<f64>) -> FieldCheck {
    match elevation {
        None => FieldCheck {
            valid: true,
            value: None,
        },
        Some(e) if e.is_finite() && (MIN_ELEVATION_M..=MAX_ELEVATION_M).contains(&e) => {
            FieldCheck {
                valid: true,
                value: Some(e),
            }
        }
        Some(_) => FieldCheck {
            valid: false,
            value: None,
        },
    }
}

/// Check a sensor reading (heart rate, cadence, power).
/// A missing reading is valid; non-finite or negative readings are not.
pub fn validate_sensor(reading: Option<f64>) -> FieldCheck {
    match reading {
        None => FieldCheck {
            valid: true,
            value: None,
        },
        Some(v) if v.is_finite() && v >= 0.0 => FieldCheck {
            valid: true,
            value: Some(v),
        },
        Some(_) => FieldCheck {
            valid: false,
            value: None,
        },
    }
}

/// Check a timestamp against the last accepted one.
///
/// Equal timestamps are accepted; only a strictly earlier instant is
/// rejected as non-chronological.
pub fn validate_timestamp(
    timestamp: Option<&RawTimestamp>,
    prev_valid: Option<DateTime<Utc>>,
) -> TimestampCheck {
    let Some(raw) = timestamp else {
        return TimestampCheck {
            valid: true,
            value: None,
            reason: None,
        };
    };

    let Some(instant) = raw.resolve() else {
        return TimestampCheck {
            valid: false,
            value: None,
            reason: Some(TimestampIssue::Unparseable),
        };
    };

    if matches!(prev_valid, Some(prev) if instant < prev) {
        return TimestampCheck {
            valid: false,
            value: None,
            reason: Some(TimestampIssue::NotChronological),
        };
    }

    TimestampCheck {
        valid: true,
        value: Some(instant),
        reason: None,
    }
}

// ============================================================================
// Whole-Route Validation
// ============================================================================

fn channel_at(channel: &[Option<f64>], i: usize) -> Option<f64> {
    channel.get(i).copied().flatten()
}

/// Validate every point of a parsed route.
///
/// Never fails: rejected points are counted in `skipped` and described in
/// `warnings`. Escalating an all-rejected route to an error is the caller's
/// decision (see [`crate::route::Route::from_parsed`]).
pub fn validate_parsed_data(raw: &ParsedRoute) -> ValidatedData {
    let n = raw.coordinates.len();
    let mut out = ValidatedData {
        coordinates: Vec::with_capacity(n),
        elevations: Vec::with_capacity(n),
        timestamps: Vec::with_capacity(n),
        heart_rates: Vec::with_capacity(n),
        cadences: Vec::with_capacity(n),
        powers: Vec::with_capacity(n),
        skipped: 0,
        warnings: Vec::new(),
    };
    let mut last_valid_timestamp: Option<DateTime<Utc>> = None;

    for (i, coord) in raw.coordinates.iter().enumerate() {
        let check = validate_coordinate(coord.lat, coord.lng);
        if let Some(reason) = check.reason {
            out.skipped += 1;
            let msg = format!("Point {}: invalid coordinate ({})", i, reason);
            debug!("[Validate] {}", msg);
            out.warnings.push(msg);
            continue;
        }
        // validate_coordinate guarantees both are present
        let (Some(lat), Some(lng)) = (coord.lat, coord.lng) else {
            continue;
        };
        out.coordinates.push(GpsPoint::new(lat, lng));

        let elevation = validate_elevation(channel_at(&raw.elevations, i));
        if !elevation.valid {
            out.warnings
                .push(format!("Point {}: elevation out of range, cleared", i));
        }
        out.elevations.push(elevation.value);

        let ts = validate_timestamp(
            raw.timestamps.get(i).and_then(|t| t.as_ref()),
            last_valid_timestamp,
        );
        if let Some(reason) = ts.reason {
            out.warnings
                .push(format!("Point {}: timestamp {}, cleared", i, reason));
        }
        if ts.value.is_some() {
            last_valid_timestamp = ts.value;
        }
        out.timestamps.push(ts.value);

        for (name, channel, target) in [
            ("heart rate", &raw.heart_rates, &mut out.heart_rates),
            ("cadence", &raw.cadences, &mut out.cadences),
            ("power", &raw.powers, &mut out.powers),
        ] {
            let reading = validate_sensor(channel_at(channel, i));
            if !reading.valid {
                out.warnings
                    .push(format!("Point {}: invalid {} reading, cleared", i, name));
            }
            target.push(reading.value);
        }
    }

    if out.skipped > 0 {
        warn!(
            "[Validate] Route '{}': dropped {} of {} points with invalid coordinates",
            raw.id, out.skipped, n
        );
    }
    debug!(
        "[Validate] Route '{}': {} points kept, {} warnings",
        raw.id,
        out.len(),
        out.warnings.len()
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(secs: i64) -> RawTimestamp {
        RawTimestamp::Instant(Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap())
    }

    fn parsed(coords: Vec<RawCoordinate>) -> ParsedRoute {
        let n = coords.len();
        ParsedRoute {
            id: "test".to_string(),
            coordinates: coords,
            elevations: vec![Some(100.0); n],
            timestamps: (0..n as i64).map(|i| Some(t(i))).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_coordinate_reason_order() {
        assert_eq!(
            validate_coordinate(None, Some(f64::NAN)).reason,
            Some(CoordinateIssue::Missing)
        );
        assert_eq!(
            validate_coordinate(Some(f64::NAN), Some(500.0)).reason,
            Some(CoordinateIssue::InvalidNumber)
        );
        assert_eq!(
            validate_coordinate(Some(91.0), Some(500.0)).reason,
            Some(CoordinateIssue::LatOutOfRange)
        );
        assert_eq!(
            validate_coordinate(Some(45.0), Some(-180.5)).reason,
            Some(CoordinateIssue::LngOutOfRange)
        );
    }

    #[test]
    fn test_coordinate_boundaries_valid() {
        assert!(validate_coordinate(Some(90.0), Some(180.0)).valid);
        assert!(validate_coordinate(Some(-90.0), Some(-180.0)).valid);
    }

    #[test]
    fn test_elevation() {
        assert_eq!(
            validate_elevation(None),
            FieldCheck {
                valid: true,
                value: None
            }
        );
        assert_eq!(validate_elevation(Some(8848.0)).value, Some(8848.0));
        assert!(!validate_elevation(Some(50000.0)).valid);
        assert!(!validate_elevation(Some(-501.0)).valid);
        assert!(!validate_elevation(Some(f64::INFINITY)).valid);
    }

    #[test]
    fn test_timestamp_chronology() {
        let prev = t(10).resolve();
        let earlier = validate_timestamp(Some(&t(5)), prev);
        assert!(!earlier.valid);
        assert_eq!(earlier.reason, Some(TimestampIssue::NotChronological));

        let equal = validate_timestamp(Some(&t(10)), prev);
        assert!(equal.valid);
        assert_eq!(equal.value, prev);

        assert!(validate_timestamp(None, prev).valid);
    }

    #[test]
    fn test_timestamp_text() {
        let ok = RawTimestamp::Text("2024-05-01T07:30:00Z".to_string());
        assert!(validate_timestamp(Some(&ok), None).value.is_some());

        let bad = RawTimestamp::Text("yesterday morning".to_string());
        let check = validate_timestamp(Some(&bad), None);
        assert!(!check.valid);
        assert_eq!(check.reason, Some(TimestampIssue::Unparseable));
    }

    #[test]
    fn test_invalid_lat_drops_point() {
        let raw = parsed(vec![
            RawCoordinate::new(46.0, 7.0),
            RawCoordinate::new(200.0, 7.0),
            RawCoordinate::new(46.001, 7.0),
        ]);
        let data = validate_parsed_data(&raw);
        assert_eq!(data.skipped, 1);
        assert_eq!(data.len(), 2);
        assert_eq!(data.elevations.len(), 2);
        assert_eq!(data.timestamps.len(), 2);
        assert_eq!(data.heart_rates.len(), 2);
        // Alignment: the third point's timestamp follows the first
        assert_eq!(data.timestamps[1], t(2).resolve());
        assert_eq!(data.warnings.len(), 1);
    }

    #[test]
    fn test_bad_elevation_nulled_point_kept() {
        let mut raw = parsed(vec![
            RawCoordinate::new(46.0, 7.0),
            RawCoordinate::new(46.001, 7.0),
        ]);
        raw.elevations[1] = Some(50000.0);
        let data = validate_parsed_data(&raw);
        assert_eq!(data.skipped, 0);
        assert_eq!(data.len(), 2);
        assert_eq!(data.elevations, vec![Some(100.0), None]);
    }

    #[test]
    fn test_non_chronological_timestamp_nulled_point_kept() {
        let mut raw = parsed(vec![
            RawCoordinate::new(46.0, 7.0),
            RawCoordinate::new(46.001, 7.0),
            RawCoordinate::new(46.002, 7.0),
            RawCoordinate::new(46.003, 7.0),
        ]);
        raw.timestamps[2] = Some(t(-60));
        let data = validate_parsed_data(&raw);
        assert_eq!(data.len(), 4);
        assert!(data.timestamps[2].is_none());
        // Chronology compares against the last accepted timestamp (index 1)
        assert_eq!(data.timestamps[3], t(3).resolve());
    }

    #[test]
    fn test_short_channels_and_bad_sensor() {
        let mut raw = parsed(vec![
            RawCoordinate::new(46.0, 7.0),
            RawCoordinate::new(46.001, 7.0),
            RawCoordinate::new(46.002, 7.0),
        ]);
        raw.heart_rates = vec![Some(140.0), Some(-3.0)];
        let data = validate_parsed_data(&raw);
        assert_eq!(data.heart_rates, vec![Some(140.0), None, None]);
        assert_eq!(data.powers, vec![None, None, None]);
        assert_eq!(data.warnings.len(), 1);
    }

    #[test]
    fn test_parsed_route_from_json() {
        let json = r#"{
            "id": "r1",
            "coordinates": [{"lat": 46.0, "lng": 7.0}, {"lat": null, "lng": 7.0}],
            "timestamps": ["2024-05-01T07:30:00Z", 1714548601000],
            "heartRates": [120, null]
        }"#;
        let raw: ParsedRoute = serde_json::from_str(json).unwrap();
        assert_eq!(raw.coordinates.len(), 2);
        assert!(matches!(raw.timestamps[1], Some(RawTimestamp::EpochMillis(_))));

        let data = validate_parsed_data(&raw);
        assert_eq!(data.skipped, 1);
        assert_eq!(data.heart_rates, vec![Some(120.0)]);
    }
}
