//! End-to-end pipeline tests.
//!
//! Parser output -> validation -> derivation -> cleaning -> comparison,
//! on synthetic recordings of the same 3 km course with injected faults.
//!
//! Run with: `cargo test --test pipeline -- --nocapture` to see the logs.

use chrono::{TimeZone, Utc};
use route_analytics::format::{format_gap, format_pace};
use route_analytics::{
    calculate_best_efforts, calculate_splits, calculate_time_gaps, calculate_zones,
    AnalyticsConfig, ParsedRoute, RawCoordinate, RawTimestamp, Route, RouteAnalyticsError,
    ZoneMetric,
};

const POINTS: usize = 900;
/// ~3.34 m of latitude, one fix per second at ~12 km/h
const STEP_DEG: f64 = 0.00003;
const START_MS: i64 = 1_714_546_800_000;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Clean recording of the course, `ms_per_point` apart.
fn recording(id: &str, ms_per_point: i64) -> ParsedRoute {
    ParsedRoute {
        id: id.to_string(),
        name: Some(format!("{} (synthetic)", id)),
        coordinates: (0..POINTS)
            .map(|i| RawCoordinate::new(46.0 + i as f64 * STEP_DEG, 7.0))
            .collect(),
        elevations: (0..POINTS).map(|i| Some(400.0 + (i / 10) as f64 * 0.2)).collect(),
        timestamps: (0..POINTS)
            .map(|i| Some(RawTimestamp::EpochMillis(START_MS + i as i64 * ms_per_point)))
            .collect(),
        heart_rates: (0..POINTS).map(|i| Some(120.0 + (i % 60) as f64)).collect(),
        ..Default::default()
    }
}

/// Reference recording with one of each fault the validator and cleaner handle.
fn faulty_recording() -> ParsedRoute {
    let mut raw = recording("reference", 1000);
    // Out-of-range latitude: point dropped
    raw.coordinates[100] = RawCoordinate::new(200.0, 7.0);
    // Impossible elevation: field nulled
    raw.elevations[200] = Some(50_000.0);
    // Clock jump backwards: field nulled
    raw.timestamps[300] = Some(RawTimestamp::Text("2024-05-01T06:59:00Z".to_string()));
    // ~39 m sideways hop in one second (~140 km/h)
    raw.coordinates[400] = RawCoordinate::new(46.0 + 400.0 * STEP_DEG, 7.0005);
    raw
}

// ============================================================================
// Import
// ============================================================================

#[test]
fn test_import_repairs_faults() {
    init_logging();
    let route = Route::from_parsed(&faulty_recording()).unwrap();

    assert_eq!(route.len(), POINTS - 1);
    assert_eq!(route.skipped, 1);
    assert!(!route.warnings.is_empty());

    // Every channel stays index-aligned
    for len in [
        route.elevations.len(),
        route.timestamps.len(),
        route.heart_rates.len(),
        route.speeds.len(),
        route.paces.len(),
    ] {
        assert_eq!(len, route.len());
    }

    assert_eq!(route.elevations.iter().filter(|e| e.is_none()).count(), 1);
    assert!(route.stats.max_elevation < 1000.0);
    assert_eq!(route.timestamps.iter().filter(|t| t.is_none()).count(), 1);

    // The hop is gone from the cleaned speed series
    assert!(route.speeds.iter().flatten().all(|s| *s <= 100.0));
    let summary = route.summary();
    let avg = summary.speed.unwrap().avg;
    assert!((avg - 12.0).abs() < 1.0, "average cleaned speed {}", avg);
}

#[test]
fn test_import_rejects_unusable_recordings() {
    init_logging();
    let mut raw = recording("garbage", 1000);
    raw.coordinates.truncate(5);
    for c in raw.coordinates.iter_mut() {
        *c = RawCoordinate { lat: None, lng: Some(7.0) };
    }
    let err = Route::from_parsed(&raw).unwrap_err();
    assert_eq!(
        err,
        RouteAnalyticsError::NoUsablePoints {
            route_id: "garbage".to_string(),
            skipped: 5
        }
    );
}

// ============================================================================
// Comparison
// ============================================================================

#[test]
fn test_compare_against_slower_recording() {
    init_logging();
    let config = AnalyticsConfig::running();
    let reference = Route::from_parsed_with_config(&faulty_recording(), &config.cleaning).unwrap();
    let slower = Route::from_parsed_with_config(&recording("slower", 1100), &config.cleaning).unwrap();

    let result =
        calculate_time_gaps(&reference, &[slower], config.comparison.sample_interval_km).unwrap();
    assert_eq!(result.reference_route, "reference");
    assert!(result.max_distance > 2.9);
    assert!(result.gaps.len() >= 29);

    let late: Vec<f64> = result
        .gaps
        .iter()
        .filter(|s| s.distance >= 0.5)
        .map(|s| s.gaps[0].gap)
        .collect();
    assert!(late.iter().all(|g| *g > 0.0));

    let final_gap = *late.last().unwrap();
    assert!(final_gap > 60.0 && final_gap < 130.0, "final gap {}", final_gap);
    assert!(format_gap(final_gap).starts_with('+'));
}

#[test]
fn test_splits_and_best_efforts() {
    init_logging();
    let reference = Route::from_parsed(&faulty_recording()).unwrap();
    let splits = calculate_splits(&reference, 1.0);
    assert_eq!(splits.len(), 4);
    assert!(splits.last().unwrap().is_partial);
    for split in &splits[..3] {
        let pace = split.pace.unwrap();
        assert!(pace > 4.0 && pace < 6.0, "split {} pace {}", split.index, pace);
        assert!(split.avg_heart_rate.is_some());
    }

    let slower = Route::from_parsed(&recording("slower", 1100)).unwrap();
    let efforts = calculate_best_efforts(&slower, &[1.0, 5.0]);
    assert_eq!(efforts.len(), 1);
    assert!((efforts[0].pace - 5.5).abs() < 0.1);
    assert_eq!(format_pace(efforts[0].pace), "5:30/km");
}

#[test]
fn test_heart_rate_zones() {
    init_logging();
    let route = Route::from_parsed(&recording("zones", 1000)).unwrap();
    let dist = calculate_zones(&route.heart_rates, &route.timestamps, ZoneMetric::HeartRate).unwrap();
    assert_eq!(dist.min_val, 120.0);
    assert_eq!(dist.max_val, 179.0);
    assert_eq!(dist.zones.iter().map(|z| z.percent).sum::<u32>(), 100);

    let start = Utc.timestamp_millis_opt(START_MS).unwrap();
    assert_eq!(route.timestamps[0], Some(start));
}
