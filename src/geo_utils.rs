//! Geographic utilities: great-circle distance and distance accumulation.
//!
//! All distances in this crate are kilometers unless a name says otherwise.

use crate::GpsPoint;

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Convert degrees to radians.
#[inline]
pub fn to_radians(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

/// Great-circle distance between two points in kilometers (haversine formula).
///
/// # Example
/// ```
/// use route_analytics::GpsPoint;
/// use route_analytics::geo_utils::haversine_distance;
///
/// let london = GpsPoint::new(51.5074, -0.1278);
/// let paris = GpsPoint::new(48.8566, 2.3522);
/// let km = haversine_distance(&london, &paris);
/// assert!((km - 343.5).abs() < 1.0);
/// ```
pub fn haversine_distance(a: &GpsPoint, b: &GpsPoint) -> f64 {
    let lat1 = to_radians(a.latitude);
    let lat2 = to_radians(b.latitude);
    let d_lat = to_radians(b.latitude - a.latitude);
    let d_lng = to_radians(b.longitude - a.longitude);

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    // Clamp guards asin-domain drift for antipodal points
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

/// Cumulative distance (km) at every point of a track, starting at 0.
///
/// The result is non-decreasing by construction: repeated points add 0.
pub fn cumulative_distances(points: &[GpsPoint]) -> Vec<f64> {
    let mut result = Vec::with_capacity(points.len());
    let mut total = 0.0;
    for (i, point) in points.iter().enumerate() {
        if i > 0 {
            total += haversine_distance(&points[i - 1], point);
        }
        result.push(total);
    }
    result
}

/// Total length of a track in kilometers.
pub fn total_distance(points: &[GpsPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}
