//! Presentation strings for analytics values.
//!
//! The analytics functions only emit numbers (min/km, km, seconds); these
//! helpers turn them into the labels the UI shows.

/// Split whole seconds into (hours, minutes, seconds).
fn hms(total_seconds: i64) -> (i64, i64, i64) {
    (
        total_seconds / 3600,
        (total_seconds % 3600) / 60,
        total_seconds % 60,
    )
}

fn clock(total_seconds: i64) -> String {
    let (h, m, s) = hms(total_seconds);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

/// Pace in min/km as `"5:30/km"`.
pub fn format_pace(min_per_km: f64) -> String {
    if !min_per_km.is_finite() || min_per_km <= 0.0 {
        return "N/A".to_string();
    }
    // Round on whole seconds so 4.999 becomes 5:00, not 4:60
    let total = (min_per_km * 60.0).round() as i64;
    format!("{}:{:02}/km", total / 60, total % 60)
}

/// Duration as `"1:02:03"`, or `"2:03"` under an hour.
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "N/A".to_string();
    }
    clock(seconds.round() as i64)
}

/// Distance as `"400m"` under a kilometer, `"12.3km"` otherwise.
pub fn format_distance(km: f64) -> String {
    if !km.is_finite() || km < 0.0 {
        return "N/A".to_string();
    }
    if km < 1.0 {
        format!("{}m", (km * 1000.0).round() as i64)
    } else {
        format!("{:.1}km", km)
    }
}

/// Signed time gap as `"+0:12"` (behind) or `"-0:05"` (ahead).
pub fn format_gap(seconds: f64) -> String {
    if !seconds.is_finite() {
        return "N/A".to_string();
    }
    let total = seconds.round() as i64;
    let sign = if total < 0 { '-' } else { '+' };
    format!("{}{}", sign, clock(total.abs()))
}
