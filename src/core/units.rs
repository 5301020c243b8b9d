//! Time unit conversions

pub const SECONDS_PER_HOUR: f64 = 3600.0;

pub fn hours_to_seconds(hours: f64) -> f64 {
    hours * SECONDS_PER_HOUR
}

pub fn seconds_to_hours(seconds: f64) -> f64 {
    seconds / SECONDS_PER_HOUR
}

/// Convert a whole time axis from seconds to hours
pub fn seconds_list_to_hours_list(seconds: &[f64]) -> Vec<f64> {
    seconds.iter().copied().map(seconds_to_hours).collect()
}
