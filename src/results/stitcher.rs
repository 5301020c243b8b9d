//! Concatenation of per-stage series into one continuous run

use crate::core::units::seconds_list_to_hours_list;

/// Join per-stage vertical strain so each stage starts where the previous one ended
///
/// Each stage is shifted by the running offset, which then becomes the
/// last shifted value of that stage. Empty stages leave the offset alone.
pub fn combine_cumulative(stages: &[Vec<f64>]) -> Vec<f64> {
    let mut combined = Vec::with_capacity(stages.iter().map(Vec::len).sum());
    let mut offset = 0.0;
    for stage in stages {
        let start = combined.len();
        combined.extend(stage.iter().map(|v| v + offset));
        if let Some(last) = combined[start..].last() {
            offset = *last;
        }
    }
    combined
}

/// Join per-stage series without any offset
pub fn concatenate(stages: &[Vec<f64>]) -> Vec<f64> {
    stages.iter().flatten().copied().collect()
}

/// Join per-stage time axes (seconds) into one axis in hours
pub fn concatenate_time_hours(stages: &[Vec<f64>]) -> Vec<f64> {
    seconds_list_to_hours_list(&concatenate(stages))
}
