//! Position/percentage conversions. None of these ever produce NaN.

use std::time::Duration;

/// Percent of `duration` covered by `position`, clamped to `[0, 100]`.
///
/// Unknown or zero duration reads as 0.
pub fn progress_percent(position: Duration, duration: Option<Duration>) -> f64 {
    match duration {
        Some(d) if !d.is_zero() => {
            (position.as_secs_f64() / d.as_secs_f64() * 100.0).clamp(0.0, 100.0)
        }
        _ => 0.0,
    }
}

/// Clamp a requested percentage into `[0, 100]`; non-finite input maps to 0.
pub fn clamp_percent(percent: f64) -> f64 {
    if percent.is_finite() {
        percent.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Absolute position for `percent` of `duration`.
pub fn seek_position(percent: f64, duration: Duration) -> Duration {
    duration.mul_f64(clamp_percent(percent) / 100.0)
}

/// Clamp a volume into `[0, 1]`; `None` for NaN.
pub fn clamp_volume(volume: f32) -> Option<f32> {
    (!volume.is_nan()).then(|| volume.clamp(0.0, 1.0))
}

/// Format a duration as `m:ss`.
pub fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Like [`format_mmss`] but renders unknown durations as `-:--`.
pub fn format_mmss_opt(d: Option<Duration>) -> String {
    d.map(format_mmss).unwrap_or_else(|| "-:--".to_string())
}
