//! Trend classification
//!
//! Fits recent metric values against their index with ordinary least squares
//! and classifies the normalized slope as improving, stable, or degrading.

use super::{lower_is_better, Trend};

/// Historical window: up to this many prior values plus the current one.
const HISTORY_WINDOW: usize = 3;

/// Normalized-slope band considered stable.
const STABLE_BAND: f64 = 0.05;

/// Classify the trend of a metric given its historical values (oldest first)
/// and the current value.
pub fn classify_trend(name: &str, history: &[f64], current: f64) -> Trend {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let mut values: Vec<f64> = history[start..].to_vec();
    values.push(current);
    if values.len() < 2 {
        return Trend::Stable;
    }

    let slope = ols_slope(&values);
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if mean.abs() < f64::EPSILON {
        return Trend::Stable;
    }

    let normalized = slope / mean.abs();
    if normalized.abs() < STABLE_BAND {
        return Trend::Stable;
    }

    let shrinking = slope < 0.0;
    if lower_is_better(name) == shrinking {
        Trend::Improving
    } else {
        Trend::Degrading
    }
}

/// Least-squares slope of values against their index.
fn ols_slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if n < 2.0 {
        return 0.0;
    }

    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;
    for (i, y) in values.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator.abs() < f64::EPSILON {
        return 0.0;
    }
    (n * sum_xy - sum_x * sum_y) / denominator
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_series_is_stable() {
        let trend = classify_trend("requests_per_sec", &[100.0, 100.0, 100.0], 100.0);
        assert_eq!(trend, Trend::Stable);
    }

    #[test]
    fn test_rising_latency_is_degrading() {
        let trend = classify_trend("avg_response_time_ms", &[100.0, 150.0, 200.0], 260.0);
        assert_eq!(trend, Trend::Degrading);
    }

    #[test]
    fn test_falling_latency_is_improving() {
        let trend = classify_trend("avg_response_time_ms", &[260.0, 200.0, 150.0], 100.0);
        assert_eq!(trend, Trend::Improving);
    }

    #[test]
    fn test_rising_throughput_is_improving() {
        let trend = classify_trend("requests_per_sec", &[100.0, 130.0, 160.0], 200.0);
        assert_eq!(trend, Trend::Improving);
    }

    #[test]
    fn test_small_drift_inside_band_is_stable() {
        // ~1% drift per step, well below the 5% band.
        let trend = classify_trend("requests_per_sec", &[100.0, 101.0, 102.0], 103.0);
        assert_eq!(trend, Trend::Stable);
    }

    #[test]
    fn test_no_history_is_stable() {
        assert_eq!(classify_trend("anything", &[], 42.0), Trend::Stable);
    }

    #[test]
    fn test_only_last_three_history_points_used() {
        // Old spike outside the window must not affect the fit.
        let history = [10_000.0, 100.0, 100.0, 100.0];
        assert_eq!(
            classify_trend("requests_per_sec", &history, 100.0),
            Trend::Stable
        );
    }

    #[test]
    fn test_ols_slope_known_line() {
        // y = 2x + 1
        let slope = ols_slope(&[1.0, 3.0, 5.0, 7.0]);
        assert!((slope - 2.0).abs() < 1e-9);
    }
}
