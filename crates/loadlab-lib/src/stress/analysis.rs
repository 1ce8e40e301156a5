//! Stress analysis
//!
//! Derives suite-wide characteristics from the per-scenario load results:
//! breaking point, stability score, recovery estimate, and bottlenecks.
//! Each result echoes its own configuration, so thresholds are read from the
//! results themselves.

use crate::loadtest::LoadTestResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Floor of the recovery-time estimate.
const MIN_RECOVERY_MS: u64 = 5_000;

/// Suite-wide error-rate fraction that flags "Error Handling".
const SUITE_ERROR_RATE_FLAG: f64 = 0.02;

/// Suite-wide average response time (ms) that flags "Processing Speed".
const SUITE_RESPONSE_TIME_FLAG: f64 = 2_000.0;

/// Derived system-wide stress characteristics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StressAnalysis {
    /// Smallest tested concurrency at which any threshold was violated, or
    /// the highest tested concurrency when none breached.
    pub breaking_point_actors: usize,
    /// 0-100 aggregate penalizing errors, response-time overrun, and memory
    /// overrun across scenarios.
    pub stability_score: f64,
    pub critical_bottlenecks: Vec<String>,
    pub recovery_time_ms: u64,
}

/// Run every derivation over the scenario results.
pub fn analyze(results: &[&LoadTestResult]) -> StressAnalysis {
    StressAnalysis {
        breaking_point_actors: breaking_point(results),
        stability_score: stability_score(results),
        critical_bottlenecks: bottlenecks(results),
        recovery_time_ms: recovery_time_ms(results),
    }
}

/// First scenario (ascending by actor count) breaching any of its own
/// thresholds; the highest tested count when none breach.
pub fn breaking_point(results: &[&LoadTestResult]) -> usize {
    let mut ordered: Vec<&LoadTestResult> = results.to_vec();
    ordered.sort_by_key(|r| r.config.concurrent_actors);

    for result in &ordered {
        let thresholds = &result.config.thresholds;
        let breached = result.error_rate() > thresholds.max_error_rate
            || result.average_response_time_ms > thresholds.max_response_time_ms
            || result.peaks.peak_memory_mb > thresholds.max_memory_mb;
        if breached {
            return result.config.concurrent_actors;
        }
    }
    ordered
        .last()
        .map(|r| r.config.concurrent_actors)
        .unwrap_or(0)
}

/// Mean of per-scenario scores: each starts at 100 and loses up to 50 points
/// for errors, 30 for response-time overrun, and 20 for memory overrun.
pub fn stability_score(results: &[&LoadTestResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let sum: f64 = results
        .iter()
        .map(|result| {
            let thresholds = &result.config.thresholds;
            let mut score = 100.0;
            score -= (result.error_rate() * 1_000.0).min(50.0);
            if result.average_response_time_ms > thresholds.max_response_time_ms {
                let ratio = result.average_response_time_ms / thresholds.max_response_time_ms;
                score -= ((ratio - 1.0) * 30.0).min(30.0);
            }
            if result.peaks.peak_memory_mb > thresholds.max_memory_mb {
                let ratio = result.peaks.peak_memory_mb / thresholds.max_memory_mb;
                score -= ((ratio - 1.0) * 20.0).min(20.0);
            }
            score.max(0.0)
        })
        .sum();
    (sum / results.len() as f64).round()
}

/// Estimate from the scenario with the highest peak memory usage.
fn recovery_time_ms(results: &[&LoadTestResult]) -> u64 {
    let worst = results
        .iter()
        .max_by(|a, b| {
            a.peaks
                .peak_memory_mb
                .partial_cmp(&b.peaks.peak_memory_mb)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .copied();
    match worst {
        Some(result) if result.config.thresholds.max_memory_mb > 0.0 => {
            let ratio = result.peaks.peak_memory_mb / result.config.thresholds.max_memory_mb;
            MIN_RECOVERY_MS.max((ratio * 10_000.0) as u64)
        }
        _ => MIN_RECOVERY_MS,
    }
}

/// Union of per-scenario bottlenecks plus suite-wide flags when more than
/// half of the scenarios share a symptom.
fn bottlenecks(results: &[&LoadTestResult]) -> Vec<String> {
    let mut flags: BTreeSet<String> = results
        .iter()
        .flat_map(|r| r.capacity.bottlenecks.iter().cloned())
        .collect();

    let half = results.len() / 2;
    let high_errors = results
        .iter()
        .filter(|r| r.error_rate() > SUITE_ERROR_RATE_FLAG)
        .count();
    if high_errors > half {
        flags.insert("Error Handling".to_string());
    }
    let slow = results
        .iter()
        .filter(|r| r.average_response_time_ms > SUITE_RESPONSE_TIME_FLAG)
        .count();
    if slow > half {
        flags.insert("Processing Speed".to_string());
    }
    flags.into_iter().collect()
}

/// Free-text recommendations keyed off the derived analysis.
pub fn recommendations(analysis: &StressAnalysis) -> Vec<String> {
    let mut out = Vec::new();
    if analysis.stability_score < 70.0 {
        out.push(format!(
            "Stability score {:.0} is low; address the flagged bottlenecks before raising load",
            analysis.stability_score
        ));
    }
    if analysis.breaking_point_actors > 0 && analysis.breaking_point_actors < 250 {
        out.push(format!(
            "System breaks at {} concurrent actors; scale out the task backend before production load",
            analysis.breaking_point_actors
        ));
    }
    for bottleneck in &analysis.critical_bottlenecks {
        out.push(format!("Critical bottleneck: {bottleneck}"));
    }
    if out.is_empty() {
        out.push("System remained stable across all stress scenarios".to_string());
    }
    out
}
