//! Post-run analysis for a single load test
//!
//! Turns raw actor counters and sampled resource figures into the final
//! [`LoadTestResult`], including the derived capacity insight.

use super::{CapacityInsight, LoadTestConfig, LoadTestResult, QueueStats, ResourcePeaks};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Percentile proxies. These are modeling approximations applied to the mean;
/// no latency histogram is collected.
pub const P95_FACTOR: f64 = 1.5;
pub const P99_FACTOR: f64 = 2.0;

/// Safety margin applied to the recommended actor ceiling.
pub const SAFETY_MARGIN: f64 = 0.8;

/// One sample from the metrics timer.
#[derive(Debug, Clone, Copy)]
pub struct ResourceSample {
    pub memory_mb: f64,
    pub cpu_percent: f64,
}

/// Counters accumulated across all actors of one test.
#[derive(Debug, Default)]
pub struct Totals {
    pub requests: u64,
    pub errors: u64,
    pub response_sum_ms: f64,
    pub tasks_submitted: u64,
    pub max_queue_len: usize,
    pub queue_len_sum: f64,
    pub queue_len_samples: u64,
    pub taxonomy: BTreeMap<String, u64>,
}

impl Totals {
    /// Fold one retired actor's counters into the running totals.
    pub fn absorb(&mut self, actor: &crate::sim::ActorSimulator) {
        self.requests += actor.request_count;
        self.errors += actor.error_count;
        self.response_sum_ms += actor.response_time_sum_ms;
        self.tasks_submitted += actor.tasks_submitted;
        self.max_queue_len = self.max_queue_len.max(actor.max_queue_len);
        self.queue_len_sum += actor.average_queue_len();
        self.queue_len_samples += 1;
        for (class, count) in &actor.error_classes {
            *self.taxonomy.entry(class.clone()).or_insert(0) += count;
        }
    }
}

/// Build the final result from accumulated counters and samples.
#[allow(clippy::too_many_arguments)]
pub fn finalize(
    test_id: String,
    config: LoadTestConfig,
    totals: Totals,
    samples: &[ResourceSample],
    elapsed_ms: u64,
    critical_errors: Vec<String>,
    started_at: DateTime<Utc>,
) -> LoadTestResult {
    let average_response_time_ms = if totals.requests > 0 {
        totals.response_sum_ms / totals.requests as f64
    } else {
        0.0
    };
    let throughput_per_sec = if elapsed_ms > 0 {
        totals.requests as f64 / (elapsed_ms as f64 / 1_000.0)
    } else {
        0.0
    };

    let peaks = summarize_samples(samples);
    let error_rate = if totals.requests > 0 {
        totals.errors as f64 / totals.requests as f64
    } else {
        0.0
    };

    let capacity = capacity_insight(&config, average_response_time_ms, error_rate, &peaks);

    LoadTestResult {
        test_id,
        started_at,
        ended_at: Utc::now(),
        total_requests: totals.requests,
        successful_requests: totals.requests - totals.errors,
        failed_requests: totals.errors,
        average_response_time_ms,
        p95_response_time_ms: average_response_time_ms * P95_FACTOR,
        p99_response_time_ms: average_response_time_ms * P99_FACTOR,
        peaks,
        queue: QueueStats {
            average_queue_length: if totals.queue_len_samples > 0 {
                totals.queue_len_sum / totals.queue_len_samples as f64
            } else {
                0.0
            },
            max_queue_length: totals.max_queue_len,
            tasks_processed: totals.tasks_submitted,
            throughput_per_sec,
        },
        error_taxonomy: totals.taxonomy,
        critical_errors,
        capacity,
        config,
    }
}

fn summarize_samples(samples: &[ResourceSample]) -> ResourcePeaks {
    let peak_memory_mb = samples.iter().map(|s| s.memory_mb).fold(0.0, f64::max);
    let peak_cpu_percent = samples.iter().map(|s| s.cpu_percent).fold(0.0, f64::max);
    let average_cpu_percent = if samples.is_empty() {
        0.0
    } else {
        samples.iter().map(|s| s.cpu_percent).sum::<f64>() / samples.len() as f64
    };
    ResourcePeaks {
        peak_memory_mb,
        peak_cpu_percent,
        average_cpu_percent,
    }
}

/// Derive bottleneck flags, the recommended actor ceiling, and free-text
/// scaling recommendations from threshold breaches.
fn capacity_insight(
    config: &LoadTestConfig,
    avg_response_ms: f64,
    error_rate: f64,
    peaks: &ResourcePeaks,
) -> CapacityInsight {
    let thresholds = &config.thresholds;
    let mut bottlenecks = Vec::new();
    let mut recommendations = Vec::new();

    if avg_response_ms > thresholds.max_response_time_ms {
        bottlenecks.push("Response Time".to_string());
        recommendations.push(format!(
            "Average response time {avg_response_ms:.0}ms exceeds the {:.0}ms threshold; \
             reduce concurrent actors or optimize task dispatch",
            thresholds.max_response_time_ms
        ));
    }
    if error_rate > thresholds.max_error_rate {
        bottlenecks.push("Error Rate".to_string());
        recommendations.push(format!(
            "Error rate {:.2}% exceeds the {:.2}% threshold; investigate backend failures \
             before scaling further",
            error_rate * 100.0,
            thresholds.max_error_rate * 100.0
        ));
    }
    if peaks.peak_memory_mb > thresholds.max_memory_mb {
        bottlenecks.push("Memory Usage".to_string());
        recommendations.push(format!(
            "Peak memory {:.0}MB exceeds the {:.0}MB threshold; consider larger instances \
             or fewer actors per process",
            peaks.peak_memory_mb, thresholds.max_memory_mb
        ));
    }
    if recommendations.is_empty() {
        recommendations
            .push("All thresholds held; headroom available for more actors".to_string());
    }

    // recommended = floor(actors * min(threshold ratios) * safety margin).
    // Dimensions with no observed load contribute no constraint.
    let mut min_ratio = f64::INFINITY;
    if avg_response_ms > 0.0 {
        min_ratio = min_ratio.min(thresholds.max_response_time_ms / avg_response_ms);
    }
    if error_rate > 0.0 {
        min_ratio = min_ratio.min(thresholds.max_error_rate / error_rate);
    }
    if peaks.peak_memory_mb > 0.0 {
        min_ratio = min_ratio.min(thresholds.max_memory_mb / peaks.peak_memory_mb);
    }
    let recommended_max_actors = if min_ratio.is_finite() {
        (config.concurrent_actors as f64 * min_ratio * SAFETY_MARGIN).floor() as usize
    } else {
        config.concurrent_actors
    };

    CapacityInsight {
        recommended_max_actors,
        bottlenecks,
        recommendations,
    }
}
