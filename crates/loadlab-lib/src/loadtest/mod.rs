//! Load testing
//!
//! Configuration and result artifacts for a single load test, plus the
//! four-phase engine (ramp-up, sustain, ramp-down, analyze) that produces
//! them.

mod analysis;
mod engine;

pub use engine::LoadTestEngine;

use crate::backend::TaskTypeDistribution;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Breach thresholds for one load test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    pub max_response_time_ms: f64,
    /// Fraction, e.g. 0.02 for 2%.
    pub max_error_rate: f64,
    pub max_memory_mb: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_response_time_ms: 1_000.0,
            max_error_rate: 0.02,
            max_memory_mb: 1_024.0,
        }
    }
}

/// Immutable configuration for one load test invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadTestConfig {
    pub concurrent_actors: usize,
    pub test_duration_ms: u64,
    /// Initial synthetic tasks seeded per actor at ramp-up.
    pub tasks_per_actor: usize,
    pub task_distribution: TaskTypeDistribution,
    pub thresholds: Thresholds,
    pub ramp_up_ms: u64,
    pub ramp_down_ms: u64,
    /// Seeds the actor RNGs and the resource-noise model.
    pub seed: u64,
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self {
            concurrent_actors: 50,
            test_duration_ms: 60_000,
            tasks_per_actor: 5,
            task_distribution: TaskTypeDistribution::default(),
            thresholds: Thresholds::default(),
            ramp_up_ms: 10_000,
            ramp_down_ms: 5_000,
            seed: 0,
        }
    }
}

/// Peak simulated resource usage observed during a test.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourcePeaks {
    pub peak_memory_mb: f64,
    pub peak_cpu_percent: f64,
    pub average_cpu_percent: f64,
}

/// Aggregate queue statistics across all actors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueStats {
    pub average_queue_length: f64,
    pub max_queue_length: usize,
    pub tasks_processed: u64,
    pub throughput_per_sec: f64,
}

/// Derived capacity insight for one load test.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapacityInsight {
    pub recommended_max_actors: usize,
    pub bottlenecks: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Final artifact of one load test. Append-only once finalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadTestResult {
    pub test_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub config: LoadTestConfig,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub average_response_time_ms: f64,
    /// Modeling approximation, not a measured percentile.
    pub p95_response_time_ms: f64,
    /// Modeling approximation, not a measured percentile.
    pub p99_response_time_ms: f64,
    pub peaks: ResourcePeaks,
    pub queue: QueueStats,
    /// Error counts keyed by backend error class.
    pub error_taxonomy: BTreeMap<String, u64>,
    pub critical_errors: Vec<String>,
    pub capacity: CapacityInsight,
}

impl LoadTestResult {
    /// Observed error rate as a fraction. Zero when no requests were made.
    pub fn error_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.failed_requests as f64 / self.total_requests as f64
        }
    }
}
