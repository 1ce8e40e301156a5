//! Performance benchmarking
//!
//! Converts load and stress results into named, versioned suites of weighted,
//! thresholded metrics with trend classification against prior suites, plus
//! baseline capture/diffing and before/after optimization validation.

mod baseline;
mod scorer;
mod trend;

pub use baseline::{OptimizationAdvice, OptimizationReport};
pub use scorer::BenchmarkScorer;
pub use trend::classify_trend;

use serde::{Deserialize, Serialize};

/// Pass/warning/fail classification against a metric's threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricStatus {
    Pass,
    Warning,
    Fail,
}

/// Direction of a metric across recent suites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Stable,
    Degrading,
}

/// One thresholded, trend-annotated metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkMetric {
    pub name: String,
    pub value: f64,
    pub unit: String,
    /// The pass boundary the status was graded against.
    pub threshold: f64,
    pub status: MetricStatus,
    pub trend: Trend,
}

/// A versioned, environment-scoped collection of metrics with one weighted
/// overall score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkSuite {
    pub id: String,
    pub name: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
    pub environment: String,
    pub metrics: Vec<BenchmarkMetric>,
    /// Weighted score in 0..=100.
    pub overall_score: f64,
    pub previous_score: Option<f64>,
}

impl BenchmarkSuite {
    pub fn metric(&self, name: &str) -> Option<&BenchmarkMetric> {
        self.metrics.iter().find(|m| m.name == name)
    }
}

/// Snapshot of metric values for later diffing, keyed by version and
/// environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceBaseline {
    pub version: String,
    pub environment: String,
    pub captured_at: chrono::DateTime<chrono::Utc>,
    pub metrics: std::collections::BTreeMap<String, f64>,
}

/// Whether smaller values are better for the named metric.
pub fn lower_is_better(name: &str) -> bool {
    name.contains("response_time")
        || name.contains("error_rate")
        || name.contains("memory")
        || name.contains("cpu")
        || name.contains("recovery")
        || name.contains("queue_length")
}
