//! Stress testing
//!
//! Runs an ordered set of load-test scenarios in bounded concurrent batches
//! and derives system-wide stress characteristics: breaking point, stability
//! score, critical bottlenecks, and a recovery-time estimate.

mod analysis;
mod orchestrator;

pub use analysis::{breaking_point, stability_score, StressAnalysis};
pub use orchestrator::StressOrchestrator;

use crate::loadtest::{LoadTestConfig, LoadTestResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One named stress scenario wrapping a load-test configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressScenario {
    pub name: String,
    pub description: String,
    pub config: LoadTestConfig,
    /// Error-rate fraction beyond which this scenario is expected to fail.
    pub expected_failure_threshold: f64,
}

/// Ordered scenario list executed in bounded concurrent batches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressSuite {
    pub name: String,
    pub scenarios: Vec<StressScenario>,
    pub max_concurrent_tests: usize,
}

/// Aggregated request totals across all scenarios.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StressTotals {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
}

/// Final artifact of a stress suite run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressReport {
    pub suite_id: String,
    pub suite_name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Per-scenario results, keyed by scenario name.
    pub results: BTreeMap<String, LoadTestResult>,
    /// Scenarios that failed outright (panicked or never produced a result).
    pub failed_scenarios: Vec<String>,
    pub totals: StressTotals,
    pub analysis: StressAnalysis,
    pub recommendations: Vec<String>,
}
