//! Stress test orchestrator
//!
//! Partitions a suite's scenarios into bounded-size batches, runs each
//! batch's scenarios concurrently with all-settled semantics (one scenario's
//! failure never blocks its batch-mates), and pauses for a fixed recovery
//! window between batches.

use super::analysis;
use super::{StressReport, StressSuite, StressTotals};
use crate::backend::TaskBackend;
use crate::loadtest::LoadTestEngine;
use crate::observability::LabMetrics;
use crate::sim::Clock;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Recovery window between batches.
const RECOVERY_PAUSE: Duration = Duration::from_secs(5);

/// Executes stress suites against one backend.
pub struct StressOrchestrator {
    backend: Arc<dyn TaskBackend>,
    clock: Arc<dyn Clock>,
}

impl StressOrchestrator {
    pub fn new(backend: Arc<dyn TaskBackend>, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    /// Run every scenario of the suite and derive the stress analysis.
    pub async fn run(&self, suite: StressSuite) -> StressReport {
        let suite_id = format!("stress-{}", Utc::now().timestamp_millis());
        let started_at = Utc::now();
        let batch_size = suite.max_concurrent_tests.max(1);
        info!(
            suite_id = %suite_id,
            suite = %suite.name,
            scenarios = suite.scenarios.len(),
            batch_size,
            "Starting stress suite"
        );

        let mut results = BTreeMap::new();
        let mut failed_scenarios = Vec::new();
        let batches: Vec<_> = suite.scenarios.chunks(batch_size).collect();
        let batch_count = batches.len();

        for (batch_idx, batch) in batches.into_iter().enumerate() {
            let handles: Vec<_> = batch
                .iter()
                .cloned()
                .map(|scenario| {
                    let engine =
                        LoadTestEngine::new(Arc::clone(&self.backend), Arc::clone(&self.clock));
                    tokio::spawn(async move {
                        let result = engine.run(scenario.config.clone()).await;
                        (scenario.name, result)
                    })
                })
                .collect();

            // All-settled: collect every handle even when some panicked.
            for handle in handles {
                match handle.await {
                    Ok((name, result)) => {
                        if !result.critical_errors.is_empty() {
                            warn!(scenario = %name, "Scenario finished with critical errors");
                        }
                        results.insert(name, result);
                    }
                    Err(e) => {
                        warn!(error = %e, "Scenario task failed; continuing batch");
                        LabMetrics::handle().inc_scenario_failures();
                        failed_scenarios.push(format!("scenario task failed: {e}"));
                    }
                }
            }

            if batch_idx + 1 < batch_count {
                self.clock.sleep(RECOVERY_PAUSE).await;
            }
        }

        let result_refs: Vec<_> = results.values().collect();
        let analysis = analysis::analyze(&result_refs);
        let recommendations = analysis::recommendations(&analysis);
        let totals = StressTotals {
            total_requests: result_refs.iter().map(|r| r.total_requests).sum(),
            successful_requests: result_refs.iter().map(|r| r.successful_requests).sum(),
            failed_requests: result_refs.iter().map(|r| r.failed_requests).sum(),
        };

        info!(
            suite_id = %suite_id,
            breaking_point = analysis.breaking_point_actors,
            stability = analysis.stability_score,
            "Stress suite complete"
        );

        StressReport {
            suite_id,
            suite_name: suite.name,
            started_at,
            ended_at: Utc::now(),
            results,
            failed_scenarios,
            totals,
            analysis,
            recommendations,
        }
    }
}
