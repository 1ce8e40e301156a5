//! Comprehensive test runner
//!
//! Top-level sequencer: load tests, then the stress suite, then benchmark
//! scoring, then capacity planning, composed into one report with tiered
//! recommendations. Rejects re-entrant invocation while a run is active.

use crate::benchmark::{BenchmarkScorer, BenchmarkSuite};
use crate::capacity::{CapacityPlan, CapacityPlanner, GrowthScenario};
use crate::error::LabError;
use crate::loadtest::{LoadTestConfig, LoadTestEngine, LoadTestResult};
use crate::sim::Clock;
use crate::stress::{StressOrchestrator, StressReport, StressSuite};
use crate::backend::TaskBackend;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

/// Pause between sequential load tests so the simulated backend settles.
const INTER_TEST_PAUSE: Duration = Duration::from_secs(5);

const PERFORMANCE_IMMEDIATE_SCORE: f64 = 70.0;
const PERFORMANCE_SHORT_TERM_SCORE: f64 = 85.0;
const STABILITY_SHORT_TERM_SCORE: f64 = 80.0;
const BREAKING_POINT_LONG_TERM_ACTORS: usize = 500;

/// Everything one comprehensive run executes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComprehensivePlan {
    pub name: String,
    pub load_configs: Vec<LoadTestConfig>,
    pub stress_suite: StressSuite,
    pub growth_scenarios: Vec<GrowthScenario>,
    pub current_users: u64,
}

/// Composed artifact of one comprehensive run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComprehensiveTestReport {
    pub id: String,
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub load_results: Vec<LoadTestResult>,
    pub stress_report: StressReport,
    pub benchmark: BenchmarkSuite,
    pub capacity_plans: Vec<CapacityPlan>,
    pub immediate_actions: Vec<String>,
    pub short_term_actions: Vec<String>,
    pub long_term_actions: Vec<String>,
}

/// Sequences the full pipeline against one backend and clock.
pub struct ComprehensiveTestRunner {
    backend: Arc<dyn TaskBackend>,
    clock: Arc<dyn Clock>,
    scorer: Mutex<BenchmarkScorer>,
    planner: Mutex<CapacityPlanner>,
    running: AtomicBool,
}

struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ComprehensiveTestRunner {
    pub fn new(
        backend: Arc<dyn TaskBackend>,
        clock: Arc<dyn Clock>,
        scorer: BenchmarkScorer,
        planner: CapacityPlanner,
    ) -> Self {
        Self {
            backend,
            clock,
            scorer: Mutex::new(scorer),
            planner: Mutex::new(planner),
            running: AtomicBool::new(false),
        }
    }

    /// Run load, stress, benchmark, and capacity phases in order.
    ///
    /// Returns `LabError::AlreadyRunning` if another run is in flight.
    pub async fn run(&self, plan: ComprehensivePlan) -> Result<ComprehensiveTestReport, LabError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(LabError::AlreadyRunning);
        }
        let _guard = RunningGuard(&self.running);

        let started_at = Utc::now();
        let id = format!("comprehensive-{}", started_at.timestamp_millis());
        info!(
            run_id = %id,
            name = %plan.name,
            load_tests = plan.load_configs.len(),
            stress_scenarios = plan.stress_suite.scenarios.len(),
            growth_scenarios = plan.growth_scenarios.len(),
            "Starting comprehensive test run"
        );

        let engine = LoadTestEngine::new(self.backend.clone(), self.clock.clone());
        let mut load_results = Vec::with_capacity(plan.load_configs.len());
        for (index, config) in plan.load_configs.iter().enumerate() {
            if index > 0 {
                self.clock.sleep(INTER_TEST_PAUSE).await;
            }
            load_results.push(engine.run(config.clone()).await);
        }

        let orchestrator = StressOrchestrator::new(self.backend.clone(), self.clock.clone());
        let stress_report = orchestrator.run(plan.stress_suite.clone()).await;

        let benchmark = {
            let mut scorer = self.scorer.lock().await;
            scorer.score(plan.name.clone(), &load_results, Some(&stress_report))
        };

        let capacity_plans = {
            let mut planner = self.planner.lock().await;
            let scorer = self.scorer.lock().await;
            planner.calibrate(scorer.history());
            drop(scorer);
            let mut plans = Vec::with_capacity(plan.growth_scenarios.len());
            for scenario in &plan.growth_scenarios {
                plans.push(planner.plan(scenario, plan.current_users)?);
            }
            plans
        };

        let (immediate, short_term, long_term) = recommend(&benchmark, &stress_report);
        let finished_at = Utc::now();
        info!(
            run_id = %id,
            overall_score = benchmark.overall_score,
            stability_score = stress_report.analysis.stability_score,
            breaking_point = stress_report.analysis.breaking_point_actors,
            "Comprehensive test run finished"
        );

        Ok(ComprehensiveTestReport {
            id,
            name: plan.name,
            started_at,
            finished_at,
            load_results,
            stress_report,
            benchmark,
            capacity_plans,
            immediate_actions: immediate,
            short_term_actions: short_term,
            long_term_actions: long_term,
        })
    }
}

/// Tiered recommendations from fixed score thresholds.
fn recommend(
    benchmark: &BenchmarkSuite,
    stress: &StressReport,
) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut immediate = Vec::new();
    let mut short_term = Vec::new();
    let mut long_term = Vec::new();

    let performance = benchmark.overall_score;
    let stability = stress.analysis.stability_score;

    if performance < PERFORMANCE_IMMEDIATE_SCORE {
        immediate.push(format!(
            "Overall benchmark score {:.0} is below {:.0}; investigate failing metrics before the next release",
            performance, PERFORMANCE_IMMEDIATE_SCORE
        ));
        for metric in benchmark
            .metrics
            .iter()
            .filter(|m| m.status == crate::benchmark::MetricStatus::Fail)
        {
            immediate.push(format!(
                "Metric {} is failing ({:.2} {} against threshold {:.2})",
                metric.name, metric.value, metric.unit, metric.threshold
            ));
        }
    }

    if stability < STABILITY_SHORT_TERM_SCORE || performance < PERFORMANCE_SHORT_TERM_SCORE {
        short_term.push(format!(
            "Stability {:.0} / performance {:.0}; schedule optimization work for the flagged bottlenecks",
            stability, performance
        ));
        short_term.extend(stress.analysis.critical_bottlenecks.iter().map(|b| {
            format!("Optimize the {} path identified under stress", b)
        }));
    }

    if stress.analysis.breaking_point_actors < BREAKING_POINT_LONG_TERM_ACTORS {
        long_term.push(format!(
            "Breaking point at {} concurrent actors is below {}; plan architectural scaling work",
            stress.analysis.breaking_point_actors, BREAKING_POINT_LONG_TERM_ACTORS
        ));
    }

    (immediate, short_term, long_term)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{SimulatedBackend, TaskTypeDistribution};
    use crate::capacity::ScalingStrategy;
    use crate::loadtest::Thresholds;
    use crate::sim::VirtualClock;
    use crate::stress::StressScenario;

    fn quick_config(actors: usize, seed: u64) -> LoadTestConfig {
        LoadTestConfig {
            concurrent_actors: actors,
            test_duration_ms: 400,
            tasks_per_actor: 2,
            task_distribution: TaskTypeDistribution::default(),
            thresholds: Thresholds::default(),
            ramp_up_ms: 100,
            ramp_down_ms: 100,
            seed,
        }
    }

    fn quick_plan() -> ComprehensivePlan {
        ComprehensivePlan {
            name: "smoke".to_string(),
            load_configs: vec![quick_config(4, 7), quick_config(8, 8)],
            stress_suite: StressSuite {
                name: "smoke-stress".to_string(),
                scenarios: vec![
                    StressScenario {
                        name: "light".to_string(),
                        description: String::new(),
                        config: quick_config(4, 9),
                        expected_failure_threshold: 0.1,
                    },
                    StressScenario {
                        name: "heavy".to_string(),
                        description: String::new(),
                        config: quick_config(8, 10),
                        expected_failure_threshold: 0.1,
                    },
                ],
                max_concurrent_tests: 2,
            },
            growth_scenarios: vec![GrowthScenario::flat("steady", 0.05, 1.2)],
            current_users: 100,
        }
    }

    fn runner() -> ComprehensiveTestRunner {
        ComprehensiveTestRunner::new(
            Arc::new(SimulatedBackend::reliable()),
            Arc::new(VirtualClock::new()),
            BenchmarkScorer::new("1.0.0", "test"),
            CapacityPlanner::default(),
        )
    }

    #[tokio::test]
    async fn test_full_pipeline_produces_composed_report() {
        let runner = runner();
        let report = runner.run(quick_plan()).await.expect("run succeeds");

        assert_eq!(report.load_results.len(), 2);
        for result in &report.load_results {
            assert_eq!(
                result.successful_requests + result.failed_requests,
                result.total_requests
            );
        }
        assert_eq!(report.stress_report.results.len(), 2);
        assert!(report.benchmark.overall_score >= 0.0 && report.benchmark.overall_score <= 100.0);
        assert_eq!(report.capacity_plans.len(), 1);
        assert_eq!(report.capacity_plans[0].monthly_projections.len(), 12);
    }

    #[tokio::test]
    async fn test_second_sequential_run_is_allowed() {
        let runner = runner();
        runner.run(quick_plan()).await.expect("first run");
        runner.run(quick_plan()).await.expect("second run");
    }

    #[tokio::test]
    async fn test_reentrant_run_is_rejected() {
        let runner = Arc::new(runner());
        runner.running.store(true, Ordering::SeqCst);
        let err = runner.run(quick_plan()).await.unwrap_err();
        assert!(matches!(err, LabError::AlreadyRunning));
        runner.running.store(false, Ordering::SeqCst);
        runner.run(quick_plan()).await.expect("runs after release");
    }

    #[tokio::test]
    async fn test_capacity_plan_reflects_plan_users() {
        let runner = runner();
        let report = runner.run(quick_plan()).await.expect("run succeeds");
        let first_month = &report.capacity_plans[0].monthly_projections[0];
        assert_eq!(first_month.current_users, 100);
        assert_eq!(first_month.strategy, ScalingStrategy::Vertical);
    }
}
