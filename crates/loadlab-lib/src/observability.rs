//! Observability infrastructure for the load lab
//!
//! Provides Prometheus counters for pipeline activity (load tests run,
//! actor operations, failures) so long-running harnesses can expose them.

use prometheus::{register_int_counter, IntCounter};
use std::sync::OnceLock;

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<LabMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct LabMetricsInner {
    load_tests_total: IntCounter,
    actor_operations_total: IntCounter,
    operation_errors_total: IntCounter,
    scenario_failures_total: IntCounter,
    benchmark_suites_total: IntCounter,
}

impl LabMetricsInner {
    fn new() -> Self {
        Self {
            load_tests_total: register_int_counter!(
                "loadlab_load_tests_total",
                "Total number of load tests executed"
            )
            .expect("Failed to register load_tests_total"),

            actor_operations_total: register_int_counter!(
                "loadlab_actor_operations_total",
                "Total number of simulated actor operations"
            )
            .expect("Failed to register actor_operations_total"),

            operation_errors_total: register_int_counter!(
                "loadlab_operation_errors_total",
                "Total number of failed actor operations"
            )
            .expect("Failed to register operation_errors_total"),

            scenario_failures_total: register_int_counter!(
                "loadlab_scenario_failures_total",
                "Total number of stress scenarios that failed to complete"
            )
            .expect("Failed to register scenario_failures_total"),

            benchmark_suites_total: register_int_counter!(
                "loadlab_benchmark_suites_total",
                "Total number of benchmark suites scored"
            )
            .expect("Failed to register benchmark_suites_total"),
        }
    }
}

/// Lab metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance. Multiple clones
/// share the same underlying metrics.
#[derive(Clone)]
pub struct LabMetrics {
    _private: (),
}

impl Default for LabMetrics {
    fn default() -> Self {
        Self::handle()
    }
}

impl LabMetrics {
    /// Get a metrics handle (initializes global metrics if needed)
    pub fn handle() -> Self {
        GLOBAL_METRICS.get_or_init(LabMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &LabMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn inc_load_tests(&self) {
        self.inner().load_tests_total.inc();
    }

    pub fn add_actor_operations(&self, n: u64) {
        self.inner().actor_operations_total.inc_by(n);
    }

    pub fn add_operation_errors(&self, n: u64) {
        self.inner().operation_errors_total.inc_by(n);
    }

    pub fn inc_scenario_failures(&self) {
        self.inner().scenario_failures_total.inc();
    }

    pub fn inc_benchmark_suites(&self) {
        self.inner().benchmark_suites_total.inc();
    }
}
