//! Benchmark scorer
//!
//! Builds the six metric groups from load and stress results, grades each
//! against fixed thresholds, annotates trends against prior suites, and
//! computes the weighted overall score.

use super::{classify_trend, BenchmarkMetric, BenchmarkSuite, MetricStatus, PerformanceBaseline};
use crate::loadtest::LoadTestResult;
use crate::observability::LabMetrics;
use crate::stress::StressReport;
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::info;

/// Points contributed per status when computing the overall score.
const PASS_POINTS: f64 = 100.0;
const WARNING_POINTS: f64 = 70.0;
const FAIL_POINTS: f64 = 30.0;

/// Scores results into versioned, environment-scoped benchmark suites and
/// keeps history for trend classification and baseline diffing.
pub struct BenchmarkScorer {
    pub(super) version: String,
    pub(super) environment: String,
    pub(super) history: Vec<BenchmarkSuite>,
    pub(super) baselines: BTreeMap<String, PerformanceBaseline>,
}

impl BenchmarkScorer {
    pub fn new(version: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            environment: environment.into(),
            history: Vec::new(),
            baselines: BTreeMap::new(),
        }
    }

    pub fn history(&self) -> &[BenchmarkSuite] {
        &self.history
    }

    /// Build a suite from one or more load results and an optional stress
    /// report; the suite is appended to history for future trend runs.
    pub fn score(
        &mut self,
        name: impl Into<String>,
        loads: &[LoadTestResult],
        stress: Option<&StressReport>,
    ) -> BenchmarkSuite {
        let metrics = self.build_metrics(loads, stress);
        let overall_score = overall_score(&metrics);
        let suite = BenchmarkSuite {
            id: format!("bench-{}", Utc::now().timestamp_millis()),
            name: name.into(),
            timestamp: Utc::now(),
            version: self.version.clone(),
            environment: self.environment.clone(),
            metrics,
            overall_score,
            previous_score: self.history.last().map(|s| s.overall_score),
        };
        info!(
            suite = %suite.name,
            score = suite.overall_score,
            metrics = suite.metrics.len(),
            "Benchmark suite scored"
        );
        LabMetrics::handle().inc_benchmark_suites();
        self.history.push(suite.clone());
        suite
    }

    fn build_metrics(
        &self,
        loads: &[LoadTestResult],
        stress: Option<&StressReport>,
    ) -> Vec<BenchmarkMetric> {
        let mut out = Vec::new();
        if !loads.is_empty() {
            let n = loads.len() as f64;
            let avg_rt = loads.iter().map(|r| r.average_response_time_ms).sum::<f64>() / n;
            let p95 = loads.iter().map(|r| r.p95_response_time_ms).sum::<f64>() / n;
            let p99 = loads.iter().map(|r| r.p99_response_time_ms).sum::<f64>() / n;
            let rps = loads.iter().map(|r| r.queue.throughput_per_sec).sum::<f64>() / n;

            let total_requests: u64 = loads.iter().map(|r| r.total_requests).sum();
            let total_failed: u64 = loads.iter().map(|r| r.failed_requests).sum();
            let total_tasks: u64 = loads.iter().map(|r| r.queue.tasks_processed).sum();
            let error_pct = if total_requests > 0 {
                total_failed as f64 / total_requests as f64 * 100.0
            } else {
                0.0
            };
            // Task submissions as a share of all operations, scaled by the
            // observed operation throughput.
            let task_rate = if total_requests > 0 {
                rps * (total_tasks as f64 / total_requests as f64)
            } else {
                0.0
            };

            let peak_mem = loads.iter().map(|r| r.peaks.peak_memory_mb).fold(0.0, f64::max);
            let avg_cpu = loads.iter().map(|r| r.peaks.average_cpu_percent).sum::<f64>() / n;
            let peak_cpu = loads.iter().map(|r| r.peaks.peak_cpu_percent).fold(0.0, f64::max);

            let avg_queue =
                loads.iter().map(|r| r.queue.average_queue_length).sum::<f64>() / n;
            let max_queue = loads.iter().map(|r| r.queue.max_queue_length).max().unwrap_or(0);

            // Response time group.
            self.push_lower(&mut out, "avg_response_time_ms", avg_rt, "ms", 1_000.0, 1_500.0);
            self.push_lower(&mut out, "p95_response_time_ms", p95, "ms", 2_000.0, 3_000.0);
            self.push_lower(&mut out, "p99_response_time_ms", p99, "ms", 5_000.0, 7_500.0);
            // Throughput group.
            self.push_higher(&mut out, "requests_per_sec", rps, "req/s", 100.0, 50.0);
            self.push_higher(&mut out, "task_processing_rate", task_rate, "tasks/s", 50.0, 25.0);
            // Resource usage group.
            self.push_lower(&mut out, "peak_memory_mb", peak_mem, "MB", 1_000.0, 1_500.0);
            self.push_lower(&mut out, "avg_cpu_percent", avg_cpu, "%", 70.0, 85.0);
            self.push_lower(&mut out, "peak_cpu_percent", peak_cpu, "%", 90.0, 95.0);
            // Reliability group.
            self.push_lower(&mut out, "error_rate_percent", error_pct, "%", 1.0, 2.0);
            self.push_higher(
                &mut out,
                "success_rate_percent",
                100.0 - error_pct,
                "%",
                99.0,
                95.0,
            );
            // Queue group.
            self.push_lower(&mut out, "avg_queue_length", avg_queue, "tasks", 40.0, 50.0);
            self.push_lower(&mut out, "max_queue_length", max_queue as f64, "tasks", 50.0, 60.0);
            self.push_higher(&mut out, "tasks_processed", total_tasks as f64, "tasks", 1.0, 0.0);
        }

        // Scalability group, only present when a stress report was supplied.
        if let Some(report) = stress {
            self.push_higher(
                &mut out,
                "breaking_point_actors",
                report.analysis.breaking_point_actors as f64,
                "actors",
                500.0,
                250.0,
            );
            self.push_higher(
                &mut out,
                "stability_score",
                report.analysis.stability_score,
                "points",
                80.0,
                60.0,
            );
            self.push_lower(
                &mut out,
                "recovery_time_ms",
                report.analysis.recovery_time_ms as f64,
                "ms",
                30_000.0,
                60_000.0,
            );
        }
        out
    }

    fn push_lower(
        &self,
        out: &mut Vec<BenchmarkMetric>,
        name: &str,
        value: f64,
        unit: &str,
        pass: f64,
        warn: f64,
    ) {
        let status = if value <= pass {
            MetricStatus::Pass
        } else if value <= warn {
            MetricStatus::Warning
        } else {
            MetricStatus::Fail
        };
        out.push(self.annotated(name, value, unit, pass, status));
    }

    fn push_higher(
        &self,
        out: &mut Vec<BenchmarkMetric>,
        name: &str,
        value: f64,
        unit: &str,
        pass: f64,
        warn: f64,
    ) {
        let status = if value >= pass {
            MetricStatus::Pass
        } else if value >= warn {
            MetricStatus::Warning
        } else {
            MetricStatus::Fail
        };
        out.push(self.annotated(name, value, unit, pass, status));
    }

    fn annotated(
        &self,
        name: &str,
        value: f64,
        unit: &str,
        threshold: f64,
        status: MetricStatus,
    ) -> BenchmarkMetric {
        let history = self.metric_history(name);
        let trend = classify_trend(name, &history, value);
        BenchmarkMetric {
            name: name.to_string(),
            value,
            unit: unit.to_string(),
            threshold,
            status,
            trend,
        }
    }

    /// Values of one metric across stored suites, oldest first.
    fn metric_history(&self, name: &str) -> Vec<f64> {
        self.history
            .iter()
            .filter_map(|suite| suite.metric(name).map(|m| m.value))
            .collect()
    }
}

/// Weighted mean of status points: 2x for response-time and error-rate
/// metrics, 1.5x for CPU and memory metrics, 1x otherwise.
pub fn overall_score(metrics: &[BenchmarkMetric]) -> f64 {
    if metrics.is_empty() {
        return 0.0;
    }
    let mut weighted = 0.0;
    let mut weights = 0.0;
    for metric in metrics {
        let weight = metric_weight(&metric.name);
        weighted += status_points(metric.status) * weight;
        weights += weight;
    }
    weighted / weights
}

fn metric_weight(name: &str) -> f64 {
    if name.contains("response_time") || name.contains("error_rate") {
        2.0
    } else if name.contains("cpu") || name.contains("memory") {
        1.5
    } else {
        1.0
    }
}

fn status_points(status: MetricStatus) -> f64 {
    match status {
        MetricStatus::Pass => PASS_POINTS,
        MetricStatus::Warning => WARNING_POINTS,
        MetricStatus::Fail => FAIL_POINTS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::Trend;
    use crate::loadtest::{CapacityInsight, LoadTestConfig, QueueStats, ResourcePeaks};

    fn healthy_result() -> LoadTestResult {
        LoadTestResult {
            test_id: "t".to_string(),
            started_at: Utc::now(),
            ended_at: Utc::now(),
            config: LoadTestConfig::default(),
            total_requests: 12_000,
            successful_requests: 11_940,
            failed_requests: 60,
            average_response_time_ms: 250.0,
            p95_response_time_ms: 375.0,
            p99_response_time_ms: 500.0,
            peaks: ResourcePeaks {
                peak_memory_mb: 600.0,
                peak_cpu_percent: 55.0,
                average_cpu_percent: 40.0,
            },
            queue: QueueStats {
                average_queue_length: 8.0,
                max_queue_length: 20,
                tasks_processed: 6_000,
                throughput_per_sec: 200.0,
            },
            error_taxonomy: BTreeMap::new(),
            critical_errors: Vec::new(),
            capacity: CapacityInsight::default(),
        }
    }

    #[test]
    fn test_overall_score_bounds() {
        let mut scorer = BenchmarkScorer::new("1.0.0", "test");
        let suite = scorer.score("nightly", &[healthy_result()], None);
        assert!((0.0..=100.0).contains(&suite.overall_score));
        // A fully healthy result passes everything.
        assert_eq!(suite.overall_score, 100.0);
    }

    #[test]
    fn test_status_consistent_with_thresholds() {
        let mut scorer = BenchmarkScorer::new("1.0.0", "test");
        let mut result = healthy_result();
        result.average_response_time_ms = 1_200.0; // warning band
        result.failed_requests = 600;              // 5% -> fail
        result.successful_requests = 11_400;
        let suite = scorer.score("nightly", &[result], None);

        let rt = suite.metric("avg_response_time_ms").unwrap();
        assert_eq!(rt.status, MetricStatus::Warning);
        let err = suite.metric("error_rate_percent").unwrap();
        assert_eq!(err.status, MetricStatus::Fail);
        assert!(suite.overall_score < 100.0);
    }

    #[test]
    fn test_scalability_group_requires_stress_report() {
        let mut scorer = BenchmarkScorer::new("1.0.0", "test");
        let suite = scorer.score("nightly", &[healthy_result()], None);
        assert!(suite.metric("breaking_point_actors").is_none());
        assert!(suite.metric("stability_score").is_none());
    }

    #[test]
    fn test_previous_score_links_history() {
        let mut scorer = BenchmarkScorer::new("1.0.0", "test");
        let first = scorer.score("run-1", &[healthy_result()], None);
        assert!(first.previous_score.is_none());
        let second = scorer.score("run-2", &[healthy_result()], None);
        assert_eq!(second.previous_score, Some(first.overall_score));
    }

    #[test]
    fn test_trend_degrades_with_worsening_latency() {
        let mut scorer = BenchmarkScorer::new("1.0.0", "test");
        for avg in [100.0, 200.0, 300.0] {
            let mut result = healthy_result();
            result.average_response_time_ms = avg;
            scorer.score("run", &[result], None);
        }
        let mut result = healthy_result();
        result.average_response_time_ms = 400.0;
        let suite = scorer.score("run", &[result], None);
        assert_eq!(
            suite.metric("avg_response_time_ms").unwrap().trend,
            Trend::Degrading
        );
    }

    #[test]
    fn test_weights_prioritize_latency_and_errors() {
        assert_eq!(metric_weight("avg_response_time_ms"), 2.0);
        assert_eq!(metric_weight("error_rate_percent"), 2.0);
        assert_eq!(metric_weight("peak_memory_mb"), 1.5);
        assert_eq!(metric_weight("avg_cpu_percent"), 1.5);
        assert_eq!(metric_weight("requests_per_sec"), 1.0);
    }

    #[test]
    fn test_empty_inputs_give_empty_suite() {
        let mut scorer = BenchmarkScorer::new("1.0.0", "test");
        let suite = scorer.score("empty", &[], None);
        assert!(suite.metrics.is_empty());
        assert_eq!(suite.overall_score, 0.0);
    }
}
