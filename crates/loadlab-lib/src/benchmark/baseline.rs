//! Baseline capture, diffing, and optimization validation

use super::{lower_is_better, BenchmarkScorer, BenchmarkSuite, PerformanceBaseline};
use crate::error::LabError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Worsening beyond this percentage counts as a regression.
const REGRESSION_TOLERANCE_PCT: f64 = 5.0;

/// Final verdict of a before/after optimization comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationAdvice {
    Deploy,
    Investigate,
    Rollback,
}

/// Before/after comparison of two benchmark suites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub score_before: f64,
    pub score_after: f64,
    /// Percentage change per metric, positive meaning the value grew.
    pub metric_changes: BTreeMap<String, f64>,
    /// Metrics that worsened beyond tolerance.
    pub regressions: Vec<String>,
    pub recommendation: OptimizationAdvice,
}

impl BenchmarkScorer {
    /// Capture the suite's metric values as the baseline for the scorer's
    /// version/environment pair, replacing any prior snapshot.
    pub fn set_baseline(&mut self, suite: &BenchmarkSuite) {
        let key = baseline_key(&self.version, &self.environment);
        let baseline = PerformanceBaseline {
            version: self.version.clone(),
            environment: self.environment.clone(),
            captured_at: Utc::now(),
            metrics: suite
                .metrics
                .iter()
                .map(|m| (m.name.clone(), m.value))
                .collect(),
        };
        info!(key = %key, metrics = baseline.metrics.len(), "Baseline captured");
        self.baselines.insert(key, baseline);
    }

    /// Percentage change per metric against the stored baseline for the given
    /// version/environment. Errors when no such baseline was captured.
    pub fn compare_to_baseline(
        &self,
        suite: &BenchmarkSuite,
        version: &str,
        environment: &str,
    ) -> Result<BTreeMap<String, f64>, LabError> {
        let key = baseline_key(version, environment);
        let baseline = self
            .baselines
            .get(&key)
            .ok_or_else(|| LabError::BaselineNotFound {
                version: version.to_string(),
                environment: environment.to_string(),
            })?;

        let mut changes = BTreeMap::new();
        for metric in &suite.metrics {
            if let Some(base) = baseline.metrics.get(&metric.name) {
                changes.insert(metric.name.clone(), percent_change(*base, metric.value));
            }
        }
        Ok(changes)
    }

    /// Validate an optimization by diffing a before and an after suite.
    pub fn validate_optimization(
        &self,
        before: &BenchmarkSuite,
        after: &BenchmarkSuite,
    ) -> OptimizationReport {
        let mut metric_changes = BTreeMap::new();
        let mut regressions = Vec::new();

        for metric in &after.metrics {
            let Some(prior) = before.metric(&metric.name) else {
                continue;
            };
            let change = percent_change(prior.value, metric.value);
            let worsened = if lower_is_better(&metric.name) {
                change > REGRESSION_TOLERANCE_PCT
            } else {
                change < -REGRESSION_TOLERANCE_PCT
            };
            if worsened {
                regressions.push(metric.name.clone());
            }
            metric_changes.insert(metric.name.clone(), change);
        }

        let improvement = after.overall_score - before.overall_score;
        let recommendation = if !regressions.is_empty() && improvement < 5.0 {
            OptimizationAdvice::Rollback
        } else if improvement < 2.0 || regressions.len() > 2 {
            OptimizationAdvice::Investigate
        } else {
            OptimizationAdvice::Deploy
        };

        OptimizationReport {
            score_before: before.overall_score,
            score_after: after.overall_score,
            metric_changes,
            regressions,
            recommendation,
        }
    }
}

fn baseline_key(version: &str, environment: &str) -> String {
    format!("{version}@{environment}")
}

fn percent_change(before: f64, after: f64) -> f64 {
    if before.abs() < f64::EPSILON {
        0.0
    } else {
        (after - before) / before * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::{BenchmarkMetric, MetricStatus, Trend};

    fn metric(name: &str, value: f64, status: MetricStatus) -> BenchmarkMetric {
        BenchmarkMetric {
            name: name.to_string(),
            value,
            unit: "x".to_string(),
            threshold: 0.0,
            status,
            trend: Trend::Stable,
        }
    }

    fn suite(score: f64, metrics: Vec<BenchmarkMetric>) -> BenchmarkSuite {
        BenchmarkSuite {
            id: "s".to_string(),
            name: "s".to_string(),
            timestamp: Utc::now(),
            version: "1.0.0".to_string(),
            environment: "test".to_string(),
            metrics,
            overall_score: score,
            previous_score: None,
        }
    }

    #[test]
    fn test_missing_baseline_is_an_error() {
        let scorer = BenchmarkScorer::new("1.0.0", "test");
        let s = suite(90.0, vec![]);
        let err = scorer
            .compare_to_baseline(&s, "9.9.9", "nowhere")
            .unwrap_err();
        assert!(matches!(err, LabError::BaselineNotFound { .. }));
    }

    #[test]
    fn test_baseline_round_trip() {
        let mut scorer = BenchmarkScorer::new("1.0.0", "test");
        let base = suite(
            90.0,
            vec![metric("avg_response_time_ms", 200.0, MetricStatus::Pass)],
        );
        scorer.set_baseline(&base);

        let current = suite(
            92.0,
            vec![metric("avg_response_time_ms", 300.0, MetricStatus::Pass)],
        );
        let changes = scorer
            .compare_to_baseline(&current, "1.0.0", "test")
            .unwrap();
        assert!((changes["avg_response_time_ms"] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_improved_recommends_deploy() {
        let scorer = BenchmarkScorer::new("1.0.0", "test");
        // Every metric improves by well over 10% and the score rises.
        let before = suite(
            70.0,
            vec![
                metric("avg_response_time_ms", 1_200.0, MetricStatus::Warning),
                metric("error_rate_percent", 3.0, MetricStatus::Fail),
                metric("requests_per_sec", 80.0, MetricStatus::Warning),
            ],
        );
        let after = suite(
            95.0,
            vec![
                metric("avg_response_time_ms", 600.0, MetricStatus::Pass),
                metric("error_rate_percent", 0.5, MetricStatus::Pass),
                metric("requests_per_sec", 150.0, MetricStatus::Pass),
            ],
        );
        let report = scorer.validate_optimization(&before, &after);
        assert!(report.regressions.is_empty());
        assert_eq!(report.recommendation, OptimizationAdvice::Deploy);
    }

    #[test]
    fn test_regression_with_flat_score_recommends_rollback() {
        let scorer = BenchmarkScorer::new("1.0.0", "test");
        let before = suite(
            90.0,
            vec![metric("avg_response_time_ms", 200.0, MetricStatus::Pass)],
        );
        let after = suite(
            91.0,
            vec![metric("avg_response_time_ms", 400.0, MetricStatus::Pass)],
        );
        let report = scorer.validate_optimization(&before, &after);
        assert_eq!(report.regressions, vec!["avg_response_time_ms"]);
        assert_eq!(report.recommendation, OptimizationAdvice::Rollback);
    }

    #[test]
    fn test_marginal_gain_recommends_investigate() {
        let scorer = BenchmarkScorer::new("1.0.0", "test");
        let before = suite(
            90.0,
            vec![metric("requests_per_sec", 100.0, MetricStatus::Pass)],
        );
        let after = suite(
            90.5,
            vec![metric("requests_per_sec", 101.0, MetricStatus::Pass)],
        );
        let report = scorer.validate_optimization(&before, &after);
        assert!(report.regressions.is_empty());
        assert_eq!(report.recommendation, OptimizationAdvice::Investigate);
    }

    #[test]
    fn test_higher_is_better_drop_counts_as_regression() {
        let scorer = BenchmarkScorer::new("1.0.0", "test");
        let before = suite(
            90.0,
            vec![metric("requests_per_sec", 100.0, MetricStatus::Pass)],
        );
        let after = suite(
            99.0,
            vec![metric("requests_per_sec", 80.0, MetricStatus::Warning)],
        );
        let report = scorer.validate_optimization(&before, &after);
        assert_eq!(report.regressions, vec!["requests_per_sec"]);
        // A 9-point score gain with a single regression still ships.
        assert_eq!(report.recommendation, OptimizationAdvice::Deploy);
    }
}
