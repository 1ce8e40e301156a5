//! Markdown report rendering
//!
//! Human-readable renderings of benchmark suites and comprehensive test
//! reports. The textual format is for people, not machines; JSON export
//! of the underlying artifacts is the stable surface.

use crate::benchmark::{BenchmarkSuite, MetricStatus, Trend};
use crate::runner::ComprehensiveTestReport;
use std::fmt::Write;

/// Status icon for a metric row.
pub fn status_icon(status: MetricStatus) -> &'static str {
    match status {
        MetricStatus::Pass => "✅",
        MetricStatus::Warning => "⚠️",
        MetricStatus::Fail => "❌",
    }
}

/// Trend icon for a metric row.
pub fn trend_icon(trend: Trend) -> &'static str {
    match trend {
        Trend::Improving => "📈",
        Trend::Stable => "➡️",
        Trend::Degrading => "📉",
    }
}

/// Render one benchmark suite as a sectioned markdown table.
pub fn render_benchmark(suite: &BenchmarkSuite) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Benchmark Report: {}", suite.name);
    let _ = writeln!(out);
    let _ = writeln!(out, "- **Suite**: `{}`", suite.id);
    let _ = writeln!(out, "- **Version**: {} ({})", suite.version, suite.environment);
    let _ = writeln!(out, "- **Timestamp**: {}", suite.timestamp.to_rfc3339());
    let _ = writeln!(out, "- **Overall score**: {:.1} / 100", suite.overall_score);
    if let Some(previous) = suite.previous_score {
        let delta = suite.overall_score - previous;
        let _ = writeln!(out, "- **Previous score**: {:.1} ({:+.1})", previous, delta);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "| Metric | Value | Threshold | Status | Trend |");
    let _ = writeln!(out, "|--------|-------|-----------|--------|-------|");
    for metric in &suite.metrics {
        let _ = writeln!(
            out,
            "| {} | {:.2} {} | {:.2} | {} | {} |",
            metric.name,
            metric.value,
            metric.unit,
            metric.threshold,
            status_icon(metric.status),
            trend_icon(metric.trend),
        );
    }
    out
}

/// Render a comprehensive test report as sectioned markdown.
pub fn render_comprehensive(report: &ComprehensiveTestReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Comprehensive Test Report: {}", report.name);
    let _ = writeln!(out);
    let _ = writeln!(out, "- **Run**: `{}`", report.id);
    let _ = writeln!(
        out,
        "- **Window**: {} to {}",
        report.started_at.to_rfc3339(),
        report.finished_at.to_rfc3339()
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "## Load Tests");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "| Test | Actors | Requests | Error Rate | Avg RT (ms) | Peak Mem (MB) |"
    );
    let _ = writeln!(out, "|------|--------|----------|------------|-------------|---------------|");
    for result in &report.load_results {
        let _ = writeln!(
            out,
            "| `{}` | {} | {} | {:.2}% | {:.1} | {:.1} |",
            result.test_id,
            result.config.concurrent_actors,
            result.total_requests,
            result.error_rate() * 100.0,
            result.average_response_time_ms,
            result.peaks.peak_memory_mb,
        );
    }
    let _ = writeln!(out);

    let analysis = &report.stress_report.analysis;
    let _ = writeln!(out, "## Stress Analysis");
    let _ = writeln!(out);
    let _ = writeln!(out, "- **Breaking point**: {} actors", analysis.breaking_point_actors);
    let _ = writeln!(out, "- **Stability score**: {:.0} / 100", analysis.stability_score);
    let _ = writeln!(out, "- **Estimated recovery**: {} ms", analysis.recovery_time_ms);
    if !analysis.critical_bottlenecks.is_empty() {
        let _ = writeln!(
            out,
            "- **Bottlenecks**: {}",
            analysis.critical_bottlenecks.join(", ")
        );
    }
    if !report.stress_report.failed_scenarios.is_empty() {
        let _ = writeln!(
            out,
            "- **Failed scenarios**: {}",
            report.stress_report.failed_scenarios.join(", ")
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Benchmark");
    let _ = writeln!(out);
    let _ = writeln!(out, "Overall score: **{:.1} / 100**", report.benchmark.overall_score);
    let _ = writeln!(out);
    let _ = writeln!(out, "| Metric | Value | Threshold | Status | Trend |");
    let _ = writeln!(out, "|--------|-------|-----------|--------|-------|");
    for metric in &report.benchmark.metrics {
        let _ = writeln!(
            out,
            "| {} | {:.2} {} | {:.2} | {} | {} |",
            metric.name,
            metric.value,
            metric.unit,
            metric.threshold,
            status_icon(metric.status),
            trend_icon(metric.trend),
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Capacity Plans");
    for plan in &report.capacity_plans {
        let _ = writeln!(out);
        let _ = writeln!(out, "### {}", plan.scenario.name);
        let _ = writeln!(out);
        let _ = writeln!(out, "- **Annual cost**: ${:.2}", plan.total_annual_cost);
        let _ = writeln!(out, "- **Milestones**: {}", plan.milestones.len());
        let _ = writeln!(out);
        let _ = writeln!(out, "| Month | Peak Users | Instances | Monthly Cost | Strategy |");
        let _ = writeln!(out, "|-------|------------|-----------|--------------|----------|");
        for (month, projection) in plan.monthly_projections.iter().enumerate() {
            let _ = writeln!(
                out,
                "| {} | {} | {} | ${:.2} | {:?} |",
                month + 1,
                projection.target_users,
                projection.required_instances,
                projection.estimated_monthly_cost,
                projection.strategy,
            );
        }
    }
    let _ = writeln!(out);

    render_actions(&mut out, "Immediate Actions", &report.immediate_actions);
    render_actions(&mut out, "Short-Term Actions", &report.short_term_actions);
    render_actions(&mut out, "Long-Term Actions", &report.long_term_actions);
    out
}

fn render_actions(out: &mut String, title: &str, actions: &[String]) {
    let _ = writeln!(out, "## {}", title);
    let _ = writeln!(out);
    if actions.is_empty() {
        let _ = writeln!(out, "None.");
    } else {
        for action in actions {
            let _ = writeln!(out, "- {}", action);
        }
    }
    let _ = writeln!(out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::BenchmarkMetric;
    use chrono::Utc;

    fn sample_suite() -> BenchmarkSuite {
        BenchmarkSuite {
            id: "bench-1".to_string(),
            name: "nightly".to_string(),
            timestamp: Utc::now(),
            version: "1.2.0".to_string(),
            environment: "staging".to_string(),
            metrics: vec![
                BenchmarkMetric {
                    name: "avg_response_time_ms".to_string(),
                    value: 120.0,
                    unit: "ms".to_string(),
                    threshold: 1_000.0,
                    status: MetricStatus::Pass,
                    trend: Trend::Improving,
                },
                BenchmarkMetric {
                    name: "error_rate_percent".to_string(),
                    value: 3.0,
                    unit: "%".to_string(),
                    threshold: 1.0,
                    status: MetricStatus::Fail,
                    trend: Trend::Degrading,
                },
            ],
            overall_score: 82.5,
            previous_score: Some(80.0),
        }
    }

    #[test]
    fn test_benchmark_report_contains_rows_and_icons() {
        let rendered = render_benchmark(&sample_suite());
        assert!(rendered.contains("# Benchmark Report: nightly"));
        assert!(rendered.contains("| avg_response_time_ms | 120.00 ms | 1000.00 | ✅ | 📈 |"));
        assert!(rendered.contains("| error_rate_percent | 3.00 % | 1.00 | ❌ | 📉 |"));
        assert!(rendered.contains("Overall score**: 82.5 / 100"));
        assert!(rendered.contains("(+2.5)"));
    }

    #[test]
    fn test_icons_cover_all_variants() {
        assert_eq!(status_icon(MetricStatus::Pass), "✅");
        assert_eq!(status_icon(MetricStatus::Warning), "⚠️");
        assert_eq!(status_icon(MetricStatus::Fail), "❌");
        assert_eq!(trend_icon(Trend::Improving), "📈");
        assert_eq!(trend_icon(Trend::Stable), "➡️");
        assert_eq!(trend_icon(Trend::Degrading), "📉");
    }
}
