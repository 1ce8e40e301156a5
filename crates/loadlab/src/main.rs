//! LoadLab - load simulation and capacity planning harness
//!
//! Runs the full pipeline (load tests, stress suite, benchmark scoring,
//! capacity plans) against the simulated backend and writes markdown and
//! JSON reports.

use anyhow::{Context, Result};
use clap::Parser;
use loadlab_lib::backend::{SimulatedBackend, SimulatedBackendConfig};
use loadlab_lib::benchmark::BenchmarkScorer;
use loadlab_lib::capacity::CapacityPlanner;
use loadlab_lib::report;
use loadlab_lib::sim::SystemClock;
use loadlab_lib::{ComprehensivePlan, ComprehensiveTestRunner};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod suites;

/// LoadLab test harness
#[derive(Parser)]
#[command(name = "loadlab")]
#[command(author, version, about = "Load simulation and capacity planning harness", long_about = None)]
struct Cli {
    /// Built-in plan to run
    #[arg(long, value_enum, default_value = "quick")]
    profile: suites::Profile,

    /// Base seed for the deterministic simulation
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Directory the reports are written to
    #[arg(long, default_value = "reports")]
    output_dir: PathBuf,

    /// Run name stamped on the report
    #[arg(long, default_value = "loadlab-run")]
    name: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let cli = Cli::parse();
    let harness = config::HarnessConfig::load()?;
    info!(
        profile = ?cli.profile,
        seed = cli.seed,
        environment = %harness.environment,
        "Starting loadlab"
    );

    let backend = Arc::new(SimulatedBackend::new(SimulatedBackendConfig {
        failure_rate: harness.backend_failure_rate,
        queue_capacity: harness.backend_queue_capacity,
        seed: cli.seed,
    }));
    let runner = ComprehensiveTestRunner::new(
        backend,
        Arc::new(SystemClock::new()),
        BenchmarkScorer::new(harness.version.clone(), harness.environment.clone()),
        CapacityPlanner::default(),
    );

    let plan = ComprehensivePlan {
        name: cli.name.clone(),
        load_configs: suites::load_configs(cli.profile, cli.seed),
        stress_suite: suites::stress_suite(cli.profile, cli.seed),
        growth_scenarios: suites::growth_scenarios(),
        current_users: harness.current_users,
    };

    let test_report = runner.run(plan).await?;

    std::fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("creating output directory {}", cli.output_dir.display()))?;
    let markdown_path = cli.output_dir.join("report.md");
    let json_path = cli.output_dir.join("report.json");
    std::fs::write(&markdown_path, report::render_comprehensive(&test_report))
        .with_context(|| format!("writing {}", markdown_path.display()))?;
    std::fs::write(
        &json_path,
        serde_json::to_vec_pretty(&test_report).context("serializing report")?,
    )
    .with_context(|| format!("writing {}", json_path.display()))?;

    info!(
        run_id = %test_report.id,
        overall_score = test_report.benchmark.overall_score,
        breaking_point = test_report.stress_report.analysis.breaking_point_actors,
        markdown = %markdown_path.display(),
        json = %json_path.display(),
        "Run complete"
    );
    Ok(())
}
